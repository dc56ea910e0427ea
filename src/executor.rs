use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};
use voskhod_core::{Capture, ExitError, ExitReason, Opcode, OpcodeInfo, Stack};
use voskhod_gasometer::{self as gasometer, Gasometer};
use voskhod_runtime::{Context, CreateScheme, Handler, Runtime, Transfer};

use crate::backend::{Backend, Log};

/// Stack limit of a frame.
pub const STACK_LIMIT: usize = 1024;
/// Memory limit of a frame.
pub const MEMORY_LIMIT: usize = usize::MAX;

/// Decoded arguments of a pending CALL-family opcode, surfaced to the outer
/// dispatcher together with its resolution handle.
#[derive(Clone, Debug)]
pub struct CallInterrupt {
	/// Address holding the code to run.
	pub code_address: H160,
	/// Value transfer requested by the caller, if any.
	pub transfer: Option<Transfer>,
	/// Call data, copied out of the caller's memory.
	pub input: Vec<u8>,
	/// Gas the caller offered to the child.
	pub target_gas: Option<u64>,
	/// Context the child runs under.
	pub context: Context,
}

/// Decoded arguments of a pending CREATE, surfaced to the outer dispatcher
/// together with its resolution handle.
#[derive(Clone, Debug)]
pub struct CreateInterrupt {
	/// Creating address.
	pub caller: H160,
	/// Address derivation scheme.
	pub scheme: CreateScheme,
	/// Endowment.
	pub value: U256,
	/// Initialization code, copied out of the creator's memory.
	pub init_code: Vec<u8>,
}

/// Metered single-frame interpreter.
///
/// Drives the per-cycle sequence: look the opcode up in the operation
/// table, validate stack arity, classify and deduct its cost (including
/// the prospective memory expansion), and only then let the operation
/// body run. World state is delegated to the [`Backend`]; CALL and CREATE
/// surface as typed interrupts for the outer dispatcher.
pub struct Executor<'backend, B> {
	backend: &'backend mut B,
	gasometer: Gasometer,
	depth: usize,
}

impl<'backend, B: Backend> Executor<'backend, B> {
	/// Create a new executor for one frame with the given gas limit and
	/// call depth.
	pub fn new(backend: &'backend mut B, gas_limit: u64, depth: usize) -> Self {
		Self {
			backend,
			gasometer: Gasometer::new(gas_limit),
			depth,
		}
	}

	/// Remaining gas of the frame.
	pub fn gas(&self) -> u64 {
		self.gasometer.gas()
	}

	/// Gas used by the frame, including the memory component.
	pub fn used_gas(&self) -> u64 {
		self.gasometer.total_used_gas()
	}

	/// Refund accrued by the frame, settled by the outer dispatcher.
	pub fn refunded_gas(&self) -> i64 {
		self.gasometer.refunded_gas()
	}

	/// Call depth of the frame.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Reference to the backend.
	pub fn backend(&self) -> &B {
		&*self.backend
	}

	/// Run the frame to a terminal outcome. Writes are committed on
	/// success, rolled back on revert, and rolled back with all remaining
	/// gas consumed on exceptional and fatal halts. An interrupt left
	/// unresolved (no dispatcher drives this frame) poisons it fatally.
	pub fn execute(&mut self, runtime: &mut Runtime) -> ExitReason {
		let snapshot = self.backend.snapshot();

		let reason = loop {
			match runtime.step(self) {
				Ok(()) => (),
				Err(Capture::Exit(reason)) => break reason,
				Err(Capture::Trap(_resolve)) => {
					// Dropping the unresolved interrupt poisons the frame;
					// the next step surfaces the fatal reason.
				}
			}
		};

		match &reason {
			ExitReason::Succeed(_) => {
				self.backend.commit(snapshot);
			}
			ExitReason::Revert(_) => {
				self.backend.revert_to(snapshot);
			}
			ExitReason::Error(_) | ExitReason::Fatal(_) => {
				self.backend.revert_to(snapshot);
				self.gasometer.fail();
			}
		}

		reason
	}
}

impl<'backend, B: Backend> Handler for Executor<'backend, B> {
	type CreateInterrupt = CreateInterrupt;
	type CallInterrupt = CallInterrupt;

	fn balance(&self, address: H160) -> U256 {
		self.backend.basic(address).balance
	}

	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.backend.code(address).len())
	}

	fn code_hash(&self, address: H160) -> H256 {
		self.backend.code_hash(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.backend.code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.backend.storage(address, index)
	}

	fn gas_left(&self) -> U256 {
		U256::from(self.gasometer.gas())
	}

	fn gas_price(&self) -> U256 {
		self.backend.gas_price()
	}

	fn origin(&self) -> H160 {
		self.backend.origin()
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.backend.block_hash(number)
	}

	fn block_number(&self) -> U256 {
		self.backend.block_number()
	}

	fn block_coinbase(&self) -> H160 {
		self.backend.block_coinbase()
	}

	fn block_timestamp(&self) -> U256 {
		self.backend.block_timestamp()
	}

	fn block_difficulty(&self) -> U256 {
		self.backend.block_difficulty()
	}

	fn block_gas_limit(&self) -> U256 {
		self.backend.block_gas_limit()
	}

	fn exists(&self, address: H160) -> bool {
		self.backend.exists(address)
	}

	fn deleted(&self, address: H160) -> bool {
		self.backend.deleted(address)
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.backend.set_storage(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		self.backend.log(Log {
			address,
			topics,
			data,
		});
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		self.backend.mark_delete(address, target);
		Ok(())
	}

	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		_target_gas: Option<u64>,
	) -> Capture<(ExitReason, Option<H160>, Vec<u8>), CreateInterrupt> {
		Capture::Trap(CreateInterrupt {
			caller,
			scheme,
			value,
			init_code,
		})
	}

	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		context: Context,
	) -> Capture<(ExitReason, Vec<u8>), CallInterrupt> {
		Capture::Trap(CallInterrupt {
			code_address,
			transfer,
			input,
			target_gas,
			context,
		})
	}

	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError> {
		let info = OpcodeInfo::of(opcode).ok_or(ExitError::InvalidCode(opcode))?;

		log::trace!(
			target: "voskhod",
			"cycle: {} stack_depth={} gas={}",
			info.mnemonic,
			stack.depth(),
			self.gasometer.gas(),
		);

		stack.check(info.inputs as usize, info.outputs as usize)?;

		if let Some(cost) = gasometer::static_opcode_cost(opcode) {
			self.gasometer.record_cost(cost)?;
		} else {
			let (gas_cost, memory_cost) =
				gasometer::dynamic_opcode_cost(context.address, opcode, stack, self)?;
			self.gasometer.record_dynamic_cost(gas_cost, memory_cost)?;
		}

		Ok(())
	}
}
