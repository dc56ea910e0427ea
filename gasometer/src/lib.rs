//! Gas schedule of the Voskhod EVM.
//!
//! Per-cycle cost is the operation cost plus the memory component:
//! the billed active-word count is promoted to cover the prospective region
//! decoded from the stack, and the total is evaluated against the
//! pre-deduction meter before any operation body runs.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

mod consts;
mod costs;
mod memory;
mod utils;

pub use crate::consts::*;
pub use crate::memory::memory_gas;

use core::cmp::max;

use primitive_types::{H160, H256, U256};
use voskhod_core::{ExitError, Opcode, Stack};
use voskhod_runtime::Handler;

/// EVM gasometer state. Measures the remaining gas of a frame and carries
/// the transaction-scoped refund counter. Once a deduction fails the meter
/// stays collapsed: remaining gas is zero and every further record fails.
#[derive(Clone, Debug)]
pub struct Gasometer {
	gas_limit: u64,
	inner: Result<Inner, ExitError>,
}

#[derive(Clone, Debug)]
struct Inner {
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
}

impl Gasometer {
	/// Create a new gasometer with the given gas limit.
	pub fn new(gas_limit: u64) -> Self {
		Self {
			gas_limit,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
				refunded_gas: 0,
			}),
		}
	}

	#[inline]
	fn inner_mut(&mut self) -> Result<&mut Inner, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	/// Gas limit of the frame.
	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	/// Remaining gas.
	pub fn gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => self.gas_limit - inner.used_gas - inner.memory_gas,
			Err(_) => 0,
		}
	}

	/// Total used gas, including the memory component.
	pub fn total_used_gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => inner.used_gas + inner.memory_gas,
			Err(_) => self.gas_limit,
		}
	}

	/// Refunded gas accrued so far. Settled by the outer dispatcher at the
	/// end of the transaction.
	pub fn refunded_gas(&self) -> i64 {
		match self.inner.as_ref() {
			Ok(inner) => inner.refunded_gas,
			Err(_) => 0,
		}
	}

	/// Explicitly fail the gasometer, consuming all remaining gas.
	pub fn fail(&mut self) -> ExitError {
		self.inner = Err(ExitError::OutOfGas);
		ExitError::OutOfGas
	}

	fn fail_with(&mut self, e: ExitError) -> ExitError {
		self.inner = Err(e.clone());
		e
	}

	/// Record an amount of gas with a fixed cost.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		let all_gas_cost = match self.total_used_gas().checked_add(cost) {
			Some(v) => v,
			None => return Err(self.fail()),
		};
		if self.gas_limit < all_gas_cost {
			return Err(self.fail());
		}

		self.inner_mut()?.used_gas += cost;
		Ok(())
	}

	/// Record an explicit refund.
	pub fn record_refund(&mut self, refund: i64) -> Result<(), ExitError> {
		self.inner_mut()?.refunded_gas += refund;
		Ok(())
	}

	/// Record the cost of one cycle from its classification and the
	/// prospective memory region it touches. The billed active words only
	/// ever grow; insufficient gas collapses the meter without mutating
	/// anything else.
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory: Option<MemoryCost>,
	) -> Result<(), ExitError> {
		let (current_memory_gas, used_gas) = match self.inner.as_ref() {
			Ok(inner) => (inner.memory_gas, inner.used_gas),
			Err(e) => return Err(e.clone()),
		};

		let memory_gas = match memory {
			Some(memory) => match memory.gas() {
				Ok(gas) => max(current_memory_gas, gas),
				Err(e) => return Err(self.fail_with(e)),
			},
			None => current_memory_gas,
		};

		let gas_cost = match cost.cost() {
			Ok(gas) => gas,
			Err(e) => return Err(self.fail_with(e)),
		};

		let all_gas_cost = memory_gas
			.checked_add(used_gas)
			.and_then(|v| v.checked_add(gas_cost));
		let all_gas_cost = match all_gas_cost {
			Some(v) => v,
			None => return Err(self.fail()),
		};

		if self.gas_limit < all_gas_cost {
			return Err(self.fail());
		}

		let refund = cost.refund();
		let inner = self.inner_mut()?;
		inner.used_gas += gas_cost;
		inner.memory_gas = memory_gas;
		inner.refunded_gas += refund;

		Ok(())
	}
}

/// Classified cost of one cycle, before the memory component.
#[derive(Clone, Copy, Debug)]
pub enum GasCost {
	/// Zero tier.
	Zero,
	/// Base tier.
	Base,
	/// VeryLow tier.
	VeryLow,
	/// Low tier.
	Low,
	/// Mid tier.
	Mid,
	/// High tier.
	High,

	/// `EXTCODESIZE` flat cost.
	ExtCodeSize,
	/// `BALANCE` flat cost.
	Balance,
	/// `BLOCKHASH` flat cost.
	BlockHash,
	/// `SLOAD` flat cost.
	SLoad,
	/// `JUMPDEST` flat cost.
	JumpDest,

	/// `EXP`, billed per byte of the exponent.
	Exp {
		/// The exponent argument.
		power: U256,
	},
	/// `SHA3`, billed per hashed word.
	Sha3 {
		/// Length of the hashed region.
		len: U256,
	},
	/// `CALLDATACOPY`, `CODECOPY` and `RETURNDATACOPY`, billed per copied
	/// word.
	VeryLowCopy {
		/// Length of the copy.
		len: U256,
	},
	/// `EXTCODECOPY`, billed per copied word on top of the account access.
	ExtCodeCopy {
		/// Length of the copy.
		len: U256,
	},
	/// `LOGn`, billed per topic and data byte.
	Log {
		/// Topic count.
		n: u8,
		/// Length of the payload.
		len: U256,
	},
	/// `SSTORE`, billed by the transition of the slot.
	SStore {
		/// Current value of the slot.
		current: H256,
		/// Value being written.
		new: H256,
	},
	/// `CREATE` flat cost.
	Create,
	/// `CALL`, with the value-transfer and new-account surcharges.
	Call {
		/// Transferred value.
		value: U256,
		/// Whether the target account exists.
		target_exists: bool,
	},
	/// `CALLCODE`; transfers value but never creates the target.
	CallCode {
		/// Transferred value.
		value: U256,
	},
	/// `DELEGATECALL` flat cost.
	DelegateCall,
	/// `SUICIDE`, with the new-account surcharge for the beneficiary.
	Suicide {
		/// Whether the beneficiary account exists.
		target_exists: bool,
		/// Whether the account was already marked for deletion.
		already_removed: bool,
	},
}

impl GasCost {
	/// Operation cost in gas, excluding the memory component.
	pub fn cost(&self) -> Result<u64, ExitError> {
		Ok(match *self {
			GasCost::Zero => G_ZERO,
			GasCost::Base => G_BASE,
			GasCost::VeryLow => G_VERYLOW,
			GasCost::Low => G_LOW,
			GasCost::Mid => G_MID,
			GasCost::High => G_HIGH,
			GasCost::ExtCodeSize => G_EXTCODE,
			GasCost::Balance => G_BALANCE,
			GasCost::BlockHash => G_BLOCKHASH,
			GasCost::SLoad => G_SLOAD,
			GasCost::JumpDest => G_JUMPDEST,
			GasCost::Exp { power } => costs::exp_cost(power)?,
			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			GasCost::ExtCodeCopy { len } => costs::extcodecopy_cost(len)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::SStore { current, new } => costs::sstore_cost(current, new),
			GasCost::Create => G_CREATE,
			GasCost::Call {
				value,
				target_exists,
			} => costs::call_cost(value, true, target_exists),
			GasCost::CallCode { value } => costs::call_cost(value, false, true),
			GasCost::DelegateCall => G_CALL,
			GasCost::Suicide { target_exists, .. } => costs::suicide_cost(target_exists),
		})
	}

	/// Refund credited by the operation.
	pub fn refund(&self) -> i64 {
		match *self {
			GasCost::SStore { current, new } => costs::sstore_refund(current, new),
			GasCost::Suicide {
				already_removed, ..
			} => costs::suicide_refund(already_removed),
			_ => 0,
		}
	}
}

/// Prospective memory region of one cycle, decoded from the stack before
/// the operation body runs.
#[derive(Clone, Copy, Debug)]
pub struct MemoryCost {
	/// Byte offset of the region.
	pub offset: U256,
	/// Byte length of the region.
	pub len: U256,
}

impl MemoryCost {
	/// Merge two regions, keeping the one reaching further.
	pub fn join(self, other: MemoryCost) -> MemoryCost {
		if self.len == U256::zero() {
			return other;
		}
		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}

	/// Billed cost of the word-aligned high-water mark implied by this
	/// region. A zero-length region touches nothing.
	pub fn gas(&self) -> Result<u64, ExitError> {
		if self.len == U256::zero() {
			return Ok(0);
		}

		let end = self
			.offset
			.checked_add(self.len)
			.ok_or(ExitError::OutOfGas)?;

		if end > U256::from(usize::MAX) {
			return Err(ExitError::OutOfGas);
		}

		let end = end.as_u64();
		let words = if end % 32 == 0 { end / 32 } else { end / 32 + 1 };

		memory::memory_gas(words)
	}
}

/// Cost of an opcode whose charge does not depend on machine or world
/// state. Returns `None` for opcodes that need [`dynamic_opcode_cost`].
pub fn static_opcode_cost(opcode: Opcode) -> Option<u64> {
	match opcode {
		Opcode::STOP => Some(G_ZERO),
		// The designated invalid opcode charges nothing; its evaluation
		// consumes the rest of the frame's gas by halting exceptionally.
		Opcode::INVALID => Some(G_ZERO),
		Opcode::ADD
		| Opcode::SUB
		| Opcode::NOT
		| Opcode::LT
		| Opcode::GT
		| Opcode::SLT
		| Opcode::SGT
		| Opcode::EQ
		| Opcode::ISZERO
		| Opcode::AND
		| Opcode::OR
		| Opcode::XOR
		| Opcode::BYTE
		| Opcode::SHL
		| Opcode::SHR
		| Opcode::SAR
		| Opcode::CALLDATALOAD => Some(G_VERYLOW),
		Opcode::MUL
		| Opcode::DIV
		| Opcode::SDIV
		| Opcode::MOD
		| Opcode::SMOD
		| Opcode::SIGNEXTEND => Some(G_LOW),
		Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => Some(G_MID),
		Opcode::JUMPI => Some(G_HIGH),
		Opcode::ADDRESS
		| Opcode::ORIGIN
		| Opcode::CALLER
		| Opcode::CALLVALUE
		| Opcode::CALLDATASIZE
		| Opcode::CODESIZE
		| Opcode::GASPRICE
		| Opcode::RETURNDATASIZE
		| Opcode::COINBASE
		| Opcode::TIMESTAMP
		| Opcode::NUMBER
		| Opcode::DIFFICULTY
		| Opcode::GASLIMIT
		| Opcode::POP
		| Opcode::PC
		| Opcode::MSIZE
		| Opcode::GAS => Some(G_BASE),
		Opcode::JUMPDEST => Some(G_JUMPDEST),
		_ => match opcode.0 {
			// PUSH*, DUP*, SWAP*
			0x60..=0x9f => Some(G_VERYLOW),
			_ => None,
		},
	}
}

/// Classify the cost of one cycle from the decoded stack arguments and the
/// handler's view of the world state, together with the prospective memory
/// region the cycle touches. `address` is the executing account, consulted
/// for the SSTORE transition and the SUICIDE refund.
pub fn dynamic_opcode_cost<H: Handler>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	handler: &H,
) -> Result<(GasCost, Option<MemoryCost>), ExitError> {
	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,
		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,
		Opcode::SHA3 => GasCost::Sha3 { len: stack.peek(1)? },
		Opcode::BALANCE => GasCost::Balance,
		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy { len: stack.peek(3)? },
		Opcode::BLOCKHASH => GasCost::BlockHash,
		Opcode::SLOAD => GasCost::SLoad,
		Opcode::EXP => GasCost::Exp { power: stack.peek(1)? },
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
			GasCost::VeryLowCopy { len: stack.peek(2)? }
		}
		Opcode::SSTORE => {
			let index = stack.peek_h256(0)?;
			let new = stack.peek_h256(1)?;

			GasCost::SStore {
				current: handler.storage(address, index),
				new,
			}
		}
		Opcode::LOG0 => GasCost::Log { n: 0, len: stack.peek(1)? },
		Opcode::LOG1 => GasCost::Log { n: 1, len: stack.peek(1)? },
		Opcode::LOG2 => GasCost::Log { n: 2, len: stack.peek(1)? },
		Opcode::LOG3 => GasCost::Log { n: 3, len: stack.peek(1)? },
		Opcode::LOG4 => GasCost::Log { n: 4, len: stack.peek(1)? },
		Opcode::CREATE => GasCost::Create,
		Opcode::CALL => GasCost::Call {
			value: stack.peek(2)?,
			target_exists: handler.exists(stack.peek_h256(1)?.into()),
		},
		Opcode::CALLCODE => GasCost::CallCode {
			value: stack.peek(2)?,
		},
		Opcode::DELEGATECALL => GasCost::DelegateCall,
		Opcode::SUICIDE => GasCost::Suicide {
			target_exists: handler.exists(stack.peek_h256(0)?.into()),
			already_removed: handler.deleted(address),
		},
		_ => return Err(ExitError::InvalidCode(opcode)),
	};

	let memory_cost = match opcode {
		Opcode::SHA3
		| Opcode::RETURN
		| Opcode::REVERT
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CODECOPY | Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::one(),
		}),

		Opcode::CREATE => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}
