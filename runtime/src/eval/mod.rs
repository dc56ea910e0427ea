#[macro_use]
mod macros;
mod system;

use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::{H160, H256, U256};

use crate::{CallScheme, ExitError, ExitReason, Handler, Opcode, Runtime};

/// Control state after evaluating one environment-touching opcode.
pub enum Control<H: Handler> {
	/// Continue to the next cycle.
	Continue,
	/// A CALL-family child frame was deferred to the outer dispatcher.
	CallInterrupt(H::CallInterrupt, CallOutput),
	/// A CREATE child frame was deferred to the outer dispatcher.
	CreateInterrupt(H::CreateInterrupt),
	/// Exit with the given reason.
	Exit(ExitReason),
}

/// Caller memory region that receives the child frame's return data.
#[derive(Clone, Debug)]
pub struct CallOutput {
	/// Byte offset into the caller's memory.
	pub offset: U256,
	/// Capacity reserved for the return data.
	pub len: U256,
}

pub fn eval<H: Handler>(state: &mut Runtime, opcode: Opcode, handler: &mut H) -> Control<H> {
	match opcode {
		Opcode::SHA3 => system::sha3(state),
		Opcode::ADDRESS => system::address(state),
		Opcode::BALANCE => system::balance(state, handler),
		Opcode::ORIGIN => system::origin(state, handler),
		Opcode::CALLER => system::caller(state),
		Opcode::CALLVALUE => system::callvalue(state),
		Opcode::GASPRICE => system::gasprice(state, handler),
		Opcode::EXTCODESIZE => system::extcodesize(state, handler),
		Opcode::EXTCODECOPY => system::extcodecopy(state, handler),
		Opcode::RETURNDATASIZE => system::returndatasize(state),
		Opcode::RETURNDATACOPY => system::returndatacopy(state),
		Opcode::BLOCKHASH => system::blockhash(state, handler),
		Opcode::COINBASE => system::coinbase(state, handler),
		Opcode::TIMESTAMP => system::timestamp(state, handler),
		Opcode::NUMBER => system::number(state, handler),
		Opcode::DIFFICULTY => system::difficulty(state, handler),
		Opcode::GASLIMIT => system::gaslimit(state, handler),
		Opcode::SLOAD => system::sload(state, handler),
		Opcode::SSTORE => system::sstore(state, handler),
		Opcode::GAS => system::gas(state, handler),
		Opcode::LOG0 => system::log(state, 0, handler),
		Opcode::LOG1 => system::log(state, 1, handler),
		Opcode::LOG2 => system::log(state, 2, handler),
		Opcode::LOG3 => system::log(state, 3, handler),
		Opcode::LOG4 => system::log(state, 4, handler),
		Opcode::SUICIDE => system::suicide(state, handler),
		Opcode::CREATE => system::create(state, handler),
		Opcode::CALL => system::call(state, CallScheme::Call, handler),
		Opcode::CALLCODE => system::call(state, CallScheme::CallCode, handler),
		Opcode::DELEGATECALL => system::call(state, CallScheme::DelegateCall, handler),
		_ => Control::Exit(ExitError::InvalidCode(opcode).into()),
	}
}

/// Feed a finished CREATE child frame back into the creator: the created
/// address (or zero on failure) lands on the stack and the child's return
/// data becomes the caller's return buffer.
pub(crate) fn finish_create(
	runtime: &mut Runtime,
	reason: ExitReason,
	address: Option<H160>,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	runtime.return_data_buffer = return_data;
	let create_address: H256 = address.map(H256::from).unwrap_or_default();

	match reason {
		ExitReason::Succeed(_) => {
			runtime
				.machine
				.stack_mut()
				.push(U256::from_big_endian(&create_address[..]))?;
			Ok(())
		}
		ExitReason::Revert(_) => {
			runtime.machine.stack_mut().push(U256::zero())?;
			Ok(())
		}
		ExitReason::Error(_) => {
			runtime.machine.stack_mut().push(U256::zero())?;
			Ok(())
		}
		ExitReason::Fatal(e) => {
			runtime.machine.stack_mut().push(U256::zero())?;
			Err(e.into())
		}
	}
}

/// Feed a finished CALL-family child frame back into the caller: the
/// success flag lands on the stack and the return data is copied into the
/// reserved output region.
pub(crate) fn finish_call(
	runtime: &mut Runtime,
	out_len: U256,
	out_offset: U256,
	reason: ExitReason,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	runtime.return_data_buffer = return_data;
	let target_len = min(out_len, U256::from(runtime.return_data_buffer.len()));

	match reason {
		ExitReason::Succeed(_) => {
			match runtime.machine.memory_mut().copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&runtime.return_data_buffer[..],
			) {
				Ok(()) => {
					runtime.machine.stack_mut().push(U256::one())?;
					Ok(())
				}
				Err(_) => {
					runtime.machine.stack_mut().push(U256::zero())?;
					Ok(())
				}
			}
		}
		ExitReason::Revert(_) => {
			runtime.machine.stack_mut().push(U256::zero())?;

			let _ = runtime.machine.memory_mut().copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&runtime.return_data_buffer[..],
			);

			Ok(())
		}
		ExitReason::Error(_) => {
			runtime.machine.stack_mut().push(U256::zero())?;

			Ok(())
		}
		ExitReason::Fatal(e) => {
			runtime.machine.stack_mut().push(U256::zero())?;

			Err(e.into())
		}
	}
}
