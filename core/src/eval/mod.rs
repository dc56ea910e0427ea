#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;

use core::ops::{BitAnd, BitOr, BitXor};

use primitive_types::U256;

use crate::{ExitError, ExitReason, ExitSucceed, Machine, Opcode};

/// Control state after evaluating one opcode.
pub enum Control {
	/// Continue `n` bytes forward.
	Continue(usize),
	/// Exit with the given reason.
	Exit(ExitReason),
	/// Jump to the absolute position.
	Jump(usize),
	/// The opcode requires external information; trap out of the core.
	Trap(Opcode),
}

pub fn eval(state: &mut Machine, opcode: Opcode, position: usize) -> Control {
	match opcode {
		Opcode::STOP => Control::Exit(ExitSucceed::Stopped.into()),
		Opcode::ADD => op2_u256_tuple!(state, overflowing_add),
		Opcode::MUL => op2_u256_tuple!(state, overflowing_mul),
		Opcode::SUB => op2_u256_tuple!(state, overflowing_sub),
		Opcode::DIV => op2_u256_fn!(state, self::arithmetic::div),
		Opcode::SDIV => op2_u256_fn!(state, self::arithmetic::sdiv),
		Opcode::MOD => op2_u256_fn!(state, self::arithmetic::rem),
		Opcode::SMOD => op2_u256_fn!(state, self::arithmetic::srem),
		Opcode::ADDMOD => op3_u256_fn!(state, self::arithmetic::addmod),
		Opcode::MULMOD => op3_u256_fn!(state, self::arithmetic::mulmod),
		Opcode::EXP => op2_u256_fn!(state, self::arithmetic::exp),
		Opcode::SIGNEXTEND => op2_u256_fn!(state, self::arithmetic::signextend),
		Opcode::LT => op2_u256_bool_ref!(state, lt),
		Opcode::GT => op2_u256_bool_ref!(state, gt),
		Opcode::SLT => op2_u256_fn!(state, self::bitwise::slt),
		Opcode::SGT => op2_u256_fn!(state, self::bitwise::sgt),
		Opcode::EQ => op2_u256_bool_ref!(state, eq),
		Opcode::ISZERO => op1_u256_fn!(state, self::bitwise::iszero),
		Opcode::AND => op2_u256!(state, bitand),
		Opcode::OR => op2_u256!(state, bitor),
		Opcode::XOR => op2_u256!(state, bitxor),
		Opcode::NOT => op1_u256_fn!(state, self::bitwise::not),
		Opcode::BYTE => op2_u256_fn!(state, self::bitwise::byte),
		Opcode::SHL => op2_u256_fn!(state, self::bitwise::shl),
		Opcode::SHR => op2_u256_fn!(state, self::bitwise::shr),
		Opcode::SAR => op2_u256_fn!(state, self::bitwise::sar),
		Opcode::CODESIZE => self::misc::codesize(state),
		Opcode::CODECOPY => self::misc::codecopy(state),
		Opcode::CALLDATALOAD => self::misc::calldataload(state),
		Opcode::CALLDATASIZE => self::misc::calldatasize(state),
		Opcode::CALLDATACOPY => self::misc::calldatacopy(state),
		Opcode::POP => self::misc::pop(state),
		Opcode::MLOAD => self::misc::mload(state),
		Opcode::MSTORE => self::misc::mstore(state),
		Opcode::MSTORE8 => self::misc::mstore8(state),
		Opcode::JUMP => self::misc::jump(state),
		Opcode::JUMPI => self::misc::jumpi(state),
		Opcode::PC => self::misc::pc(state, position),
		Opcode::MSIZE => self::misc::msize(state),
		Opcode::JUMPDEST => Control::Continue(1),
		Opcode::RETURN => self::misc::ret(state),
		Opcode::REVERT => self::misc::revert(state),
		Opcode::INVALID => Control::Exit(ExitError::DesignatedInvalid.into()),
		_ => match opcode.0 {
			0x60..=0x7f => self::misc::push(state, (opcode.0 - 0x5f) as usize, position),
			0x80..=0x8f => self::misc::dup(state, (opcode.0 - 0x7f) as usize),
			0x90..=0x9f => self::misc::swap(state, (opcode.0 - 0x8f) as usize),
			_ => Control::Trap(opcode),
		},
	}
}
