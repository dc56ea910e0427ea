//! Core execution layer of the Voskhod EVM: machine state, the opcode
//! namespace and operation table, and the unmetered step loop for
//! self-contained opcodes. Anything that touches the execution environment
//! traps out of here.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod error;
mod eval;
mod memory;
mod opcode;
mod stack;
mod table;
mod utils;
mod valids;

pub use crate::error::{Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Trap};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::Stack;
pub use crate::table::{Advance, OpcodeInfo};
pub use crate::valids::Valids;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;

use primitive_types::U256;

use crate::eval::{eval, Control};

/// Core execution layer for the EVM.
pub struct Machine {
	/// Program data.
	pub(crate) data: Rc<Vec<u8>>,
	/// Program code.
	pub(crate) code: Rc<Vec<u8>>,
	/// Program counter.
	pub(crate) position: usize,
	/// Return value range.
	pub(crate) return_range: Range<U256>,
	/// Code validity map.
	pub(crate) valids: Valids,
	/// Memory.
	pub(crate) memory: Memory,
	/// Stack.
	pub(crate) stack: Stack,
}

impl Machine {
	/// Create a new machine with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: 0,
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Machine code.
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Machine call data.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Program counter.
	pub fn position(&self) -> usize {
		self.position
	}

	/// Reference of machine stack.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}

	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}

	/// Reference of machine memory.
	pub fn memory(&self) -> &Memory {
		&self.memory
	}

	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}

	/// Inspect the machine's next opcode and current stack.
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		self.code
			.get(self.position)
			.map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any. Undefined
	/// memory is zero-extended.
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.start > U256::from(usize::MAX) {
			let mut ret = Vec::new();
			ret.resize(
				(self.return_range.end - self.return_range.start).as_usize(),
				0,
			);
			ret
		} else if self.return_range.end > U256::from(usize::MAX) {
			let mut ret = self.memory.get(
				self.return_range.start.as_usize(),
				usize::MAX - self.return_range.start.as_usize(),
			);
			while ret.len() < (self.return_range.end - self.return_range.start).as_usize() {
				ret.push(0);
			}
			ret
		} else {
			self.memory.get(
				self.return_range.start.as_usize(),
				(self.return_range.end - self.return_range.start).as_usize(),
			)
		}
	}

	/// Explicit exit of the machine. Further steps will return the stopped
	/// reason.
	pub fn exit(&mut self) {
		self.position = self.code.len();
	}

	/// Loop stepping the machine, until it stops or traps.
	pub fn run(&mut self) -> Capture<ExitReason, Trap> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	/// Step the machine, executing one opcode. Running off the end of code
	/// is an implicit stop.
	#[inline]
	pub fn step(&mut self) -> Result<(), Capture<ExitReason, Trap>> {
		let position = self.position;
		if position >= self.code.len() {
			return Err(Capture::Exit(ExitSucceed::Stopped.into()));
		}

		let opcode = Opcode(self.code[position]);
		match eval(self, opcode, position) {
			Control::Continue(p) => {
				self.position = position + p;
				Ok(())
			}
			Control::Exit(e) => {
				self.position = self.code.len();
				Err(Capture::Exit(e))
			}
			Control::Jump(p) => {
				self.position = p;
				Ok(())
			}
			Control::Trap(opcode) => {
				self.position = position + 1;
				Err(Capture::Trap(opcode))
			}
		}
	}
}
