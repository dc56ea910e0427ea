//! VoskhodVM - a portable Ethereum Virtual Machine interpreter.
//!
//! The root crate drives one execution frame at a time: each cycle is
//! validated against the static operation table, charged through the
//! gasometer, and only then executed, so a failed deduction never mutates
//! machine state. Terminal outcomes commit or roll back the backend
//! journal; nested calls and creates surface as typed interrupts for an
//! outer dispatcher.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod backend;
mod executor;

pub use voskhod_core::*;
pub use voskhod_gasometer as gasometer;
pub use voskhod_runtime::*;

pub use crate::executor::{CallInterrupt, CreateInterrupt, Executor, MEMORY_LIMIT, STACK_LIMIT};
