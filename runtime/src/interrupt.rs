use alloc::vec::Vec;

use primitive_types::H160;

use crate::eval::{self, CallOutput};
use crate::{ExitFatal, ExitReason, Handler, Runtime};

/// Interrupt resolution, surfaced when a frame needs its outer dispatcher
/// to run a child frame. Dropping a resolution unresolved poisons the frame
/// with an unhandled-interrupt fatal.
pub enum Resolve<'a, H: Handler> {
	/// Create interrupt resolution.
	Create(H::CreateInterrupt, ResolveCreate<'a>),
	/// Call interrupt resolution.
	Call(H::CallInterrupt, ResolveCall<'a>),
}

/// Create interrupt resolution.
pub struct ResolveCreate<'a> {
	runtime: Option<&'a mut Runtime>,
}

impl<'a> ResolveCreate<'a> {
	pub(crate) fn new(runtime: &'a mut Runtime) -> Self {
		Self {
			runtime: Some(runtime),
		}
	}

	/// Feed the child frame's terminal outcome back into the creator.
	pub fn finish(
		mut self,
		reason: ExitReason,
		address: Option<H160>,
		return_data: Vec<u8>,
	) -> Result<(), ExitReason> {
		match self.runtime.take() {
			Some(runtime) => eval::finish_create(runtime, reason, address, return_data),
			None => Err(ExitFatal::UnhandledInterrupt.into()),
		}
	}
}

impl<'a> Drop for ResolveCreate<'a> {
	fn drop(&mut self) {
		if let Some(runtime) = self.runtime.take() {
			runtime.status = Err(ExitFatal::UnhandledInterrupt.into());
			runtime.machine.exit();
		}
	}
}

/// Call interrupt resolution.
pub struct ResolveCall<'a> {
	runtime: Option<&'a mut Runtime>,
	output: CallOutput,
}

impl<'a> ResolveCall<'a> {
	pub(crate) fn new(runtime: &'a mut Runtime, output: CallOutput) -> Self {
		Self {
			runtime: Some(runtime),
			output,
		}
	}

	/// Feed the child frame's terminal outcome back into the caller.
	pub fn finish(mut self, reason: ExitReason, return_data: Vec<u8>) -> Result<(), ExitReason> {
		let output = self.output.clone();
		match self.runtime.take() {
			Some(runtime) => {
				eval::finish_call(runtime, output.len, output.offset, reason, return_data)
			}
			None => Err(ExitFatal::UnhandledInterrupt.into()),
		}
	}
}

impl<'a> Drop for ResolveCall<'a> {
	fn drop(&mut self) {
		if let Some(runtime) = self.runtime.take() {
			runtime.status = Err(ExitFatal::UnhandledInterrupt.into());
			runtime.machine.exit();
		}
	}
}
