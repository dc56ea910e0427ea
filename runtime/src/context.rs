use primitive_types::{H160, U256};

/// How a new contract address is derived for CREATE.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// Legacy derivation from the creator address and nonce.
	Legacy {
		/// Address of the creator.
		caller: H160,
	},
	/// The address is known in advance.
	Fixed(H160),
}

/// Call scheme of a CALL-family opcode.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	/// `CALL`
	Call,
	/// `CALLCODE`
	CallCode,
	/// `DELEGATECALL`
	DelegateCall,
}

/// Context of the runtime: the part of the execution environment that
/// changes between frames of one call chain.
#[derive(Clone, Debug)]
pub struct Context {
	/// Execution address.
	pub address: H160,
	/// Caller of the EVM.
	pub caller: H160,
	/// Apparent value of the EVM.
	pub apparent_value: U256,
}
