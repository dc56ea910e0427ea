//! World-state interface consumed by the interpreter, and an in-memory
//! implementation of it.

mod memory;

pub use self::memory::{MemoryAccount, MemoryBackend, MemoryVicinity};

use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};
use voskhod_core::ExitError;

/// Basic account information.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Basic {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: U256,
}

/// A log emitted by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	/// Emitting address.
	pub address: H160,
	/// Topics.
	pub topics: Vec<H256>,
	/// Payload.
	pub data: Vec<u8>,
}

/// Opaque journal checkpoint returned by [`Backend::snapshot`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot(pub(crate) usize);

/// The interpreter's journaled view of the world state, plus the block and
/// transaction context it executes under. Writes made after a `snapshot`
/// are undone by `revert_to` and kept by `commit`.
pub trait Backend {
	/// Gas price of the enclosing transaction.
	fn gas_price(&self) -> U256;
	/// Origin of the enclosing transaction.
	fn origin(&self) -> H160;
	/// Hash of one of the 256 most recent blocks, otherwise zero.
	fn block_hash(&self, number: U256) -> H256;
	/// Environmental block number.
	fn block_number(&self) -> U256;
	/// Environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Environmental block gas limit.
	fn block_gas_limit(&self) -> U256;

	/// Whether the account exists.
	fn exists(&self, address: H160) -> bool;
	/// Whether the account was marked for deletion in this transaction.
	fn deleted(&self, address: H160) -> bool;
	/// Balance and nonce of the account.
	fn basic(&self, address: H160) -> Basic;
	/// Code of the account.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Keccak-256 hash of the account code.
	fn code_hash(&self, address: H160) -> H256;
	/// Storage value of the account at the index.
	fn storage(&self, address: H160, index: H256) -> H256;

	/// Set the storage value, returning the prior word.
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> H256;
	/// Append a log.
	fn log(&mut self, log: Log);
	/// Mark the account for deletion, sweeping its balance to the target.
	fn mark_delete(&mut self, address: H160, target: H160);
	/// Move value between accounts.
	fn transfer(&mut self, source: H160, target: H160, value: U256) -> Result<(), ExitError>;

	/// Take a journal checkpoint.
	fn snapshot(&mut self) -> Snapshot;
	/// Undo every write made since the checkpoint.
	fn revert_to(&mut self, snapshot: Snapshot);
	/// Discard the checkpoint, keeping the writes.
	fn commit(&mut self, snapshot: Snapshot);
}
