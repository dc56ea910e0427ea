use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};
use voskhod_core::ExitError;

use super::{Backend, Basic, Log, Snapshot};

/// Vicinity value of a memory backend: the block and transaction context
/// executed under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryVicinity {
	/// Gas price.
	pub gas_price: U256,
	/// Origin.
	pub origin: H160,
	/// Environmental block hashes, most recent first.
	pub block_hashes: Vec<H256>,
	/// Environmental block number.
	pub block_number: U256,
	/// Environmental coinbase.
	pub block_coinbase: H160,
	/// Environmental block timestamp.
	pub block_timestamp: U256,
	/// Environmental block difficulty.
	pub block_difficulty: U256,
	/// Environmental block gas limit.
	pub block_gas_limit: U256,
}

/// Account information of a memory backend.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: U256,
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

/// Memory backend, storing all state values in a `BTreeMap` in memory.
/// Journaling is clone-based: a checkpoint saves the whole overlay, which
/// is plenty for an in-memory state.
#[derive(Clone, Debug)]
pub struct MemoryBackend<'vicinity> {
	vicinity: &'vicinity MemoryVicinity,
	state: BTreeMap<H160, MemoryAccount>,
	deleted: BTreeSet<H160>,
	logs: Vec<Log>,
	checkpoints: Vec<Checkpoint>,
}

#[derive(Clone, Debug)]
struct Checkpoint {
	state: BTreeMap<H160, MemoryAccount>,
	deleted: BTreeSet<H160>,
	log_len: usize,
}

impl<'vicinity> MemoryBackend<'vicinity> {
	/// Create a new memory backend.
	pub fn new(vicinity: &'vicinity MemoryVicinity, state: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			vicinity,
			state,
			deleted: BTreeSet::new(),
			logs: Vec::new(),
			checkpoints: Vec::new(),
		}
	}

	/// Get the underlying `BTreeMap` storing the state.
	pub fn state(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.state
	}

	/// Logs emitted so far.
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}
}

impl<'vicinity> Backend for MemoryBackend<'vicinity> {
	fn gas_price(&self) -> U256 {
		self.vicinity.gas_price
	}

	fn origin(&self) -> H160 {
		self.vicinity.origin
	}

	fn block_hash(&self, number: U256) -> H256 {
		if number >= self.vicinity.block_number
			|| self.vicinity.block_number - number - U256::one()
				>= U256::from(self.vicinity.block_hashes.len())
		{
			H256::default()
		} else {
			let index = (self.vicinity.block_number - number - U256::one()).as_usize();
			self.vicinity.block_hashes[index]
		}
	}

	fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}

	fn block_coinbase(&self) -> H160 {
		self.vicinity.block_coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.vicinity.block_timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.vicinity.block_difficulty
	}

	fn block_gas_limit(&self) -> U256 {
		self.vicinity.block_gas_limit
	}

	fn exists(&self, address: H160) -> bool {
		self.state.contains_key(&address)
	}

	fn deleted(&self, address: H160) -> bool {
		self.deleted.contains(&address)
	}

	fn basic(&self, address: H160) -> Basic {
		self.state
			.get(&address)
			.map(|a| Basic {
				balance: a.balance,
				nonce: a.nonce,
			})
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state
			.get(&address)
			.map(|v| v.code.clone())
			.unwrap_or_default()
	}

	fn code_hash(&self, address: H160) -> H256 {
		H256::from_slice(Keccak256::digest(self.code(address).as_slice()).as_slice())
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state
			.get(&address)
			.map(|v| v.storage.get(&index).cloned().unwrap_or_default())
			.unwrap_or_default()
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> H256 {
		let account = self.state.entry(address).or_insert_with(Default::default);

		if value == H256::default() {
			account.storage.remove(&index).unwrap_or_default()
		} else {
			account.storage.insert(index, value).unwrap_or_default()
		}
	}

	fn log(&mut self, log: Log) {
		self.logs.push(log);
	}

	fn mark_delete(&mut self, address: H160, target: H160) {
		let balance = self.basic(address).balance;

		if let Some(account) = self.state.get_mut(&address) {
			account.balance = U256::zero();
		}
		if address != target {
			let account = self.state.entry(target).or_insert_with(Default::default);
			account.balance = account.balance.saturating_add(balance);
		}

		self.deleted.insert(address);
	}

	fn transfer(&mut self, source: H160, target: H160, value: U256) -> Result<(), ExitError> {
		{
			let account = self.state.entry(source).or_insert_with(Default::default);
			if account.balance < value {
				return Err(ExitError::OutOfFund);
			}
			account.balance -= value;
		}

		let account = self.state.entry(target).or_insert_with(Default::default);
		account.balance = account.balance.saturating_add(value);

		Ok(())
	}

	fn snapshot(&mut self) -> Snapshot {
		self.checkpoints.push(Checkpoint {
			state: self.state.clone(),
			deleted: self.deleted.clone(),
			log_len: self.logs.len(),
		});

		Snapshot(self.checkpoints.len() - 1)
	}

	fn revert_to(&mut self, snapshot: Snapshot) {
		self.checkpoints.truncate(snapshot.0 + 1);
		if let Some(checkpoint) = self.checkpoints.pop() {
			self.state = checkpoint.state;
			self.deleted = checkpoint.deleted;
			self.logs.truncate(checkpoint.log_len);
		}
	}

	fn commit(&mut self, snapshot: Snapshot) {
		self.checkpoints.truncate(snapshot.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vicinity() -> MemoryVicinity {
		MemoryVicinity {
			gas_price: U256::one(),
			origin: H160::zero(),
			block_hashes: Vec::new(),
			block_number: U256::zero(),
			block_coinbase: H160::zero(),
			block_timestamp: U256::zero(),
			block_difficulty: U256::zero(),
			block_gas_limit: U256::zero(),
		}
	}

	#[test]
	fn revert_undoes_storage_and_logs() {
		let vicinity = vicinity();
		let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let key = H256::from_low_u64_be(2);

		let snapshot = backend.snapshot();
		backend.set_storage(address, key, H256::from_low_u64_be(3));
		backend.log(Log {
			address,
			topics: Vec::new(),
			data: Vec::new(),
		});
		backend.revert_to(snapshot);

		assert_eq!(backend.storage(address, key), H256::zero());
		assert!(backend.logs().is_empty());
		assert!(!backend.exists(address));
	}

	#[test]
	fn commit_keeps_writes() {
		let vicinity = vicinity();
		let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let key = H256::from_low_u64_be(2);

		let snapshot = backend.snapshot();
		let prior = backend.set_storage(address, key, H256::from_low_u64_be(3));
		backend.commit(snapshot);

		assert_eq!(prior, H256::zero());
		assert_eq!(backend.storage(address, key), H256::from_low_u64_be(3));
	}

	#[test]
	fn nested_snapshots_unwind_independently() {
		let vicinity = vicinity();
		let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let address = H160::from_low_u64_be(1);
		let outer_key = H256::from_low_u64_be(1);
		let inner_key = H256::from_low_u64_be(2);

		let outer = backend.snapshot();
		backend.set_storage(address, outer_key, H256::from_low_u64_be(1));

		let inner = backend.snapshot();
		backend.set_storage(address, inner_key, H256::from_low_u64_be(2));
		backend.revert_to(inner);

		assert_eq!(backend.storage(address, inner_key), H256::zero());
		assert_eq!(
			backend.storage(address, outer_key),
			H256::from_low_u64_be(1)
		);

		backend.commit(outer);
		assert_eq!(
			backend.storage(address, outer_key),
			H256::from_low_u64_be(1)
		);
	}

	#[test]
	fn blockhash_window() {
		let mut vicinity = vicinity();
		vicinity.block_number = U256::from(300);
		vicinity.block_hashes = (0..256)
			.map(|i| H256::from_low_u64_be(i as u64))
			.collect::<Vec<_>>();

		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());

		// Most recent block (299) is at index 0.
		assert_eq!(
			backend.block_hash(U256::from(299)),
			H256::from_low_u64_be(0)
		);
		assert_eq!(
			backend.block_hash(U256::from(44)),
			H256::from_low_u64_be(255)
		);
		// Out of the window, the current block, and the future are zero.
		assert_eq!(backend.block_hash(U256::from(43)), H256::zero());
		assert_eq!(backend.block_hash(U256::from(300)), H256::zero());
		assert_eq!(backend.block_hash(U256::from(400)), H256::zero());
	}

	#[test]
	fn mark_delete_sweeps_the_balance() {
		let vicinity = vicinity();
		let mut state = BTreeMap::new();
		let doomed = H160::from_low_u64_be(1);
		let heir = H160::from_low_u64_be(2);
		state.insert(
			doomed,
			MemoryAccount {
				balance: U256::from(1000),
				..Default::default()
			},
		);

		let mut backend = MemoryBackend::new(&vicinity, state);
		backend.mark_delete(doomed, heir);

		assert_eq!(backend.basic(doomed).balance, U256::zero());
		assert_eq!(backend.basic(heir).balance, U256::from(1000));
		assert!(backend.deleted(doomed));
	}
}
