use std::collections::BTreeMap;
use std::rc::Rc;

use primitive_types::{H160, H256, U256};
use voskhod::backend::{Backend, MemoryAccount, MemoryBackend, MemoryVicinity};
use voskhod::{
	Capture, Context, Executor, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed,
	Resolve, Runtime, MEMORY_LIMIT, STACK_LIMIT,
};

const ADDRESS: u64 = 0xaa;

fn vicinity() -> MemoryVicinity {
	MemoryVicinity {
		gas_price: U256::one(),
		origin: H160::from_low_u64_be(0xbb),
		block_hashes: Vec::new(),
		block_number: U256::from(42),
		block_coinbase: H160::from_low_u64_be(0xcb),
		block_timestamp: U256::from(999),
		block_difficulty: U256::from(17),
		block_gas_limit: U256::from(8_000_000),
	}
}

fn context() -> Context {
	Context {
		address: H160::from_low_u64_be(ADDRESS),
		caller: H160::from_low_u64_be(0xbb),
		apparent_value: U256::zero(),
	}
}

fn runtime_for(code: Vec<u8>) -> Runtime {
	Runtime::new(
		Rc::new(code),
		Rc::new(Vec::new()),
		STACK_LIMIT,
		MEMORY_LIMIT,
		context(),
	)
}

#[test]
fn sstore_fresh_slot_costs_the_set_price() {
	// PUSH1 0x2a, PUSH1 1, SSTORE, STOP
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("602a60015500").unwrap());

	let (reason, used, refunded) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas(), executor.refunded_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 3 + 3 + 20000);
	assert_eq!(refunded, 0);
	assert_eq!(
		backend.storage(H160::from_low_u64_be(ADDRESS), H256::from_low_u64_be(1)),
		H256::from_low_u64_be(0x2a)
	);
}

fn account_with_storage(key: H256, value: H256) -> BTreeMap<H160, MemoryAccount> {
	let mut storage = BTreeMap::new();
	storage.insert(key, value);

	let mut state = BTreeMap::new();
	state.insert(
		H160::from_low_u64_be(ADDRESS),
		MemoryAccount {
			storage,
			..Default::default()
		},
	);
	state
}

#[test]
fn sstore_occupied_slot_costs_the_reset_price() {
	// PUSH1 7, PUSH1 1, SSTORE, STOP
	let vicinity = vicinity();
	let key = H256::from_low_u64_be(1);
	let mut backend =
		MemoryBackend::new(&vicinity, account_with_storage(key, H256::from_low_u64_be(5)));
	let mut runtime = runtime_for(hex::decode("600760015500").unwrap());

	let (reason, used, refunded) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas(), executor.refunded_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 3 + 3 + 5000);
	assert_eq!(refunded, 0);
	assert_eq!(
		backend.storage(H160::from_low_u64_be(ADDRESS), key),
		H256::from_low_u64_be(7)
	);
}

#[test]
fn clearing_a_slot_credits_the_refund() {
	// PUSH1 0, PUSH1 1, SSTORE, STOP
	let vicinity = vicinity();
	let key = H256::from_low_u64_be(1);
	let mut backend =
		MemoryBackend::new(&vicinity, account_with_storage(key, H256::from_low_u64_be(5)));
	let mut runtime = runtime_for(hex::decode("600060015500").unwrap());

	let (reason, used, refunded) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas(), executor.refunded_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 3 + 3 + 5000);
	assert_eq!(refunded, 15000);
	assert_eq!(
		backend.storage(H160::from_low_u64_be(ADDRESS), key),
		H256::zero()
	);
}

#[test]
fn revert_rolls_back_state_but_keeps_gas_and_data() {
	// PUSH1 0x2a, PUSH1 1, SSTORE,
	// PUSH1 0xaa, PUSH1 0, MSTORE8,
	// PUSH1 1, PUSH1 0, REVERT
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("602a60015560aa60005360016000fd").unwrap());

	let (reason, left) = {
		let mut executor = Executor::new(&mut backend, 30_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.gas())
	};

	assert_eq!(reason, ExitReason::Revert(ExitRevert::Reverted));
	// Pushes 6*3, SSTORE 20000, MSTORE8 3+3, REVERT 0.
	assert_eq!(left, 30_000 - (6 * 3 + 20000 + 6));
	assert_eq!(runtime.machine().return_value(), vec![0xaa]);

	// The write never materialized.
	assert_eq!(
		backend.storage(H160::from_low_u64_be(ADDRESS), H256::from_low_u64_be(1)),
		H256::zero()
	);
	assert!(!backend.exists(H160::from_low_u64_be(ADDRESS)));
}

#[test]
fn exception_rolls_back_state_and_consumes_gas() {
	// PUSH1 0x2a, PUSH1 1, SSTORE, INVALID
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("602a600155fe").unwrap());

	let (reason, left) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.gas())
	};

	assert_eq!(reason, ExitReason::Error(ExitError::DesignatedInvalid));
	assert_eq!(left, 0);
	assert_eq!(
		backend.storage(H160::from_low_u64_be(ADDRESS), H256::from_low_u64_be(1)),
		H256::zero()
	);
}

#[test]
fn log_is_recorded_and_rolled_back_on_revert() {
	// PUSH1 7, PUSH1 0, PUSH1 0, LOG1, STOP
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("600760006000a100").unwrap());

	let (reason, used) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 3 * 3 + 375 + 375);
	assert_eq!(backend.logs().len(), 1);
	assert_eq!(backend.logs()[0].address, H160::from_low_u64_be(ADDRESS));
	assert_eq!(backend.logs()[0].topics, vec![H256::from_low_u64_be(7)]);
	assert!(backend.logs()[0].data.is_empty());

	// The same program ending in REVERT leaves no log behind.
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("600760006000a160006000fd").unwrap());
	{
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		assert!(reason.is_revert());
	}
	assert!(backend.logs().is_empty());
}

#[test]
fn suicide_sweeps_the_balance_and_refunds() {
	// PUSH1 0xcc, SUICIDE
	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(
		H160::from_low_u64_be(ADDRESS),
		MemoryAccount {
			balance: U256::from(1000),
			..Default::default()
		},
	);
	let mut backend = MemoryBackend::new(&vicinity, state);
	let mut runtime = runtime_for(hex::decode("60ccff").unwrap());

	let (reason, used, refunded) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas(), executor.refunded_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Suicided));
	// The beneficiary does not exist: 5000 plus the new-account surcharge.
	assert_eq!(used, 3 + 5000 + 25000);
	assert_eq!(refunded, 24000);
	assert_eq!(
		backend.basic(H160::from_low_u64_be(ADDRESS)).balance,
		U256::zero()
	);
	assert_eq!(
		backend.basic(H160::from_low_u64_be(0xcc)).balance,
		U256::from(1000)
	);
	assert!(backend.deleted(H160::from_low_u64_be(ADDRESS)));
}

#[test]
fn balance_reads_through_the_backend() {
	// PUSH1 0xcc, BALANCE, STOP
	let vicinity = vicinity();
	let mut state = BTreeMap::new();
	state.insert(
		H160::from_low_u64_be(0xcc),
		MemoryAccount {
			balance: U256::from(12345),
			..Default::default()
		},
	);
	let mut backend = MemoryBackend::new(&vicinity, state);
	let mut runtime = runtime_for(hex::decode("60cc3100").unwrap());

	let (reason, used) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.used_gas())
	};

	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 3 + 400);
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(12345)));
}

#[test]
fn block_context_flows_through() {
	// TIMESTAMP, NUMBER, DIFFICULTY, GASLIMIT, COINBASE, STOP
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("424344454100").unwrap());

	{
		let mut executor = Executor::new(&mut backend, 100, 0);
		let reason = executor.execute(&mut runtime);
		assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
		assert_eq!(executor.used_gas(), 2 * 5);
	}

	let stack = runtime.machine().stack();
	assert_eq!(stack.peek(0), Ok(U256::from(0xcb)));
	assert_eq!(stack.peek(1), Ok(U256::from(8_000_000)));
	assert_eq!(stack.peek(2), Ok(U256::from(17)));
	assert_eq!(stack.peek(3), Ok(U256::from(42)));
	assert_eq!(stack.peek(4), Ok(U256::from(999)));
}

#[test]
fn call_surfaces_an_interrupt_for_the_dispatcher() {
	// PUSH1 0 (out_len), PUSH1 0 (out_offset), PUSH1 0 (in_len),
	// PUSH1 0 (in_offset), PUSH1 0 (value), PUSH1 0xbb (to),
	// PUSH2 0xffff (gas), CALL, STOP
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("6000600060006000600060bb61fffff100").unwrap());

	let mut executor = Executor::new(&mut backend, 100_000, 0);
	let mut resolved = false;
	loop {
		match runtime.step(&mut executor) {
			Ok(()) => (),
			Err(Capture::Trap(Resolve::Call(interrupt, resolve))) => {
				assert_eq!(interrupt.code_address, H160::from_low_u64_be(0xbb));
				assert!(interrupt.input.is_empty());
				assert_eq!(interrupt.target_gas, Some(0xffff));
				assert_eq!(interrupt.context.caller, H160::from_low_u64_be(ADDRESS));

				resolve
					.finish(
						ExitReason::Succeed(ExitSucceed::Returned),
						vec![0xde, 0xad],
					)
					.unwrap();
				resolved = true;
			}
			Err(Capture::Trap(Resolve::Create(..))) => panic!("unexpected create interrupt"),
			Err(Capture::Exit(reason)) => {
				assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
				break;
			}
		}
	}

	assert!(resolved);
	// The resolved call pushed its success flag and kept the return buffer.
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::one()));
	assert_eq!(runtime.return_data_buffer(), &[0xde, 0xad][..]);
}

#[test]
fn create_surfaces_an_interrupt_for_the_dispatcher() {
	// PUSH1 0 (len), PUSH1 0 (offset), PUSH1 0 (value), CREATE, STOP
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = runtime_for(hex::decode("600060006000f000").unwrap());

	let created = H160::from_low_u64_be(0xC0FFEE);
	let mut executor = Executor::new(&mut backend, 100_000, 0);
	loop {
		match runtime.step(&mut executor) {
			Ok(()) => (),
			Err(Capture::Trap(Resolve::Create(interrupt, resolve))) => {
				assert_eq!(interrupt.caller, H160::from_low_u64_be(ADDRESS));
				assert!(interrupt.init_code.is_empty());
				assert_eq!(interrupt.value, U256::zero());

				resolve
					.finish(
						ExitReason::Succeed(ExitSucceed::Returned),
						Some(created),
						Vec::new(),
					)
					.unwrap();
			}
			Err(Capture::Trap(Resolve::Call(..))) => panic!("unexpected call interrupt"),
			Err(Capture::Exit(reason)) => {
				assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
				break;
			}
		}
	}

	assert_eq!(
		runtime.machine().stack().peek_h256(0).map(H160::from),
		Ok(created)
	);
}

#[test]
fn unresolved_interrupt_is_fatal() {
	// A CALL driven by `execute` alone has no dispatcher to resolve it.
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime =
		runtime_for(hex::decode("6000600060006000600060bb61fffff100").unwrap());

	let (reason, left) = {
		let mut executor = Executor::new(&mut backend, 100_000, 0);
		let reason = executor.execute(&mut runtime);
		(reason, executor.gas())
	};

	assert_eq!(
		reason,
		ExitReason::Fatal(ExitFatal::UnhandledInterrupt)
	);
	assert_eq!(left, 0);
}
