use std::collections::BTreeMap;
use std::rc::Rc;

use primitive_types::{H160, U256};
use voskhod::backend::{MemoryBackend, MemoryVicinity};
use voskhod::{Context, Executor, ExitReason, ExitSucceed, Runtime, MEMORY_LIMIT, STACK_LIMIT};

const ADDRESS: u64 = 0xaa;
const CALLER: u64 = 0xbb;

fn vicinity() -> MemoryVicinity {
	MemoryVicinity {
		gas_price: U256::one(),
		origin: H160::from_low_u64_be(CALLER),
		block_hashes: Vec::new(),
		block_number: U256::zero(),
		block_coinbase: H160::zero(),
		block_timestamp: U256::zero(),
		block_difficulty: U256::zero(),
		block_gas_limit: U256::zero(),
	}
}

fn context() -> Context {
	Context {
		address: H160::from_low_u64_be(ADDRESS),
		caller: H160::from_low_u64_be(CALLER),
		apparent_value: U256::zero(),
	}
}

fn run(code: Vec<u8>, data: Vec<u8>, gas_limit: u64) -> (ExitReason, u64, u64, Runtime) {
	let vicinity = vicinity();
	let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let mut runtime = Runtime::new(
		Rc::new(code),
		Rc::new(data),
		STACK_LIMIT,
		MEMORY_LIMIT,
		context(),
	);

	let mut executor = Executor::new(&mut backend, gas_limit, 0);
	let reason = executor.execute(&mut runtime);
	let used = executor.used_gas();
	let left = executor.gas();

	(reason, used, left, runtime)
}

#[test]
fn add_two_numbers() {
	// PUSH1 3, PUSH1 5, ADD, STOP
	let (reason, used, left, runtime) = run(hex::decode("600360050100").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 9);
	assert_eq!(left, 91);
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(8)));
}

#[test]
fn mstore_mload_roundtrip() {
	// PUSH32 <word>, PUSH1 0, MSTORE, PUSH1 0, MLOAD, STOP
	let mut word = [0u8; 32];
	for (i, b) in word.iter_mut().enumerate() {
		*b = i as u8 + 1;
	}

	let mut code = vec![0x7f];
	code.extend_from_slice(&word);
	code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x00, 0x51, 0x00]);

	let (reason, used, _, runtime) = run(code, Vec::new(), 1000);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(
		runtime.machine().stack().peek(0),
		Ok(U256::from_big_endian(&word))
	);
	// Three pushes and the load at 3 each, the store at 3 plus one fresh
	// word of memory.
	assert_eq!(used, 3 + 3 + (3 + 3) + 3 + 3);
}

#[test]
fn dup_then_pop_only_advances_pc() {
	// PUSH1 5, DUP1, POP, STOP
	let (reason, _, _, runtime) = run(hex::decode("6005805000").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(runtime.machine().stack().depth(), 1);
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(5)));
	assert_eq!(runtime.machine().position(), 5);
}

#[test]
fn swap_twice_is_identity() {
	// PUSH1 1, PUSH1 2, SWAP1, SWAP1, STOP
	let (reason, _, _, runtime) = run(hex::decode("60016002909000").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(2)));
	assert_eq!(runtime.machine().stack().peek(1), Ok(U256::from(1)));
}

#[test]
fn calldataload_reads_the_input() {
	// PUSH1 0, CALLDATALOAD, CALLDATASIZE, STOP
	let mut data = vec![0u8; 32];
	data[0] = 0x12;
	data[31] = 0x34;

	let (reason, _, _, runtime) = run(hex::decode("6000353600").unwrap(), data.clone(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(32)));
	assert_eq!(
		runtime.machine().stack().peek(1),
		Ok(U256::from_big_endian(&data))
	);
}

#[test]
fn caller_comes_from_the_context() {
	// CALLER, STOP
	let (reason, used, _, runtime) = run(hex::decode("3300").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(used, 2);
	assert_eq!(runtime.machine().stack().peek(0), Ok(U256::from(CALLER)));
}

#[test]
fn address_is_zero_extended_on_the_stack() {
	// ADDRESS, STOP
	let (reason, _, _, runtime) = run(hex::decode("3000").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	let word = runtime.machine().stack().peek_h256(0).unwrap();
	assert_eq!(H160::from(word), H160::from_low_u64_be(ADDRESS));
	assert_eq!(&word[..12], &[0u8; 12][..]);
}

#[test]
fn execution_is_deterministic() {
	let code = hex::decode("600360050100").unwrap();

	let (reason_a, used_a, left_a, runtime_a) = run(code.clone(), Vec::new(), 100);
	let (reason_b, used_b, left_b, runtime_b) = run(code, Vec::new(), 100);

	assert_eq!(reason_a, reason_b);
	assert_eq!(used_a, used_b);
	assert_eq!(left_a, left_b);
	assert_eq!(
		runtime_a.machine().stack().items(),
		runtime_b.machine().stack().items()
	);
}

#[test]
fn return_surfaces_data_and_unused_gas() {
	// PUSH1 0x2a, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
	let (reason, used, left, runtime) =
		run(hex::decode("602a60005260206000f3").unwrap(), Vec::new(), 100);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
	assert_eq!(used, 3 + 3 + 6 + 3 + 3);
	assert_eq!(left, 100 - 18);

	let value = runtime.machine().return_value();
	assert_eq!(value.len(), 32);
	assert_eq!(U256::from_big_endian(&value), U256::from(0x2a));
}
