use primitive_types::{H256, U256};
use voskhod_core::ExitError;

use crate::consts::*;
use crate::utils::log2floor;

pub fn exp_cost(power: U256) -> Result<u64, ExitError> {
	if power == U256::zero() {
		Ok(G_EXP)
	} else {
		let gas = U256::from(G_EXP)
			.checked_add(
				U256::from(G_EXPBYTE)
					.checked_mul(U256::from(log2floor(power) / 8 + 1))
					.ok_or(ExitError::OutOfGas)?,
			)
			.ok_or(ExitError::OutOfGas)?;

		if gas > U256::from(u64::MAX) {
			return Err(ExitError::OutOfGas);
		}

		Ok(gas.as_u64())
	}
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);

	let gas = U256::from(G_SHA3)
		.checked_add(
			U256::from(G_SHA3WORD)
				.checked_mul(if wordr == U256::zero() {
					wordd
				} else {
					wordd + U256::one()
				})
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);

	let gas = U256::from(G_VERYLOW)
		.checked_add(
			U256::from(G_COPY)
				.checked_mul(if wordr == U256::zero() {
					wordd
				} else {
					wordd + U256::one()
				})
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn extcodecopy_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);

	let gas = U256::from(G_EXTCODE)
		.checked_add(
			U256::from(G_COPY)
				.checked_mul(if wordr == U256::zero() {
					wordd
				} else {
					wordd + U256::one()
				})
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	let gas = U256::from(G_LOG)
		.checked_add(
			U256::from(G_LOGDATA)
				.checked_mul(len)
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?
		.checked_add(U256::from(G_LOGTOPIC * n as u64))
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn sstore_cost(current: H256, new: H256) -> u64 {
	if current == H256::zero() && new != H256::zero() {
		G_SSET
	} else {
		G_SRESET
	}
}

pub fn sstore_refund(current: H256, new: H256) -> i64 {
	if current != H256::zero() && new == H256::zero() {
		R_SCLEAR
	} else {
		0
	}
}

pub fn suicide_cost(target_exists: bool) -> u64 {
	let suicide_gas_topup = if target_exists {
		0
	} else {
		G_SUICIDE_NEWACCOUNT
	};

	G_SUICIDE + suicide_gas_topup
}

pub fn suicide_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		R_SUICIDE
	}
}

pub fn call_cost(value: U256, new_account_charge: bool, target_exists: bool) -> u64 {
	let transfers_value = value != U256::zero();
	G_CALL + xfer_cost(transfers_value) + new_cost(new_account_charge, target_exists, transfers_value)
}

fn xfer_cost(transfers_value: bool) -> u64 {
	if transfers_value {
		G_CALLVALUE
	} else {
		0
	}
}

fn new_cost(new_account_charge: bool, target_exists: bool, transfers_value: bool) -> u64 {
	if new_account_charge && transfers_value && !target_exists {
		G_NEWACCOUNT
	} else {
		0
	}
}
