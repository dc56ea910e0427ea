use core::convert::TryInto;
use core::ops::Rem;

use primitive_types::{U256, U512};

use crate::utils;

#[inline]
pub fn div(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

#[inline]
pub fn sdiv(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		return U256::zero();
	}
	// The lone overflow case: SIGNED_MIN / -1 wraps back to SIGNED_MIN.
	if op1 == utils::SIGNED_MIN && op2 == U256::MAX {
		return utils::SIGNED_MIN;
	}

	let quotient = utils::abs(op1) / utils::abs(op2);
	if utils::is_negative(op1) != utils::is_negative(op2) {
		utils::negate(quotient)
	} else {
		quotient
	}
}

#[inline]
pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1.rem(op2)
	}
}

#[inline]
pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		return U256::zero();
	}

	// The sign of the remainder follows the dividend.
	let remainder = utils::abs(op1) % utils::abs(op2);
	if utils::is_negative(op1) {
		utils::negate(remainder)
	} else {
		remainder
	}
}

#[inline]
pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let op1: U512 = op1.into();
		let op2: U512 = op2.into();
		let op3: U512 = op3.into();
		let v = (op1 + op2) % op3;
		v.try_into()
			.expect("op3 is less than U256::MAX, thus it never overflows; qed")
	}
}

#[inline]
pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let op1: U512 = op1.into();
		let op2: U512 = op2.into();
		let op3: U512 = op3.into();
		let v = (op1 * op2) % op3;
		v.try_into()
			.expect("op3 is less than U256::MAX, thus it never overflows; qed")
	}
}

#[inline]
pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r: U256 = 1.into();

	while op2 != 0.into() {
		if op2 & 1.into() != 0.into() {
			r = r.overflowing_mul(op1).0;
		}
		op2 = op2 >> 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

#[inline]
pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		// `low_u64` works since op1 < 32
		let bit_index = (8 * op1.low_u64() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	} else {
		op2
	}
}
