use core::cmp::Ordering;

use primitive_types::U256;

use crate::utils;

#[inline]
pub fn slt(op1: U256, op2: U256) -> U256 {
	if utils::signed_cmp(op1, op2) == Ordering::Less {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn sgt(op1: U256, op2: U256) -> U256 {
	if utils::signed_cmp(op1, op2) == Ordering::Greater {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn not(op1: U256) -> U256 {
	!op1
}

#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	let mut ret = U256::zero();

	for i in 0..256 {
		if i < 8 && op1 < 32.into() {
			let o: usize = op1.as_usize();
			let t = 255 - (7 - i + 8 * o);
			let bit_mask = U256::one() << t;
			let value = (op2 & bit_mask) >> t;
			ret = ret.overflowing_add(value << i).0;
		}
	}

	ret
}

#[inline]
pub fn shl(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value << shift.as_usize()
	}
}

#[inline]
pub fn shr(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value >> shift.as_usize()
	}
}

#[inline]
pub fn sar(shift: U256, value: U256) -> U256 {
	let negative = utils::is_negative(value);

	if shift >= U256::from(256) {
		// The entire word is shifted out; only the sign remains.
		return if negative { U256::MAX } else { U256::zero() };
	}

	let shift = shift.as_usize();
	let shifted = value >> shift;

	if negative && shift > 0 {
		// Fill the vacated high bits with the sign.
		shifted | (U256::MAX << (256 - shift))
	} else {
		shifted
	}
}
