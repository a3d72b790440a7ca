//! Literal parsing and narrowing.
//!
//! Integer literals are evaluated in arbitrary precision, since
//! `digit+ * 10^exp` can blow through 64 bits mid-computation even when the
//! final bounds check fails. Narrowing to the instruction encoding happens
//! only after the bounds check: the value is taken as an `i64` bit pattern
//! (sign-extended from `i32` for 32-bit bases) and split into two 32-bit
//! halves.

use num_bigint::BigInt;

use twine_common::ids::TypeId;

use crate::ty::{TY_I32, TY_I64};

/// Why an integer literal failed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntLitError {
    /// The literal's exponent is negative, so it denotes no integer.
    NegativeExponent,
    /// The literal text is not digits with an optional exponent. The lexer
    /// never produces such text; this covers defensive parsing of payloads.
    Malformed,
}

/// Exponents past this point cannot matter: the value is already far
/// outside any 64-bit range, and capping keeps the multiply loop bounded.
const MAX_EXPONENT: u32 = 4096;

/// Evaluate an integer literal `digit+ [eE][+-]?digit+`.
pub fn parse_int_literal(text: &str) -> Result<BigInt, IntLitError> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(split) => (&text[..split], &text[split + 1..]),
        None => (text, ""),
    };

    if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntLitError::Malformed);
    }
    let mut value: BigInt = mantissa.parse().map_err(|_| IntLitError::Malformed)?;

    if exponent.is_empty() {
        return Ok(value);
    }
    let (negative, digits) = match exponent.as_bytes()[0] {
        b'-' => (true, &exponent[1..]),
        b'+' => (false, &exponent[1..]),
        _ => (false, exponent),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntLitError::Malformed);
    }
    if negative {
        // `0e-5` is still zero; anything else is fractional.
        if value == BigInt::from(0) {
            return Ok(value);
        }
        return Err(IntLitError::NegativeExponent);
    }

    let exp: u32 = digits.parse().unwrap_or(MAX_EXPONENT).min(MAX_EXPONENT);
    if value != BigInt::from(0) {
        let ten = BigInt::from(10);
        for _ in 0..exp {
            value *= &ten;
        }
    }
    Ok(value)
}

/// Inclusive bounds of an integer base primitive.
///
/// # Panics
///
/// Panics on non-integer base types; callers resolve refinements to their
/// base first.
pub fn int_bounds(base: TypeId) -> (BigInt, BigInt) {
    match base {
        TY_I32 => (BigInt::from(i32::MIN), BigInt::from(i32::MAX)),
        TY_I64 => (BigInt::from(i64::MIN), BigInt::from(i64::MAX)),
        other => panic!("int_bounds on non-integer base {other:?}"),
    }
}

/// Split an in-range value into the instruction encoding's two 32-bit
/// halves. The value is sign-extended to 64 bits first, so the halves are
/// correct for both `i32` and `i64` bases.
pub fn split_halves(value: &BigInt) -> (u32, u32) {
    let v = i64::try_from(value).expect("value was bounds-checked to fit i64");
    let bits = v as u64;
    ((bits & 0xFFFF_FFFF) as u32, (bits >> 32) as u32)
}

/// Whether a finite `f64` value falls outside `f32`'s finite range.
pub fn overflows_f32(value: f64) -> bool {
    value.is_finite() && (value as f32).is_infinite()
}
