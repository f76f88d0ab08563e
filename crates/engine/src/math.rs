//! 18-decimal fixed-point ("WAD") arithmetic.
//!
//! Every routine here must agree bit-for-bit with the contract's math library,
//! so rounding follows the EVM: division truncates toward zero and right
//! shifts of negative values round toward negative infinity. Values are
//! arbitrary precision, so nothing overflows.

use std::sync::LazyLock;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use thiserror::Error;

/// Fixed-point value scaled by 10^18.
pub type Wad = BigInt;

pub const WAD_U64: u64 = 1_000_000_000_000_000_000;

/// `ln(10)` in WAD.
const LN_10_WAD: u64 = 2_302_585_092_994_045_683;

pub static WAD: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(WAD_U64));

/// Largest value that can be scaled up by 10^18 before taking a square root
/// without leaving 256 bits: `(2^256 - 1) / (10^36 - 1)`.
static SQRT_SCALE_LIMIT: LazyLock<BigInt> = LazyLock::new(|| {
    let uint256_max = (BigInt::one() << 256u32) - 1;
    let wad_squared_minus_one = BigInt::from(10u8).pow(36) - 1;
    uint256_max / wad_squared_minus_one
});

/// Domain errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("ln is undefined for non-positive input {0}")]
    LnUndefined(BigInt),

    #[error("division by zero")]
    DivisionByZero,
}

/// `n` whole units as a WAD.
pub fn wad(n: i64) -> Wad {
    BigInt::from(n) * &*WAD
}

/// `x * y / 1e18`, truncated toward zero.
#[inline]
pub fn mul_wad(x: &BigInt, y: &BigInt) -> BigInt {
    (x * y) / &*WAD
}

/// `x * 1e18 / y`, truncated toward zero.
#[inline]
pub fn div_wad(x: &BigInt, y: &BigInt) -> Result<BigInt, MathError> {
    if y.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok((x * &*WAD) / y)
}

/// Floor of the integer square root.
pub fn isqrt(value: &BigInt) -> BigInt {
    if value.is_negative() {
        return BigInt::zero();
    }
    value.sqrt()
}

/// Square root of a WAD, as a WAD.
pub fn sqrt_wad(value: &BigInt) -> BigInt {
    if value <= &*SQRT_SCALE_LIMIT {
        isqrt(&(value * &*WAD))
    } else {
        BigInt::from(1_000_000_000u64) * isqrt(value)
    }
}

fn big(hex: &str) -> BigInt {
    BigInt::parse_bytes(hex.as_bytes(), 16).unwrap_or_default()
}

fn dec(digits: &str) -> BigInt {
    BigInt::parse_bytes(digits.as_bytes(), 10).unwrap_or_default()
}

struct LnConstants {
    u128_max: BigInt,
    u64_max: BigInt,
    debruijn: BigInt,
    byte_table: BigInt,
    p: [BigInt; 7],
    q: [BigInt; 7],
    scale: BigInt,
    ln2: BigInt,
    ln_base_shift: BigInt,
}

static LN: LazyLock<LnConstants> = LazyLock::new(|| LnConstants {
    u128_max: big("ffffffffffffffffffffffffffffffff"),
    u64_max: big("ffffffffffffffff"),
    debruijn: big("8421084210842108cc6318c6db6d54be"),
    byte_table: big("f8f9f9faf9fdfafbf9fdfcfdfafbfcfef9fafdfafcfcfbfefafafcfbffffffff"),
    p: [
        dec("3273285459638523848632254066296"),
        dec("24828157081833163892658089445524"),
        dec("43456485725739037958740375743393"),
        dec("11111509109440967052023855526967"),
        dec("45023709667254063763336534515857"),
        dec("14706773417378608786704636184526"),
        dec("795164235651350426258249787498"),
    ],
    q: [
        dec("5573035233440673466300451813936"),
        dec("71694874799317883764090561454958"),
        dec("283447036172924575727196451306956"),
        dec("401686690394027663651624208769553"),
        dec("204048457590392012362485061816622"),
        dec("31853899698501571402653359427138"),
        dec("909429971244387300277376558375"),
    ],
    scale: dec("1677202110996718588342820967067443963516166"),
    ln2: dec("16597577552685614221487285958193947469193820559219878177908093499208371"),
    ln_base_shift: dec("600920179829731861736702779321621459595472258049074101567377883020018308"),
});

fn flag(cond: bool, shift: u32) -> u32 {
    u32::from(cond) << shift
}

fn low_u32(value: &BigInt) -> u32 {
    let (_, digits) = value.to_u32_digits();
    digits.first().copied().unwrap_or(0)
}

/// Natural logarithm of a WAD, as a WAD.
///
/// (8, 8)-term rational approximation after reducing `x` to `(1, 2) * 2^96`.
pub fn ln_wad(value: &BigInt) -> Result<BigInt, MathError> {
    if !value.is_positive() {
        return Err(MathError::LnUndefined(value.clone()));
    }
    let c = &*LN;
    let mut x = value.clone();

    // r = 255 - log2(x), assembled bit by bit then fixed up from the table.
    let mut r: u32 = flag(c.u128_max < x, 7);
    r |= flag(c.u64_max < (&x >> r), 6);
    r |= flag(BigInt::from(0xffff_ffffu32) < (&x >> r), 5);
    r |= flag(BigInt::from(0xffffu32) < (&x >> r), 4);
    r |= flag(BigInt::from(0xffu32) < (&x >> r), 3);

    let top = low_u32(&(&x >> r));
    let index = low_u32(&(&c.debruijn >> top)) & 0x1f;
    let byte = low_u32(&((&c.byte_table >> (8 * (31 - index))) & BigInt::from(0xffu32)));
    r ^= byte;

    x = (x << r) >> 159u32;

    let mut p = (((&c.p[2] + ((((&c.p[1] + (((&c.p[0] + &x) * &x) >> 96u32)) * &x) >> 96u32)))
        * &x)
        >> 96u32)
        - &c.p[3];
    p = ((p * &x) >> 96u32) - &c.p[4];
    p = ((p * &x) >> 96u32) - &c.p[5];
    p = p * &x - (&c.p[6] << 96u32);

    let mut q = &c.q[0] + &x;
    for coefficient in &c.q[1..] {
        q = coefficient + ((&x * q) >> 96u32);
    }

    p /= q;
    p *= &c.scale;
    p += &c.ln2 * BigInt::from(159i64 - i64::from(r));
    p += &c.ln_base_shift;

    Ok(p >> 174u32)
}

/// Base-10 logarithm of a WAD, as a WAD.
pub fn log10_wad(value: &BigInt) -> Result<BigInt, MathError> {
    Ok(ln_wad(value)? * &*WAD / BigInt::from(LN_10_WAD))
}

pub fn min_wad<'a>(a: &'a BigInt, b: &'a BigInt) -> &'a BigInt {
    if a < b { a } else { b }
}

/// Lossy conversion for logs and display.
pub fn to_f64(value: &BigInt) -> f64 {
    let whole = value / &*WAD;
    let frac = value % &*WAD;
    let whole: f64 = whole.to_string().parse().unwrap_or(f64::NAN);
    let frac: f64 = frac.to_string().parse().unwrap_or(0.0);
    whole + frac / 1e18
}
