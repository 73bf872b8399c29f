//! Arbitrary-precision fixed-point decimals.
//!
//! A [`Decimal`] is `coefficient * 10^exponent` with a big-integer coefficient and an
//! `i32` exponent. Values are immutable; every operation returns a new decimal.
//!
//! Division rounds to [`crate::config::division_precision`] fractional digits when
//! the quotient is not exact. Multiplication panics if the resulting exponent does
//! not fit in an `i32`.

use crate::config;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecimalError {
    #[error("can't convert {0} to decimal")]
    Invalid(String),

    #[error("can't convert {0} to decimal: exponent is not numeric")]
    BadExponent(String),

    #[error("can't convert {0} to decimal: too many .s")]
    TooManyDots(String),

    #[error("can't convert {0} to decimal: fractional part too long")]
    ExponentRange(String),

    #[error("cannot create a decimal from {0}")]
    NotFinite(f64),

    #[error("decimal division by 0")]
    DivisionByZero,
}

#[derive(Clone)]
pub struct Decimal {
    value: BigInt,
    exp: i32,
}

fn ten_pow(n: u64) -> BigInt {
    // Differences of two i32 exponents always fit in u32.
    BigInt::from(10u32).pow(n as u32)
}

/// Floor division with a non-negative remainder, for positive divisors.
fn div_mod_floor(value: &BigInt, divisor: &BigInt) -> (BigInt, BigInt) {
    let mut q = value / divisor;
    let mut m = value % divisor;
    if m.is_negative() {
        q -= 1;
        m += divisor;
    }
    (q, m)
}

impl Decimal {
    /// `value * 10^exp`.
    pub fn new(value: i64, exp: i32) -> Self {
        Self {
            value: BigInt::from(value),
            exp,
        }
    }

    pub fn from_bigint(value: BigInt, exp: i32) -> Self {
        Self { value, exp }
    }

    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value, 0)
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            value: BigInt::from(value),
            exp: 0,
        }
    }

    /// Convert a float using its shortest round-trip representation.
    pub fn from_f64(value: f64) -> Result<Self, DecimalError> {
        if !value.is_finite() {
            return Err(DecimalError::NotFinite(value));
        }
        if value.floor() == value && value <= i64::MAX as f64 && value >= i64::MIN as f64 {
            return Ok(Self::new(value as i64, 0));
        }
        // Display for f64 never switches to exponent notation.
        format!("{}", value).parse()
    }

    /// Convert a float keeping exactly `-exp` fractional digits, rounding half away from zero.
    pub fn from_f64_with_exponent(value: f64, exp: i32) -> Result<Self, DecimalError> {
        let scaled = value * 10f64.powf(-(exp as f64));
        if !scaled.is_finite() {
            return Err(DecimalError::NotFinite(scaled));
        }
        let rounded = if scaled < 0.0 {
            (scaled - 0.5) as i64
        } else {
            (scaled + 0.5) as i64
        };
        Ok(Self::new(rounded, exp))
    }

    /// Same value expressed at exponent `exp`. Increasing the exponent truncates.
    pub fn rescale(&self, exp: i32) -> Self {
        let diff = (exp as i64 - self.exp as i64).unsigned_abs();
        let value = match exp.cmp(&self.exp) {
            Ordering::Greater => &self.value / ten_pow(diff),
            Ordering::Less => &self.value * ten_pow(diff),
            Ordering::Equal => self.value.clone(),
        };
        Self { value, exp }
    }

    fn aligned(&self, other: &Decimal) -> (BigInt, BigInt, i32) {
        let exp = self.exp.min(other.exp);
        (self.rescale(exp).value, other.rescale(exp).value, exp)
    }

    pub fn abs(&self) -> Self {
        Self {
            value: self.value.abs(),
            exp: self.exp,
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            value: -&self.value,
            exp: self.exp,
        }
    }

    pub fn add(&self, other: &Decimal) -> Self {
        let (a, b, exp) = self.aligned(other);
        Self { value: a + b, exp }
    }

    pub fn sub(&self, other: &Decimal) -> Self {
        let (a, b, exp) = self.aligned(other);
        Self { value: a - b, exp }
    }

    /// # Panics
    /// If the combined exponent overflows an `i32`.
    pub fn mul(&self, other: &Decimal) -> Self {
        let exp = self.exp as i64 + other.exp as i64;
        if exp > i32::MAX as i64 || exp < i32::MIN as i64 {
            panic!("exponent {} overflows an i32!", exp);
        }
        Self {
            value: &self.value * &other.value,
            exp: exp as i32,
        }
    }

    /// Division rounded to the global division precision.
    ///
    /// # Panics
    /// If `other` is zero.
    pub fn div(&self, other: &Decimal) -> Self {
        self.div_round(other, config::division_precision())
    }

    /// Division that reports a zero divisor instead of panicking.
    pub fn checked_div(&self, other: &Decimal) -> Option<Self> {
        if other.is_zero() {
            None
        } else {
            Some(self.div(other))
        }
    }

    /// Quotient and remainder such that `self = other * q + r`, with `q` carrying
    /// exactly `precision` fractional digits and `|r| < |other| * 10^-precision`.
    ///
    /// # Panics
    /// If `other` is zero or the scale computation overflows.
    pub fn quo_rem(&self, other: &Decimal, precision: i32) -> (Decimal, Decimal) {
        assert!(!other.is_zero(), "decimal division by 0");
        let scale = -(precision as i64);
        let e = self.exp as i64 - other.exp as i64 - scale;
        if e > u32::MAX as i64 || e < -(u32::MAX as i64) {
            panic!("overflow in decimal QuoRem");
        }
        let (aa, bb, rest_exp) = if e < 0 {
            (self.value.clone(), &other.value * ten_pow(e.unsigned_abs()), self.exp as i64)
        } else {
            (&self.value * ten_pow(e as u64), other.value.clone(), scale + other.exp as i64)
        };
        let q = &aa / &bb;
        let r = &aa % &bb;
        (
            Decimal {
                value: q,
                exp: scale as i32,
            },
            Decimal {
                value: r,
                exp: rest_exp as i32,
            },
        )
    }

    /// Division rounded half away from zero to `precision` fractional digits.
    /// The result always has exponent `-precision`.
    pub fn div_round(&self, other: &Decimal, precision: i32) -> Self {
        let (q, r) = self.quo_rem(other, precision);
        let doubled = Decimal {
            value: r.value.abs() << 1usize,
            exp: r.exp.saturating_add(precision),
        };
        if doubled.cmp(&other.abs()) == Ordering::Less {
            return q;
        }
        let unit = Decimal::new(1, -precision);
        if self.sign() * other.sign() < 0 {
            q.sub(&unit)
        } else {
            q.add(&unit)
        }
    }

    /// Remainder of truncated division.
    pub fn modulo(&self, other: &Decimal) -> Self {
        let quotient = self.div(other).truncate(0);
        self.sub(&other.mul(&quotient))
    }

    /// `self ^ other` by recursive halving of the exponent.
    ///
    /// Exact for integer exponents. Fractional exponents are halved through decimal
    /// division until the integer part reaches zero, so the result only approximates.
    /// A zero base with a negative exponent is a division by zero.
    pub fn pow(&self, other: &Decimal) -> Result<Self, DecimalError> {
        let int_part = other.int_part();
        if int_part == 0 {
            return Ok(Decimal::new(1, 0));
        }
        if int_part < 0 && self.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        let half = self.pow(&other.div(&Decimal::new(2, 0)))?;
        if int_part % 2 == 0 {
            return Ok(half.mul(&half));
        }
        if int_part > 0 {
            Ok(half.mul(&half).mul(self))
        } else {
            Ok(half.mul(&half).div(self))
        }
    }

    pub fn sign(&self) -> i32 {
        match self.value.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn exponent(&self) -> i32 {
        self.exp
    }

    pub fn coefficient(&self) -> BigInt {
        self.value.clone()
    }

    /// Integer component, truncated toward zero. Saturates outside the `i64` range.
    pub fn int_part(&self) -> i64 {
        let scaled = self.rescale(0).value;
        scaled.to_i64().unwrap_or(if scaled.is_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// Nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        self.render(false).parse().unwrap_or(f64::NAN)
    }

    /// Round half away from zero to `places` fractional digits; negative places round
    /// the integer part.
    pub fn round(&self, places: i32) -> Self {
        let mut ret = self.rescale(-places - 1);
        let five = BigInt::from(5);
        if ret.value.is_negative() {
            ret.value -= five;
        } else {
            ret.value += five;
        }
        let (mut q, m) = div_mod_floor(&ret.value, &BigInt::from(10));
        if q.is_negative() && !m.is_zero() {
            q += BigInt::one();
        }
        Self {
            value: q,
            exp: ret.exp + 1,
        }
    }

    pub fn floor(&self) -> Self {
        if self.exp >= 0 {
            return self.clone();
        }
        let (q, _) = div_mod_floor(&self.value, &ten_pow(self.exp.unsigned_abs() as u64));
        Self { value: q, exp: 0 }
    }

    pub fn ceil(&self) -> Self {
        if self.exp >= 0 {
            return self.clone();
        }
        let (mut q, m) = div_mod_floor(&self.value, &ten_pow(self.exp.unsigned_abs() as u64));
        if !m.is_zero() {
            q += BigInt::one();
        }
        Self { value: q, exp: 0 }
    }

    /// Drop digits past `precision` fractional places without rounding.
    pub fn truncate(&self, precision: i32) -> Self {
        if precision >= 0 && -precision > self.exp {
            self.rescale(-precision)
        } else {
            self.clone()
        }
    }

    /// Rounded fixed-point string with exactly `places` fractional digits.
    pub fn string_fixed(&self, places: i32) -> String {
        self.round(places).render(false)
    }

    pub fn string_scaled(&self, exp: i32) -> String {
        self.rescale(exp).to_string()
    }

    /// JSON text for this value, quoted unless the global flag says otherwise.
    pub fn to_json_text(&self) -> String {
        if config::marshal_json_without_quotes() {
            self.to_string()
        } else {
            format!("\"{}\"", self)
        }
    }

    fn render(&self, trim_trailing_zeros: bool) -> String {
        if self.exp >= 0 {
            return self.rescale(0).value.to_string();
        }

        let digits = self.value.abs().to_string();
        let frac_len = self.exp.unsigned_abs() as usize;
        let (int_part, mut frac_part) = if digits.len() > frac_len {
            let split = digits.len() - frac_len;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), "0".repeat(frac_len - digits.len()) + &digits)
        };

        if trim_trailing_zeros {
            let trimmed = frac_part.trim_end_matches('0').len();
            frac_part.truncate(trimmed);
        }

        let mut number = int_part;
        if !frac_part.is_empty() {
            number.push('.');
            number.push_str(&frac_part);
        }
        if self.value.is_negative() {
            format!("-{}", number)
        } else {
            number
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    /// Parses `-123.45`, `.0001`, `1e10`, `1.5E-3` and similar.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut text = input;
        let mut exp: i64 = 0;

        if let Some(idx) = text.find(['e', 'E']) {
            exp = text[idx + 1..]
                .parse::<i32>()
                .map_err(|err| match err.kind() {
                    std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                        DecimalError::ExponentRange(input.to_string())
                    }
                    _ => DecimalError::BadExponent(input.to_string()),
                })? as i64;
            text = &text[..idx];
        }

        let parts: Vec<&str> = text.split('.').collect();
        let int_string = match parts.as_slice() {
            [whole] => whole.to_string(),
            [whole, fraction] => {
                let fraction = fraction.trim_end_matches('0');
                exp -= fraction.len() as i64;
                format!("{}{}", whole, fraction)
            }
            _ => return Err(DecimalError::TooManyDots(input.to_string())),
        };

        let digits = int_string.strip_prefix('+').unwrap_or(&int_string);
        let unsigned = digits.strip_prefix('-').unwrap_or(digits);
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecimalError::Invalid(input.to_string()));
        }
        let value = BigInt::from_str(digits).map_err(|_| DecimalError::Invalid(input.to_string()))?;

        if exp < i32::MIN as i64 || exp > i32::MAX as i64 {
            return Err(DecimalError::ExponentRange(input.to_string()));
        }
        Ok(Self {
            value,
            exp: exp as i32,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({}e{})", self.value, self.exp)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

pub fn min<'a, I>(first: &Decimal, rest: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    rest.into_iter()
        .fold(first.clone(), |acc, item| if item < &acc { item.clone() } else { acc })
}

pub fn max<'a, I>(first: &Decimal, rest: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    rest.into_iter()
        .fold(first.clone(), |acc, item| if item > &acc { item.clone() } else { acc })
}

pub fn sum<'a, I>(first: &Decimal, rest: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    rest.into_iter().fold(first.clone(), |acc, item| acc.add(item))
}

pub fn avg(first: &Decimal, rest: &[Decimal]) -> Decimal {
    let count = Decimal::new(rest.len() as i64 + 1, 0);
    sum(first, rest).div(&count)
}
