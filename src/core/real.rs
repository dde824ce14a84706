//! Numeric tower used as the payload of every constant leaf.
//!
//! Values are exact rationals whenever possible. Operations that leave the
//! rationals (non-perfect roots, transcendental functions, division by zero)
//! fall back to `f64`. Floats that come back exactly integral are folded back
//! into the rational representation so `2.0` and `2` are the same constant.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Largest integer exponent evaluated exactly; anything above goes through `f64`.
const MAX_EXACT_EXPONENT: u32 = 4096;

/// Tolerance used by approximate equality (`~=`).
pub const APPROX_EQUAL_TOLERANCE: f64 = 1e-12;

/// An exact rational or a floating point real.
#[derive(Debug, Clone)]
pub enum Real {
    /// Exact value
    Rational(BigRational),
    /// Inexact fallback (also carries NaN and infinities)
    Float(f64),
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Real {
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self::Rational(BigRational::zero())
    }

    #[inline]
    #[must_use]
    pub fn one() -> Self {
        Self::Rational(BigRational::one())
    }

    /// Create an exact integer
    #[must_use]
    pub fn from_i64(n: i64) -> Self {
        Self::Rational(BigRational::from_integer(BigInt::from(n)))
    }

    /// Create an exact integer from a big integer
    #[must_use]
    pub fn from_bigint(n: BigInt) -> Self {
        Self::Rational(BigRational::from_integer(n))
    }

    /// Create the exact fraction `numer / denom`.
    ///
    /// A zero denominator yields a float infinity (or NaN for `0/0`).
    #[must_use]
    pub fn from_ratio(numer: i64, denom: i64) -> Self {
        if denom == 0 {
            return Self::Float(numer as f64 / 0.0);
        }
        Self::Rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// Create a real from a float, folding exactly integral values into rationals
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && let Some(r) = BigRational::from_float(value)
        {
            return Self::Rational(r);
        }
        Self::Float(value)
    }

    /// Parse a decimal literal (`12`, `1.5`, `.5`, `2e-3`) exactly.
    ///
    /// Returns `None` when the text is not a well-formed literal.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => {
                let exp: i64 = text[pos + 1..].parse().ok()?;
                (&text[..pos], exp)
            }
            None => (text, 0),
        };

        let (int_part, frac_part) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let digits = format!("{int_part}{frac_part}");
        let numer: BigInt = digits.parse().ok()?;
        let scale = exponent - i64::try_from(frac_part.len()).ok()?;
        let ten = BigInt::from(10);
        let shift = num_traits::pow(ten, usize::try_from(scale.unsigned_abs()).ok()?);

        let value = if scale >= 0 {
            BigRational::from_integer(numer * shift)
        } else {
            BigRational::new(numer, shift)
        };
        Some(Self::Rational(value))
    }
}

// =============================================================================
// QUERIES
// =============================================================================

impl Real {
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_zero(),
            Self::Float(f) => *f == 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_one(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_one(),
            Self::Float(f) => *f == 1.0,
        }
    }

    /// True for exactly `-1`
    #[must_use]
    pub fn is_minus_one(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_integer() && *r.numer() == BigInt::from(-1),
            Self::Float(f) => *f == -1.0,
        }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_negative(),
            Self::Float(f) => *f < 0.0,
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Rational(r) => r.is_positive(),
            Self::Float(f) => *f > 0.0,
        }
    }

    /// True when the value is an exact integer
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Rational(r) if r.is_integer())
    }

    /// True for NaN or an infinity
    #[must_use]
    pub fn is_nonfinite(&self) -> bool {
        matches!(self, Self::Float(f) if !f.is_finite())
    }

    /// The integer value, if this is an exact integer
    #[must_use]
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Self::Rational(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    /// The integer value as `i64`, if it is an exact integer that fits
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.to_integer().and_then(|n| n.to_i64())
    }

    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Self::Float(f) => *f,
        }
    }

    /// `|l - r| <= tolerance * max(|l|, |r|)`
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        if let (Self::Rational(a), Self::Rational(b)) = (self, other)
            && a == b
        {
            return true;
        }
        let (l, r) = (self.to_f64(), other.to_f64());
        (l - r).abs() <= APPROX_EQUAL_TOLERANCE * l.abs().max(r.abs())
    }

    /// Total order used for canonical sorting and relational operators
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> CmpOrdering {
        match (self, other) {
            (Self::Rational(a), Self::Rational(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Rational(_), Self::Float(b)) => match self.to_f64().partial_cmp(b) {
                Some(CmpOrdering::Equal) | None => CmpOrdering::Less,
                Some(ord) => ord,
            },
            (Self::Float(a), Self::Rational(_)) => match a.partial_cmp(&other.to_f64()) {
                Some(CmpOrdering::Equal) | None => CmpOrdering::Greater,
                Some(ord) => ord,
            },
        }
    }
}

// =============================================================================
// ARITHMETIC
// =============================================================================

impl Real {
    fn binary(
        &self,
        other: &Self,
        exact: fn(&BigRational, &BigRational) -> BigRational,
        float: fn(f64, f64) -> f64,
    ) -> Self {
        match (self, other) {
            (Self::Rational(a), Self::Rational(b)) => Self::Rational(exact(a, b)),
            _ => Self::from_f64(float(self.to_f64(), other.to_f64())),
        }
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        match self {
            Self::Rational(r) => Self::Rational(r.abs()),
            Self::Float(f) => Self::Float(f.abs()),
        }
    }

    /// -1, 0 or 1
    #[must_use]
    pub fn signum(&self) -> Self {
        if self.is_negative() {
            Self::from_i64(-1)
        } else if self.is_positive() {
            Self::one()
        } else {
            Self::zero()
        }
    }

    #[must_use]
    pub fn recip(&self) -> Self {
        Self::one() / self.clone()
    }

    #[must_use]
    pub fn floor(&self) -> Self {
        match self {
            Self::Rational(r) => Self::Rational(r.floor()),
            Self::Float(f) => Self::from_f64(f.floor()),
        }
    }

    #[must_use]
    pub fn ceil(&self) -> Self {
        match self {
            Self::Rational(r) => Self::Rational(r.ceil()),
            Self::Float(f) => Self::from_f64(f.ceil()),
        }
    }

    #[must_use]
    pub fn round(&self) -> Self {
        match self {
            Self::Rational(r) => Self::Rational(r.round()),
            Self::Float(f) => Self::from_f64(f.round()),
        }
    }

    /// Apply a float function; used for transcendental functions
    #[must_use]
    pub fn map_f64(&self, f: impl FnOnce(f64) -> f64) -> Self {
        Self::from_f64(f(self.to_f64()))
    }

    /// Raise to a real power.
    ///
    /// Exact for integer exponents and for rational exponents whose root is a
    /// perfect power of the base; otherwise computed in `f64`.
    #[must_use]
    pub fn pow(&self, exponent: &Self) -> Self {
        let (Self::Rational(base), Self::Rational(exp)) = (self, exponent) else {
            return Self::from_f64(self.to_f64().powf(exponent.to_f64()));
        };

        if exp.is_integer() {
            return pow_integer(base, exp.numer()).unwrap_or_else(|| {
                Self::from_f64(self.to_f64().powf(exponent.to_f64()))
            });
        }

        if let Some(root) = exact_root(base, exp.denom())
            && let Some(value) = pow_integer(&root, exp.numer())
        {
            return value;
        }
        Self::from_f64(self.to_f64().powf(exponent.to_f64()))
    }
}

fn pow_integer(base: &BigRational, exp: &BigInt) -> Option<Real> {
    let e = exp.to_i32()?;
    if e.unsigned_abs() > MAX_EXACT_EXPONENT {
        return None;
    }
    if base.is_zero() && e < 0 {
        return Some(Real::Float(f64::INFINITY));
    }
    Some(Real::Rational(base.pow(e)))
}

/// The exact `degree`-th root of `base`, when it is rational
fn exact_root(base: &BigRational, degree: &BigInt) -> Option<BigRational> {
    let n = degree.to_u32()?;
    if n == 0 || n > MAX_EXACT_EXPONENT {
        return None;
    }
    if base.is_negative() && n.is_even() {
        return None;
    }
    let numer = base.numer().nth_root(n);
    let denom = base.denom().nth_root(n);
    if num_traits::pow(numer.clone(), n as usize) == *base.numer()
        && num_traits::pow(denom.clone(), n as usize) == *base.denom()
    {
        Some(BigRational::new(numer, denom))
    } else {
        None
    }
}

impl Add for Real {
    type Output = Real;
    fn add(self, rhs: Real) -> Real {
        self.binary(&rhs, |a, b| a + b, |a, b| a + b)
    }
}

impl Sub for Real {
    type Output = Real;
    fn sub(self, rhs: Real) -> Real {
        self.binary(&rhs, |a, b| a - b, |a, b| a - b)
    }
}

impl Mul for Real {
    type Output = Real;
    fn mul(self, rhs: Real) -> Real {
        self.binary(&rhs, |a, b| a * b, |a, b| a * b)
    }
}

impl Div for Real {
    type Output = Real;
    fn div(self, rhs: Real) -> Real {
        if rhs.is_zero() {
            return Self::Float(self.to_f64() / 0.0);
        }
        self.binary(&rhs, |a, b| a / b, |a, b| a / b)
    }
}

impl Neg for Real {
    type Output = Real;
    fn neg(self) -> Real {
        match self {
            Self::Rational(r) => Self::Rational(-r),
            Self::Float(f) => Self::Float(-f),
        }
    }
}

// =============================================================================
// EQUALITY / HASHING
// =============================================================================

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Rational(a), Self::Rational(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Rational(r) => {
                0u8.hash(state);
                r.numer().hash(state);
                r.denom().hash(state);
            }
            Self::Float(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

impl From<i64> for Real {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<i32> for Real {
    fn from(n: i32) -> Self {
        Self::from_i64(i64::from(n))
    }
}

impl From<f64> for Real {
    fn from(f: f64) -> Self {
        Self::from_f64(f)
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(x) => write!(f, "{x}"),
            Self::Rational(r) if r.is_integer() => write!(f, "{}", r.numer()),
            Self::Rational(r) => match terminating_decimal(r) {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}/{}", r.numer(), r.denom()),
            },
        }
    }
}

/// Exact decimal expansion of `r`, if its denominator has only factors 2 and 5
fn terminating_decimal(r: &BigRational) -> Option<String> {
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut denom = r.denom().clone();
    let (mut twos, mut fives) = (0usize, 0usize);
    while denom.is_multiple_of(&two) {
        denom /= &two;
        twos += 1;
    }
    while denom.is_multiple_of(&five) {
        denom /= &five;
        fives += 1;
    }
    if !denom.is_one() {
        return None;
    }

    let places = twos.max(fives);
    let scaled = r.abs() * BigRational::from_integer(num_traits::pow(BigInt::from(10), places));
    let digits = scaled.to_integer().to_string();
    let digits = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - places);
    let sign = if r.is_negative() { "-" } else { "" };
    Some(format!("{sign}{int_part}.{frac_part}"))
}
