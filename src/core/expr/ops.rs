//! Operator overloading.
//!
//! Operators build canonical but unevaluated trees; `(x + x)` stays a two-term
//! sum until it goes through the evaluator.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::Expr;

macro_rules! impl_binary_ops {
    ($lhs:ty, $rhs:ty, $to_lhs:expr, $to_rhs:expr) => {
        impl Add<$rhs> for $lhs {
            type Output = Expr;
            fn add(self, rhs: $rhs) -> Expr {
                Expr::add_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Sub<$rhs> for $lhs {
            type Output = Expr;
            fn sub(self, rhs: $rhs) -> Expr {
                Expr::sub_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Mul<$rhs> for $lhs {
            type Output = Expr;
            fn mul(self, rhs: $rhs) -> Expr {
                Expr::mul_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
        impl Div<$rhs> for $lhs {
            type Output = Expr;
            fn div(self, rhs: $rhs) -> Expr {
                Expr::div_expr($to_lhs(self), $to_rhs(rhs))
            }
        }
    };
}

impl_binary_ops!(Expr, Expr, |e: Expr| e, |r: Expr| r);
impl_binary_ops!(Expr, &Expr, |e: Expr| e, |r: &Expr| r.clone());
impl_binary_ops!(Expr, i64, |e: Expr| e, Expr::integer);
impl_binary_ops!(&Expr, &Expr, |e: &Expr| e.clone(), |r: &Expr| r.clone());
impl_binary_ops!(&Expr, Expr, |e: &Expr| e.clone(), |r: Expr| r);
impl_binary_ops!(&Expr, i64, |e: &Expr| e.clone(), Expr::integer);
impl_binary_ops!(i64, Expr, Expr::integer, |r: Expr| r);
impl_binary_ops!(i64, &Expr, Expr::integer, |r: &Expr| r.clone());

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.negate()
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.clone().negate()
    }
}

impl Expr {
    /// `self ^ exponent`, unevaluated
    #[must_use]
    pub fn pow(self, exponent: impl Into<Self>) -> Self {
        Self::power(self, exponent.into())
    }
}
