//! Explicit registry of named values and functions.
//!
//! Name resolution during parsing goes through a `Namespace` passed by
//! reference. `Namespace::standard()` carries the built-in constants and the
//! native function table; user code extends a copy of it.

use std::f64::consts;
use std::sync::{Arc, LazyLock};

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use crate::core::error::CasError;
use crate::core::expr::{Expr, Function};
use crate::core::real::Real;

/// Shared standard namespace, so native functions keep a single identity
static STANDARD: LazyLock<Namespace> = LazyLock::new(Namespace::build_standard);

/// Largest argument `Factorial` evaluates exactly
const MAX_FACTORIAL: i64 = 1000;

/// Named values and overloaded functions
#[derive(Clone, Default)]
pub struct Namespace {
    values: FxHashMap<String, Expr>,
    functions: FxHashMap<String, Vec<Arc<Function>>>,
}

impl Namespace {
    /// Create an empty namespace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard namespace: `Pi`, `e`, `True`, `False` and the native functions
    #[must_use]
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// Bind `name` to a value
    pub fn define_value(&mut self, name: &str, value: Expr) -> &mut Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Add a function overload; one with the same name and arity is replaced
    pub fn define_function(&mut self, function: Function) -> &mut Self {
        let overloads = self.functions.entry(function.name().to_string()).or_default();
        overloads.retain(|f| f.arity() != function.arity());
        overloads.push(Arc::new(function));
        self
    }

    /// The value bound to `name`, if any
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<&Expr> {
        self.values.get(name)
    }

    /// All overloads of `name` accepting `arg_count` arguments
    #[must_use]
    pub fn lookup_function(&self, name: &str, arg_count: usize) -> Vec<Arc<Function>> {
        self.functions
            .get(name)
            .map(|overloads| {
                overloads
                    .iter()
                    .filter(|f| f.arity().contains(&arg_count))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a value name
    ///
    /// # Errors
    /// `UnresolvedName` when nothing is bound to `name`.
    pub fn resolve_name(&self, name: &str) -> Result<Expr, CasError> {
        self.lookup_name(name)
            .cloned()
            .ok_or_else(|| CasError::UnresolvedName {
                name: name.to_string(),
            })
    }

    /// Resolve a function by name and argument count
    ///
    /// # Errors
    /// `UnresolvedName` when no overload accepts `arg_count` arguments,
    /// `AmbiguousName` when several do.
    pub fn resolve_function(&self, name: &str, arg_count: usize) -> Result<Arc<Function>, CasError> {
        let mut candidates = self.lookup_function(name, arg_count);
        match candidates.len() {
            0 => Err(CasError::UnresolvedName {
                name: name.to_string(),
            }),
            1 => candidates.pop().ok_or_else(|| CasError::UnresolvedName {
                name: name.to_string(),
            }),
            n => Err(CasError::AmbiguousName {
                name: name.to_string(),
                candidates: n,
            }),
        }
    }

    /// Whether any function is registered under `name`
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn build_standard() -> Self {
        let mut ns = Self::new();
        ns.define_value("Pi", Expr::constant(consts::PI))
            .define_value("e", Expr::constant(consts::E))
            .define_value("True", Expr::boolean(true))
            .define_value("False", Expr::boolean(false));
        for function in standard_functions() {
            ns.define_function(function);
        }
        ns
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().chain(self.functions.keys()).collect();
        names.sort();
        f.debug_struct("Namespace").field("names", &names).finish()
    }
}

// =============================================================================
// NATIVE FUNCTIONS
// =============================================================================

type NativeResult = Result<Option<Expr>, String>;

fn constant_arg(args: &[Expr], i: usize) -> Option<&Real> {
    args.get(i).and_then(Expr::as_constant)
}

/// A one-argument function computed in `f64`; NaN from a non-NaN input is a domain fault
fn float_unary(f: fn(f64) -> f64) -> impl Fn(&[Expr]) -> NativeResult + Send + Sync + 'static {
    move |args| {
        let Some(c) = constant_arg(args, 0) else {
            return Ok(None);
        };
        let value = f(c.to_f64());
        if value.is_nan() && !c.to_f64().is_nan() {
            return Err(format!("argument {c} is outside the domain"));
        }
        Ok(Some(Expr::constant(Real::from_f64(value))))
    }
}

/// A one-argument function with an exact implementation
fn exact_unary(f: fn(&Real) -> Real) -> impl Fn(&[Expr]) -> NativeResult + Send + Sync + 'static {
    move |args| Ok(constant_arg(args, 0).map(|c| Expr::constant(f(c))))
}

/// Fold constant arguments with `pick`, the call stays symbolic unless all are constant
fn extremum(
    pick: fn(&Real, &Real) -> bool,
) -> impl Fn(&[Expr]) -> NativeResult + Send + Sync + 'static {
    move |args| {
        let mut best: Option<&Real> = None;
        for arg in args {
            let Some(c) = arg.as_constant() else {
                return Ok(None);
            };
            if best.is_none_or(|b| pick(c, b)) {
                best = Some(c);
            }
        }
        Ok(best.map(|b| Expr::constant(b.clone())))
    }
}

fn natural_test(args: &[Expr], natural: bool) -> NativeResult {
    Ok(constant_arg(args, 0).map(|c| {
        Expr::boolean(c.is_integer() && (!natural || !c.is_negative()))
    }))
}

fn factorial(args: &[Expr]) -> NativeResult {
    let Some(c) = constant_arg(args, 0) else {
        return Ok(None);
    };
    let n = c
        .to_i64()
        .filter(|n| *n >= 0)
        .ok_or_else(|| format!("{c} is not a natural number"))?;
    if n > MAX_FACTORIAL {
        return Ok(None);
    }
    let value = (1..=n).fold(BigInt::from(1), |acc, k| acc * k);
    Ok(Some(Expr::constant(Real::from_bigint(value))))
}

fn log(args: &[Expr]) -> NativeResult {
    let Some(x) = constant_arg(args, 0) else {
        return Ok(None);
    };
    let base = match args.get(1) {
        Some(b) => match b.as_constant() {
            Some(b) => b.to_f64(),
            None => return Ok(None),
        },
        None => 10.0,
    };
    if !x.is_positive() {
        return Err(format!("argument {x} is outside the domain"));
    }
    Ok(Some(Expr::constant(Real::from_f64(x.to_f64().log(base)))))
}

fn arctan2(args: &[Expr]) -> NativeResult {
    match (constant_arg(args, 0), constant_arg(args, 1)) {
        (Some(y), Some(x)) => Ok(Some(Expr::constant(Real::from_f64(
            y.to_f64().atan2(x.to_f64()),
        )))),
        _ => Ok(None),
    }
}

fn if_then_else(args: &[Expr]) -> NativeResult {
    let Some(condition) = args.first().and_then(Expr::as_bool) else {
        return Ok(None);
    };
    let branch = if condition { args.get(1) } else { args.get(2) };
    Ok(branch.cloned())
}

fn depends_on(args: &[Expr]) -> NativeResult {
    match args {
        [expr, on] => Ok(Some(Expr::boolean(expr.depends_on_any(&on.set_members())))),
        _ => Ok(None),
    }
}

fn solve_call(args: &[Expr], back_substitute: bool) -> NativeResult {
    let [equations, unknowns] = args else {
        return Ok(None);
    };
    let solutions = crate::solve::Solver::new()
        .back_substitute(back_substitute)
        .solve(&equations.set_members(), &unknowns.set_members())
        .map_err(|e| e.to_string())?;
    Ok(Some(Expr::set(solutions)))
}

/// The native function table of the standard namespace
fn standard_functions() -> Vec<Function> {
    vec![
        Function::native("Abs", 1..=1, exact_unary(Real::abs)),
        Function::native("Sign", 1..=1, exact_unary(Real::signum)),
        Function::native("Min", 1..=usize::MAX, extremum(|a, b| a.total_cmp(b).is_lt())),
        Function::native("Max", 1..=usize::MAX, extremum(|a, b| a.total_cmp(b).is_gt())),
        // Trigonometric
        Function::native("Sin", 1..=1, float_unary(f64::sin)),
        Function::native("Cos", 1..=1, float_unary(f64::cos)),
        Function::native("Tan", 1..=1, float_unary(f64::tan)),
        Function::native("Sec", 1..=1, float_unary(|x| x.cos().recip())),
        Function::native("Csc", 1..=1, float_unary(|x| x.sin().recip())),
        Function::native("Cot", 1..=1, float_unary(|x| x.tan().recip())),
        Function::native("ArcSin", 1..=1, float_unary(f64::asin)),
        Function::native("ArcCos", 1..=1, float_unary(f64::acos)),
        Function::native("ArcTan", 1..=1, float_unary(f64::atan)),
        Function::native("ArcTan2", 2..=2, arctan2),
        // Hyperbolic
        Function::native("Sinh", 1..=1, float_unary(f64::sinh)),
        Function::native("Cosh", 1..=1, float_unary(f64::cosh)),
        Function::native("Tanh", 1..=1, float_unary(f64::tanh)),
        // Exponential
        Function::native("Sqrt", 1..=1, |args: &[Expr]| {
            Ok(args
                .first()
                .map(|x| Expr::power(x.clone(), Expr::rational(1, 2))))
        }),
        Function::native("Exp", 1..=1, float_unary(f64::exp)),
        Function::native("Ln", 1..=1, float_unary(|x| if x > 0.0 { x.ln() } else { f64::NAN })),
        Function::native("Log", 1..=2, log),
        // Rounding
        Function::native("Floor", 1..=1, exact_unary(Real::floor)),
        Function::native("Ceiling", 1..=1, exact_unary(Real::ceil)),
        Function::native("Round", 1..=1, exact_unary(Real::round)),
        Function::native("Factorial", 1..=1, factorial),
        // Predicates and control
        Function::native("IsConstant", 1..=1, |args: &[Expr]| {
            Ok(args.first().map(|x| Expr::boolean(x.is_constant())))
        }),
        Function::native("IsInteger", 1..=1, |args: &[Expr]| natural_test(args, false)),
        Function::native("IsNatural", 1..=1, |args: &[Expr]| natural_test(args, true)),
        Function::native("DependsOn", 2..=2, depends_on),
        Function::native("If", 3..=3, if_then_else),
        // Algebra
        Function::native("Expand", 1..=1, |args: &[Expr]| {
            Ok(args.first().map(crate::evaluate::expand))
        }),
        Function::native("Solve", 2..=2, |args: &[Expr]| solve_call(args, true)),
        Function::native("PartialSolve", 2..=2, |args: &[Expr]| solve_call(args, false)),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_standard_values() {
        let ns = Namespace::standard();
        assert_eq!(ns.resolve_name("True").unwrap(), Expr::one());
        assert!(ns.lookup_name("x").is_none());
        assert!(matches!(
            ns.resolve_name("x"),
            Err(CasError::UnresolvedName { .. })
        ));
    }

    #[test]
    fn test_standard_functions_share_identity() {
        let a = Namespace::standard().resolve_function("Sin", 1).unwrap();
        let b = Namespace::standard().resolve_function("Sin", 1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_arity_filters_overloads() {
        let ns = Namespace::standard();
        assert!(ns.resolve_function("Sin", 2).is_err());
        assert_eq!(ns.lookup_function("Log", 2).len(), 1);
    }

    #[test]
    fn test_overlapping_overloads_are_ambiguous() {
        let mut ns = Namespace::new();
        ns.define_function(Function::unknown("F", 1))
            .define_function(Function::native("F", 1..=2, |_| Ok(None)));
        assert_eq!(
            ns.resolve_function("F", 1).unwrap_err(),
            CasError::AmbiguousName {
                name: "F".to_string(),
                candidates: 2,
            }
        );
        assert!(ns.resolve_function("F", 2).is_ok());
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut ns = Namespace::new();
        ns.define_function(Function::unknown("G", 1))
            .define_function(Function::unknown("G", 1));
        assert_eq!(ns.lookup_function("G", 1).len(), 1);
    }

    #[test]
    fn test_native_helpers() {
        let two = [Expr::integer(2)];
        assert_eq!(factorial(&[Expr::integer(5)]).unwrap(), Some(Expr::integer(120)));
        assert!(factorial(&[Expr::rational(1, 2)]).is_err());
        assert_eq!(factorial(&[Expr::variable("n")]).unwrap(), None);
        assert_eq!(
            natural_test(&[Expr::integer(-2)], true).unwrap(),
            Some(Expr::boolean(false))
        );
        assert_eq!(natural_test(&two, false).unwrap(), Some(Expr::boolean(true)));
        let max = extremum(|a, b| a.total_cmp(b).is_gt());
        assert_eq!(max(&[Expr::integer(1), Expr::integer(3)][..]).unwrap(), Some(Expr::integer(3)));
        assert_eq!(max(&[Expr::integer(1), Expr::variable("x")][..]).unwrap(), None);
    }
}
