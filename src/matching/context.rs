//! Transactional binding environment for one matching attempt

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::core::Expr;

/// Insertion-ordered map from pattern variable to bound expression
pub type Bindings = IndexMap<Expr, Expr, FxBuildHasher>;

/// Variable bindings produced by matching a pattern.
///
/// Bindings are only ever appended, so a failed alternative is undone by
/// truncating back to the length recorded before it ([`MatchContext::try_match`]).
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    bindings: Bindings,
}

impl MatchContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with pre-bound variables, given as `x -> value` arrows.
    ///
    /// Entries that are not arrows are ignored.
    #[must_use]
    pub fn with_bindings(arrows: &[Expr]) -> Self {
        let mut bindings = Bindings::default();
        for arrow in arrows {
            if let Some((var, value)) = arrow.as_arrow() {
                bindings.insert(var.clone(), value.clone());
            }
        }
        Self { bindings }
    }

    /// The expression bound to `var`
    #[must_use]
    pub fn get(&self, var: &Expr) -> Option<&Expr> {
        self.bindings.get(var)
    }

    #[must_use]
    pub fn contains(&self, var: &Expr) -> bool {
        self.bindings.contains_key(var)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[must_use]
    pub const fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The bindings as `x -> value` arrows, in binding order
    #[must_use]
    pub fn to_arrows(&self) -> Vec<Expr> {
        self.bindings
            .iter()
            .map(|(var, value)| Expr::arrow(var.clone(), value.clone()))
            .collect()
    }

    /// Bind `var` to `value`, or check an existing binding is equal to `value`
    pub fn bind_or_check(&mut self, var: &Expr, value: &Expr) -> bool {
        match self.bindings.get(var) {
            Some(bound) => bound == value,
            None => {
                self.bindings.insert(var.clone(), value.clone());
                true
            }
        }
    }

    /// Run `attempt`; if it fails, drop every binding it added
    pub fn try_match(&mut self, attempt: impl FnOnce(&mut Self) -> bool) -> bool {
        let mark = self.bindings.len();
        if attempt(self) {
            true
        } else {
            self.bindings.truncate(mark);
            false
        }
    }

    /// Replace the bound variables in `pattern` by their values, unevaluated
    #[must_use]
    pub fn substitute(&self, pattern: &Expr) -> Expr {
        crate::evaluate::substitute(pattern, &self.bindings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_try_match_rolls_back() {
        let x = Expr::variable("x");
        let y = Expr::variable("y");
        let mut ctx = MatchContext::new();
        assert!(ctx.bind_or_check(&x, &Expr::integer(1)));

        let ok = ctx.try_match(|ctx| {
            ctx.bind_or_check(&y, &Expr::integer(2)) && ctx.bind_or_check(&x, &Expr::integer(3))
        });
        assert!(!ok);
        assert_eq!(ctx.len(), 1);
        assert!(!ctx.contains(&y));
        assert_eq!(ctx.get(&x), Some(&Expr::integer(1)));
    }

    #[test]
    fn test_pre_bindings() {
        let x = Expr::variable("x");
        let ctx = MatchContext::with_bindings(&[Expr::arrow(x.clone(), x.clone()), Expr::integer(4)]);
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.to_arrows(), vec![Expr::arrow(x.clone(), x)]);
    }
}
