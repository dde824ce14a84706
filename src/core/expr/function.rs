//! Function references carried by call nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use std::sync::Arc;

use super::{Expr, fast_key};

/// Native evaluation hook.
///
/// Returns `Ok(None)` when the arguments are not of a shape the function can
/// evaluate (the call then stays symbolic) and `Err` for a domain fault.
pub type NativeFn = dyn Fn(&[Expr]) -> Result<Option<Expr>, String> + Send + Sync;

/// How a function produces its value
#[derive(Clone)]
pub enum FunctionBody {
    /// Evaluated by a Rust closure
    Native(Arc<NativeFn>),
    /// Defined by an expression over its parameters
    Expression {
        parameters: Vec<Expr>,
        body: Arc<Expr>,
    },
    /// Opaque, never evaluated
    Unknown,
}

/// A named function with an accepted argument count
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    key: u64,
    arity: RangeInclusive<usize>,
    body: FunctionBody,
}

impl Function {
    /// A function evaluated by `eval`
    pub fn native(
        name: &str,
        arity: RangeInclusive<usize>,
        eval: impl Fn(&[Expr]) -> Result<Option<Expr>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name),
            key: fast_key(name),
            arity,
            body: FunctionBody::Native(Arc::new(eval)),
        }
    }

    /// A function defined by `body` over `parameters`
    #[must_use]
    pub fn expression(name: &str, parameters: Vec<Expr>, body: Expr) -> Self {
        let n = parameters.len();
        Self {
            name: Arc::from(name),
            key: fast_key(name),
            arity: n..=n,
            body: FunctionBody::Expression {
                parameters,
                body: Arc::new(body),
            },
        }
    }

    /// An opaque function of fixed arity
    #[must_use]
    pub fn unknown(name: &str, arity: usize) -> Self {
        Self {
            name: Arc::from(name),
            key: fast_key(name),
            arity: arity..=arity,
            body: FunctionBody::Unknown,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub const fn arity(&self) -> &RangeInclusive<usize> {
        &self.arity
    }

    #[must_use]
    pub const fn body(&self) -> &FunctionBody {
        &self.body
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self.body, FunctionBody::Unknown)
    }

    /// Whether the function can be invoked with `args`
    #[must_use]
    pub fn can_call(&self, args: &[Expr]) -> bool {
        !self.is_unknown() && self.arity.contains(&args.len())
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        if self.key != other.key || self.name != other.name || self.arity != other.arity {
            return false;
        }
        match (&self.body, &other.body) {
            (FunctionBody::Native(a), FunctionBody::Native(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (
                FunctionBody::Expression {
                    parameters: pa,
                    body: ba,
                },
                FunctionBody::Expression {
                    parameters: pb,
                    body: bb,
                },
            ) => pa == pb && ba == bb,
            (FunctionBody::Unknown, FunctionBody::Unknown) => true,
            _ => false,
        }
    }
}

impl Eq for Function {}

impl Hash for Function {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.arity.start().hash(state);
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            FunctionBody::Native(_) => "native",
            FunctionBody::Expression { .. } => "expression",
            FunctionBody::Unknown => "unknown",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("body", &kind)
            .finish()
    }
}
