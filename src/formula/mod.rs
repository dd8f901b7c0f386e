//! Pixel Formulas
//!
//! A formula is a small arithmetic expression over the arguments `x1..xN`
//! whose function calls are dispatched through a [`Registry`]. It is parsed
//! once and then evaluated for every pixel.
//!
//! ```text
//! toon(x1, 4) * vingette(x1, x2, x3)
//! alpha(x1, 6.28, 0, 2) + _0.5          ; _0.5 is the imaginary literal 0.5i
//! ```
//!
//! Semicolons are ignored and the text is lower-cased before parsing, so
//! function names are matched in lower case.

mod parser;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::numeric::Numeric;
use crate::registry::{CallError, Registry, SymbolSource};
use parser::{BinOp, Expr, Parser};

#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected {found} at position {position}, expected {expected}")]
    Unexpected {
        position: usize,
        found: String,
        expected: &'static str,
    },

    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber { position: usize, text: String },

    #[error("unknown name '{name}' at position {position}: not a variable and not followed by '('")]
    UnknownIdentifier { position: usize, name: String },

    #[error("invalid variable '{name}' at position {position}: variables start at x1")]
    InvalidVariable { position: usize, name: String },

    #[error("function '{name}' at position {position} called with {count} arguments (max 4)")]
    TooManyArguments {
        position: usize,
        name: String,
        count: usize,
    },

    #[error("formula nested deeper than {limit} levels at position {position}")]
    TooDeep { position: usize, limit: usize },

    #[error("number of variables must be positive, got {0}")]
    InvalidArity(usize),

    #[error("formula uses x{index} but only {nvar} variables are defined")]
    VariableOutOfRange { index: usize, nvar: usize },

    #[error("x{index} referenced but only {provided} arguments given")]
    MissingArgument { index: usize, provided: usize },

    #[error("imaginary literals are not available in the {domain} domain")]
    ImaginaryUnsupported { domain: &'static str },

    #[error("error calling {arity} argument function {name}: {source}")]
    Call {
        name: String,
        arity: usize,
        #[source]
        source: CallError,
    },
}

/// A parsed formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    arity: usize,
}

impl Formula {
    /// Parse formula text
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let source = text.replace(';', "").to_lowercase();
        if source.trim().is_empty() {
            return Err(FormulaError::Empty);
        }

        let expr = Parser::new(&source)?.parse()?;
        let arity = expr.arity();
        Ok(Self {
            source,
            expr,
            arity,
        })
    }

    /// Normalized source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Highest variable index used (`x3` → 3), 0 for a constant formula
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Distinct `(name, arity)` pairs called, in order of first appearance
    pub fn functions(&self) -> Vec<(&str, usize)> {
        let mut found: Vec<(&str, usize)> = Vec::new();
        self.expr.visit_calls(&mut |name, arity| {
            if !found.contains(&(name, arity)) {
                found.push((name, arity));
            }
        });
        found
    }

    /// Check the formula against `nvar` variables.
    ///
    /// Evaluates once with all arguments zero so that every function it calls
    /// is resolved, and cached, before the first real evaluation.
    pub fn check<T, S>(&self, registry: &mut Registry<T, S>, nvar: usize) -> Result<(), FormulaError>
    where
        T: Numeric,
        S: SymbolSource,
    {
        if nvar < 1 {
            return Err(FormulaError::InvalidArity(nvar));
        }
        if self.arity > nvar {
            return Err(FormulaError::VariableOutOfRange {
                index: self.arity,
                nvar,
            });
        }

        let zeros = vec![T::zero(); nvar];
        self.eval(registry, &zeros).map(|_| ())
    }

    /// Evaluate with `args` bound to `x1..`
    pub fn eval<T, S>(&self, registry: &mut Registry<T, S>, args: &[T]) -> Result<T, FormulaError>
    where
        T: Numeric,
        S: SymbolSource,
    {
        eval_expr(&self.expr, registry, args)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval_expr<T, S>(expr: &Expr, registry: &mut Registry<T, S>, args: &[T]) -> Result<T, FormulaError>
where
    T: Numeric,
    S: SymbolSource,
{
    match expr {
        Expr::Number(v) => Ok(T::from_real(*v)),
        Expr::Imaginary(v) => {
            T::imaginary(*v).ok_or(FormulaError::ImaginaryUnsupported { domain: T::DOMAIN })
        }
        Expr::Var(index) => {
            args.get(index - 1)
                .copied()
                .ok_or(FormulaError::MissingArgument {
                    index: *index,
                    provided: args.len(),
                })
        }
        Expr::Neg(inner) => Ok(-eval_expr(inner, registry, args)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, registry, args)?;
            let rhs = eval_expr(rhs, registry, args)?;
            Ok(match op {
                BinOp::Add => lhs + rhs,
                BinOp::Sub => lhs - rhs,
                BinOp::Mul => lhs * rhs,
                BinOp::Div => lhs / rhs,
                BinOp::Pow => lhs.pow(rhs),
            })
        }
        Expr::Call { name, args: params } => {
            let mut values = [T::zero(); 4];
            for (slot, param) in values.iter_mut().zip(params) {
                *slot = eval_expr(param, registry, args)?;
            }
            let [a, b, c, d] = values;
            let outcome = match params.len() {
                1 => registry.call1(name, a),
                2 => registry.call2(name, a, b),
                3 => registry.call3(name, a, b, c),
                _ => registry.call4(name, a, b, c, d),
            };
            outcome.into_result().map_err(|source| FormulaError::Call {
                name: name.clone(),
                arity: params.len(),
                source,
            })
        }
    }
}
