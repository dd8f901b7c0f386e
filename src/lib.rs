//! Pixcall - Dynamic Function Registry
//!
//! Loads a plugin library at runtime and calls its exported numeric functions
//! by name. Resolved addresses are cached per arity (1-4 arguments), so a
//! function used once per pixel is looked up only on its first call.
//!
//! # Features
//!
//! - **Per-arity caches**: bounded tables, first resolution wins
//! - **Status codes**: every call reports `Success`, `NotOpen`, `CacheFull` or
//!   `SymbolNotFound` instead of panicking
//! - **Two numeric domains**: `Complex64` (C99 `double complex`) and `f64`
//! - **Formulas**: `toon(x1, 4) * vingette(x1, x2, x3)` parsed once, evaluated
//!   many times through the registry
//!
//! # Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use pixcall::{ComplexRegistry, Formula, Numeric};
//!
//! // Formulas without function calls need no library
//! let mut registry = ComplexRegistry::new();
//! let formula = Formula::parse("x1 * 2 + _1").unwrap();
//! let value = formula.eval(&mut registry, &[Complex64::from_real(3.0)]).unwrap();
//!
//! assert_eq!(value, Complex64::new(6.0, 1.0));
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Formula       │  parsed once per run
//! └────────┬────────┘
//!          │ call1..call4
//!          ▼
//! ┌─────────────────┐
//! │   Registry      │  per-arity caches, status codes
//! └────────┬────────┘
//!          │ first call of a name
//!          ▼
//! ┌─────────────────┐
//! │ Plugin library  │  libloading
//! └─────────────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod formula;
pub mod numeric;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, Domain, LibraryConfig, PixcallConfig};
pub use formula::{Formula, FormulaError};
pub use numeric::{Invoke, Numeric};
pub use registry::{
    CallError, ComplexRegistry, DynamicLibrary, OpenError, Outcome, RawSymbol, RealRegistry,
    Registry, Status, SymbolSource, MAX_ARITY,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
