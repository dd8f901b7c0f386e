//! Dynamic Function Registry
//!
//! Resolves functions exported by a plugin library by name, caches the
//! resolved addresses per arity, and dispatches calls with 1-4 arguments.
//!
//! # Architecture
//!
//! ```text
//! Formula evaluator / host
//!       │
//!       ▼
//! registry.call2("toon", x, n)
//!       │
//!       ▼
//! Registry (open? → arity-2 cache lookup)
//!       │ miss
//!       ▼
//! SymbolSource::resolve (libloading)
//!       │
//!       ▼
//! Invoke<2> (native call)
//! ```
//!
//! Every failure comes back as a [`Status`] alongside a zero value, never a
//! panic: calling before [`Registry::open`] yields [`Status::NotOpen`], a
//! missing export yields [`Status::SymbolNotFound`], and a new name arriving
//! at a full table yields [`Status::CacheFull`].
//!
//! # Example
//!
//! ```ignore
//! use pixcall::{ComplexRegistry, Numeric};
//! use num_complex::Complex64;
//!
//! let mut registry = ComplexRegistry::new();
//! registry.open("libpixcall_kernel.so", 128)?;
//!
//! let x = Complex64::from_real(0.73);
//! let levels = Complex64::from_real(4.0);
//! let value = registry.call2("toon", x, levels).into_result()?;
//! ```

mod cache;
mod dispatch;
mod loader;
mod types;

pub use cache::{ArityCache, CacheEntry, CacheFull, Caches, Symbol, Table};
pub use dispatch::{ComplexRegistry, RealRegistry, Registry};
pub use loader::{
    default_search_paths, find_library, library_filename, DynamicLibrary, RawSymbol, SymbolSource,
};
pub use types::{CallError, OpenError, Outcome, Status, MAX_ARITY};
