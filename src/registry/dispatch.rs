//! Registry lifecycle and call dispatch

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use num_complex::Complex64;
use tracing::{debug, info, warn};

use super::cache::{Caches, Symbol, Table};
use super::loader::{DynamicLibrary, SymbolSource};
use super::types::{CallError, OpenError, Outcome};
use crate::numeric::{Invoke, Numeric};

/// Registry over the complex-valued kernel lineage
pub type ComplexRegistry = Registry<Complex64>;

/// Registry over the real-valued kernel lineage
pub type RealRegistry = Registry<f64>;

/// An open library together with its four arity tables
struct Session<S> {
    source: S,
    caches: Caches,
    capacity: usize,
    path: Option<PathBuf>,
}

/// Loads one plugin library and dispatches calls into it by name.
///
/// Starts closed. [`open`](Self::open) moves it to open, [`close`](Self::close)
/// (or dropping it) back to closed. Each resolved name is cached per arity for
/// as long as the library stays open and is never resolved again.
///
/// Not thread safe; wrap the whole registry in a lock if it must be shared.
pub struct Registry<T, S = DynamicLibrary> {
    session: Option<Session<S>>,
    _domain: PhantomData<fn(T) -> T>,
}

impl<T: Numeric, S: SymbolSource> Registry<T, S> {
    /// Create a closed registry
    pub fn new() -> Self {
        Self {
            session: None,
            _domain: PhantomData,
        }
    }

    /// Load the library at `path` with room for `capacity` names per arity.
    ///
    /// An already open library is closed first. On error the registry is
    /// left closed.
    pub fn open(&mut self, path: impl AsRef<Path>, capacity: usize) -> Result<(), OpenError> {
        self.close();

        let path = path.as_ref();
        if capacity < 1 {
            return Err(OpenError::CapacityInvalid(capacity));
        }
        let source = S::load(path)?;
        self.install(source, capacity, Some(path.to_path_buf()))
    }

    /// Like [`open`](Self::open), but with a source that is already loaded
    pub fn open_with(&mut self, source: S, capacity: usize) -> Result<(), OpenError> {
        self.close();

        if capacity < 1 {
            return Err(OpenError::CapacityInvalid(capacity));
        }
        self.install(source, capacity, None)
    }

    fn install(
        &mut self,
        source: S,
        capacity: usize,
        path: Option<PathBuf>,
    ) -> Result<(), OpenError> {
        // `source` is dropped, and the library closed, if allocation fails
        let caches = Caches::with_capacity(capacity)
            .map_err(|source| OpenError::AllocationFailed { capacity, source })?;

        info!(
            path = ?path,
            capacity,
            domain = T::DOMAIN,
            "function library opened"
        );
        self.session = Some(Session {
            source,
            caches,
            capacity,
            path,
        });
        Ok(())
    }

    /// Release the library and forget every cached name. No-op when closed.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!(path = ?session.path, "function library closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Per-arity table capacity, if open
    pub fn capacity(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.capacity)
    }

    /// Path the open library was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().and_then(|s| s.path.as_deref())
    }

    /// Number of names cached for `arity` (zero when closed)
    pub fn cached(&self, arity: usize) -> usize {
        self.session.as_ref().map_or(0, |s| s.caches.len(arity))
    }

    /// Call `name` with `N` arguments.
    ///
    /// Resolves the name on first use and serves it from the arity-`N` table
    /// afterwards. A name that would not fit in a full table is refused
    /// without being resolved or called.
    pub fn call<const N: usize>(&mut self, name: &str, args: [T; N]) -> Outcome<T>
    where
        Caches: Table<N>,
        T: Invoke<N>,
    {
        let Some(session) = self.session.as_mut() else {
            warn!(function = name, args = ?args, "call {}: library not open", N);
            return Outcome::failure(CallError::NotOpen);
        };

        let table = Table::<N>::table_mut(&mut session.caches);
        let symbol = match table.lookup(name) {
            Some(symbol) => symbol,
            None => {
                if table.is_full() {
                    warn!(function = name, args = ?args, "call {}: function table full", N);
                    return Outcome::failure(CallError::CacheFull);
                }
                let Some(raw) = session.source.resolve(name) else {
                    warn!(function = name, args = ?args, "call {}: function not found", N);
                    return Outcome::failure(CallError::SymbolNotFound);
                };

                let symbol = Symbol::<N>::new(raw);
                if let Err(full) = table.insert(name, symbol) {
                    warn!(function = name, error = %full, "call {}: function table full", N);
                    return Outcome::failure(CallError::CacheFull);
                }
                debug!(function = name, arity = N, cached = table.len(), "function resolved");
                symbol
            }
        };

        // Safety: `symbol` came from the still-open library and was resolved
        // for arity N. That the export really takes N domain values is the
        // plugin's contract.
        let value = unsafe { <T as Invoke<N>>::invoke(symbol, args) };
        Outcome::success(value)
    }

    /// Call a one-argument function
    pub fn call1(&mut self, name: &str, a: T) -> Outcome<T> {
        self.call(name, [a])
    }

    /// Call a two-argument function
    pub fn call2(&mut self, name: &str, a: T, b: T) -> Outcome<T> {
        self.call(name, [a, b])
    }

    /// Call a three-argument function
    pub fn call3(&mut self, name: &str, a: T, b: T, c: T) -> Outcome<T> {
        self.call(name, [a, b, c])
    }

    /// Call a four-argument function
    pub fn call4(&mut self, name: &str, a: T, b: T, c: T, d: T) -> Outcome<T> {
        self.call(name, [a, b, c, d])
    }
}

impl<T: Numeric, S: SymbolSource> Default for Registry<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Drop for Registry<T, S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(path = ?session.path, "function library released on drop");
        }
    }
}
