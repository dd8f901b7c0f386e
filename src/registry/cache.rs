//! Arity Caches
//!
//! One fixed-capacity table per arity maps a function name to its resolved
//! address. Tables only grow: there is no eviction and no removal, and a
//! full table rejects new names instead of replacing old ones. Lookup is a
//! linear scan, which is fine for the tens of names a formula set uses.

use std::collections::TryReserveError;
use std::marker::PhantomData;

use thiserror::Error;

use super::RawSymbol;

/// A resolved address tagged with the number of arguments it is called with.
#[derive(Debug, PartialEq, Eq)]
pub struct Symbol<const N: usize> {
    raw: RawSymbol,
    _arity: PhantomData<[(); N]>,
}

impl<const N: usize> Clone for Symbol<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<const N: usize> Copy for Symbol<N> {}

impl<const N: usize> Symbol<N> {
    pub fn new(raw: RawSymbol) -> Self {
        Self {
            raw,
            _arity: PhantomData,
        }
    }

    pub fn raw(&self) -> RawSymbol {
        self.raw
    }
}

/// A cached name and the address it resolved to
#[derive(Debug, Clone)]
pub struct CacheEntry<const N: usize> {
    name: Box<str>,
    symbol: Symbol<N>,
}

impl<const N: usize> CacheEntry<N> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Insertion into a table that already holds `capacity` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("arity-{arity} function table full ({capacity} entries)")]
pub struct CacheFull {
    pub arity: usize,
    pub capacity: usize,
}

/// Name → address table for functions called with `N` arguments
#[derive(Debug)]
pub struct ArityCache<const N: usize> {
    capacity: usize,
    entries: Vec<CacheEntry<N>>,
}

impl<const N: usize> ArityCache<N> {
    /// Allocate an empty table with room for `capacity` entries up front
    pub fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity)?;
        Ok(Self { capacity, entries })
    }

    /// Find the address cached for `name` (exact, case-sensitive match)
    pub fn lookup(&self, name: &str) -> Option<Symbol<N>> {
        self.entries
            .iter()
            .find(|entry| &*entry.name == name)
            .map(|entry| entry.symbol)
    }

    /// Append an entry.
    ///
    /// Does not check for duplicates; callers look up before inserting.
    pub fn insert(&mut self, name: &str, symbol: Symbol<N>) -> Result<(), CacheFull> {
        if self.is_full() {
            return Err(CacheFull {
                arity: N,
                capacity: self.capacity,
            });
        }
        self.entries.push(CacheEntry {
            name: name.into(),
            symbol,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached entries in insertion order
    pub fn entries(&self) -> &[CacheEntry<N>] {
        &self.entries
    }
}

/// The four arity tables of one open library
#[derive(Debug)]
pub struct Caches {
    one: ArityCache<1>,
    two: ArityCache<2>,
    three: ArityCache<3>,
    four: ArityCache<4>,
}

impl Caches {
    /// Allocate all four tables at `capacity`
    pub fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        Ok(Self {
            one: ArityCache::with_capacity(capacity)?,
            two: ArityCache::with_capacity(capacity)?,
            three: ArityCache::with_capacity(capacity)?,
            four: ArityCache::with_capacity(capacity)?,
        })
    }

    /// Number of entries cached for `arity`; zero for unsupported arities
    pub fn len(&self, arity: usize) -> usize {
        match arity {
            1 => self.one.len(),
            2 => self.two.len(),
            3 => self.three.len(),
            4 => self.four.len(),
            _ => 0,
        }
    }
}

/// Selects the table for arity `N` out of [`Caches`]
pub trait Table<const N: usize> {
    fn table(&self) -> &ArityCache<N>;
    fn table_mut(&mut self) -> &mut ArityCache<N>;
}

macro_rules! impl_table {
    ($n:literal, $field:ident) => {
        impl Table<$n> for Caches {
            fn table(&self) -> &ArityCache<$n> {
                &self.$field
            }

            fn table_mut(&mut self) -> &mut ArityCache<$n> {
                &mut self.$field
            }
        }
    };
}

impl_table!(1, one);
impl_table!(2, two);
impl_table!(3, three);
impl_table!(4, four);
