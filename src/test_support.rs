//! Shared test doubles

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::registry::{OpenError, RawSymbol, SymbolSource};

/// In-process export table that counts every resolution request.
///
/// Clones share the same table and counter, so a test can keep one handle
/// while the registry owns another.
#[derive(Clone, Default)]
pub(crate) struct FakeLibrary {
    exports: Rc<RefCell<HashMap<String, RawSymbol>>>,
    resolutions: Rc<Cell<usize>>,
}

impl FakeLibrary {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn export(&self, name: &str, addr: *const ()) -> &Self {
        let raw = RawSymbol::from_ptr(addr).unwrap();
        self.exports.borrow_mut().insert(name.to_string(), raw);
        self
    }

    pub(crate) fn resolutions(&self) -> usize {
        self.resolutions.get()
    }
}

impl SymbolSource for FakeLibrary {
    fn load(path: &Path) -> Result<Self, OpenError> {
        Err(OpenError::LibraryLoadFailed {
            path: path.to_path_buf(),
            reason: "no such plugin".to_string(),
        })
    }

    fn resolve(&self, name: &str) -> Option<RawSymbol> {
        self.resolutions.set(self.resolutions.get() + 1);
        self.exports.borrow().get(name).copied()
    }
}
