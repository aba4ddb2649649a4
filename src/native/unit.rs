/// Code units: the places entry points are resolved from
use crate::kernel::dylib::DynamicLibrary;
use crate::native::shapes::{CallShape, EntryPoint, IntPairFn, SplitFn, TokenizeFn};
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;

/// A loaded unit of native code that exports symbols by name
pub trait CodeUnit {
    /// Human-readable origin, for logs
    fn describe(&self) -> String;

    /// Raw address of `symbol`, or `None` when absent
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>>;

    /// Resolve `symbol` and bind it to `shape`
    fn entry(&self, symbol: &str, shape: CallShape) -> Option<EntryPoint> {
        self.resolve(symbol)
            .map(|address| EntryPoint::bind(symbol, shape, address))
    }
}

impl CodeUnit for DynamicLibrary {
    fn describe(&self) -> String {
        self.path().display().to_string()
    }

    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        self.symbol(symbol)
    }
}

/// Code unit backed by functions linked into the host binary.
///
/// Used for the host's reference routines and for exercising the harness
/// without building shared objects.
#[derive(Debug, Default)]
pub struct StaticCodeUnit {
    name: String,
    symbols: HashMap<String, NonNull<c_void>>,
}

impl StaticCodeUnit {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            symbols: HashMap::new(),
        }
    }

    fn with_address(mut self, symbol: &str, address: *mut c_void) -> Self {
        if let Some(address) = NonNull::new(address) {
            self.symbols.insert(symbol.to_string(), address);
        }
        self
    }

    pub fn with_int_pair(self, symbol: &str, f: IntPairFn) -> Self {
        self.with_address(symbol, f as *mut c_void)
    }

    pub fn with_split(self, symbol: &str, f: SplitFn) -> Self {
        self.with_address(symbol, f as *mut c_void)
    }

    pub fn with_tokenize(self, symbol: &str, f: TokenizeFn) -> Self {
        self.with_address(symbol, f as *mut c_void)
    }
}

impl CodeUnit for StaticCodeUnit {
    fn describe(&self) -> String {
        format!("static:{}", self.name)
    }

    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        self.symbols.get(symbol).copied()
    }
}
