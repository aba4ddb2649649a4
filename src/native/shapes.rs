//! Call shapes: the fixed C signatures a submission may export, and the
//! marshalling between host values and those signatures.

use crate::config::types::{HarnessError, Result};
use crate::native::cursor::TokenCursor;
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, c_int, c_void, CStr};
use std::fmt;
use std::ptr::NonNull;

/// `int f(int, int)`
pub type IntPairFn = unsafe extern "C" fn(c_int, c_int) -> c_int;
/// `int f(const char *string, char **matrix, char symbol)`
pub type SplitFn = unsafe extern "C" fn(*const c_char, *mut *mut c_char, c_char) -> c_int;
/// `char *f(char *string, const char *delim)`
pub type TokenizeFn = unsafe extern "C" fn(*mut c_char, *const c_char) -> *mut c_char;

/// Closed set of supported calling conventions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    IntPair,
    Split,
    Tokenize,
}

impl CallShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IntPair => "int_pair",
            Self::Split => "split",
            Self::Tokenize => "tokenize",
        }
    }

    /// C prototype, for diagnostics
    pub fn prototype(self) -> &'static str {
        match self {
            Self::IntPair => "int (int, int)",
            Self::Split => "int (const char *, char **, char)",
            Self::Tokenize => "char *(char *, const char *)",
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved symbol bound to the shape it is called with
#[derive(Clone, Debug)]
pub struct EntryPoint {
    symbol: String,
    shape: CallShape,
    address: NonNull<c_void>,
}

impl EntryPoint {
    pub fn bind(symbol: &str, shape: CallShape, address: NonNull<c_void>) -> Self {
        Self {
            symbol: symbol.to_string(),
            shape,
            address,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }
}

/// Output matrix handed to split submissions as `char **`.
///
/// All rows live in one zeroed allocation that never reallocates, so the
/// pointer table stays valid for the matrix lifetime. Large matrices are
/// only backed by memory where the callee actually writes.
pub struct FieldMatrix {
    cells: Vec<u8>,
    width: usize,
    pointers: Vec<*mut c_char>,
}

impl FieldMatrix {
    pub fn new(row_count: usize, row_capacity: usize) -> Self {
        let width = row_capacity.max(1);
        let mut cells = vec![0u8; row_count * width];
        let base = cells.as_mut_ptr();
        let pointers = (0..row_count)
            // in bounds: row * width < cells.len()
            .map(|row| unsafe { base.add(row * width) } as *mut c_char)
            .collect();
        Self {
            cells,
            width,
            pointers,
        }
    }

    /// Sized from the input alone. Splitting `input_len` bytes gives at most
    /// `input_len + 1` fields of at most `input_len` bytes, so whatever count
    /// a submission reports, its fields fit and the answer is compared
    /// rather than crashing the caller.
    pub fn for_input(input_len: usize) -> Self {
        Self::new(input_len + 2, input_len + 1)
    }

    pub fn row_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn row_capacity(&self) -> usize {
        self.width
    }

    /// Zero every row in place
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Row contents up to the first NUL (whole row when unterminated)
    pub fn field(&self, index: usize) -> Option<&[u8]> {
        if index >= self.row_count() {
            return None;
        }
        let row = &self.cells[index * self.width..(index + 1) * self.width];
        let end = row.iter().position(|b| *b == 0).unwrap_or(row.len());
        Some(&row[..end])
    }

    /// First `count` rows, clamped to the matrix height
    pub fn fields(&self, count: usize) -> Vec<Vec<u8>> {
        (0..count.min(self.row_count()))
            .filter_map(|index| self.field(index).map(<[u8]>::to_vec))
            .collect()
    }

    fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.pointers.as_mut_ptr()
    }
}

/// Host-side arguments for one native call
pub enum CallArgs<'a> {
    IntPair {
        first: i32,
        second: i32,
    },
    Split {
        input: &'a CStr,
        fields: &'a mut FieldMatrix,
        delimiter: u8,
    },
    Tokenize {
        cursor: &'a mut TokenCursor,
        delimiters: &'a CStr,
    },
}

impl CallArgs<'_> {
    pub fn shape(&self) -> CallShape {
        match self {
            Self::IntPair { .. } => CallShape::IntPair,
            Self::Split { .. } => CallShape::Split,
            Self::Tokenize { .. } => CallShape::Tokenize,
        }
    }
}

/// Host-side view of a native call's return value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutput {
    Int(i32),
    /// Value returned by a split call: the number of fields written
    FieldCount(i32),
    /// Bytes of the returned token, `None` for a null pointer
    Token(Option<Vec<u8>>),
}

/// Invoke `entry` with `args`.
///
/// The only check performed is that the argument shape matches the shape the
/// entry point was bound with. What the callee does with the arguments is
/// the concern of the isolation runner, not of this function.
pub fn invoke(entry: &EntryPoint, args: CallArgs<'_>) -> Result<CallOutput> {
    if args.shape() != entry.shape {
        return Err(HarnessError::AbiMismatch {
            symbol: entry.symbol.clone(),
            expected: args.shape().to_string(),
            actual: entry.shape.to_string(),
        });
    }

    let address = entry.address.as_ptr();
    match args {
        CallArgs::IntPair { first, second } => {
            let f: IntPairFn = unsafe { std::mem::transmute::<*mut c_void, IntPairFn>(address) };
            Ok(CallOutput::Int(unsafe { f(first, second) }))
        }
        CallArgs::Split {
            input,
            fields,
            delimiter,
        } => {
            let f: SplitFn = unsafe { std::mem::transmute::<*mut c_void, SplitFn>(address) };
            let count = unsafe { f(input.as_ptr(), fields.as_mut_ptr(), delimiter as c_char) };
            Ok(CallOutput::FieldCount(count))
        }
        CallArgs::Tokenize { cursor, delimiters } => {
            let f: TokenizeFn =
                unsafe { std::mem::transmute::<*mut c_void, TokenizeFn>(address) };
            let returned = unsafe { f(cursor.next_argument(), delimiters.as_ptr()) };
            let token = if returned.is_null() {
                None
            } else {
                Some(unsafe { CStr::from_ptr(returned) }.to_bytes().to_vec())
            };
            cursor.record(token.is_some());
            Ok(CallOutput::Token(token))
        }
    }
}
