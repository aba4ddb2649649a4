use crate::config::types::{HarnessError, Result};
use std::ffi::c_char;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CURSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Host-owned tokenization session over one input string.
///
/// The buffer is NUL-terminated and owned here, so it stays alive (and
/// writable by the callee) for as long as the session. The first call of a
/// session hands the callee the buffer; every later call hands it null so the
/// callee resumes from its own saved position.
#[derive(Debug)]
pub struct TokenCursor {
    id: u64,
    buffer: Vec<u8>,
    started: bool,
    exhausted: bool,
    calls: usize,
}

impl TokenCursor {
    pub fn new(text: &[u8]) -> Result<Self> {
        if text.contains(&0) {
            return Err(HarnessError::Cursor(
                "tokenizer input contains an interior NUL byte".to_string(),
            ));
        }
        let mut buffer = Vec::with_capacity(text.len() + 1);
        buffer.extend_from_slice(text);
        buffer.push(0);

        Ok(Self {
            id: NEXT_CURSOR_ID.fetch_add(1, Ordering::Relaxed),
            buffer,
            started: false,
            exhausted: false,
            calls: 0,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True once the callee returned null
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Input length, terminator excluded
    pub fn input_len(&self) -> usize {
        self.buffer.len() - 1
    }

    pub(crate) fn next_argument(&mut self) -> *mut c_char {
        if self.started {
            std::ptr::null_mut()
        } else {
            self.started = true;
            self.buffer.as_mut_ptr() as *mut c_char
        }
    }

    pub(crate) fn record(&mut self, produced_token: bool) {
        self.calls += 1;
        if !produced_token {
            self.exhausted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_argument_is_buffer_then_null() {
        let mut cursor = TokenCursor::new(b"a b").unwrap();
        assert!(!cursor.is_started());

        let first = cursor.next_argument();
        assert!(!first.is_null());
        assert!(cursor.is_started());
        assert!(cursor.next_argument().is_null());
    }

    #[test]
    fn ids_are_unique() {
        let a = TokenCursor::new(b"x").unwrap();
        let b = TokenCursor::new(b"x").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn exhaustion_is_recorded_on_null_token() {
        let mut cursor = TokenCursor::new(b"").unwrap();
        cursor.record(true);
        assert!(!cursor.is_exhausted());
        cursor.record(false);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.calls(), 2);
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(matches!(
            TokenCursor::new(b"a\0b"),
            Err(HarnessError::Cursor(_))
        ));
    }
}
