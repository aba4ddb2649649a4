use crate::config::types::{HarnessError, Result};
use crate::kernel::dylib::DynamicLibrary;
use crate::native::shapes::{self, CallArgs, CallOutput, CallShape, EntryPoint};
use crate::native::unit::CodeUnit;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

/// One player's code unit with its required entry points resolved.
///
/// Tokenizer state lives inside the callee, so at most one [`TokenCursor`]
/// session may be in flight per submission. The owner of that session is
/// tracked here and any other cursor trying to resume is refused.
///
/// [`TokenCursor`]: crate::native::TokenCursor
pub struct Submission {
    id: String,
    unit: Box<dyn CodeUnit>,
    entries: HashMap<String, EntryPoint>,
    active_cursor: Cell<Option<u64>>,
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("id", &self.id)
            .field("unit", &self.unit.describe())
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Submission {
    /// Open the shared object at `path` and resolve every required symbol
    pub fn load(id: &str, path: &Path, required: &[(&str, CallShape)]) -> Result<Self> {
        let library = DynamicLibrary::open(path)?;
        Self::from_unit(id, Box::new(library), required)
    }

    /// Resolve every required symbol from an already loaded unit
    pub fn from_unit(
        id: &str,
        unit: Box<dyn CodeUnit>,
        required: &[(&str, CallShape)],
    ) -> Result<Self> {
        let mut entries = HashMap::new();
        for (symbol, shape) in required {
            let entry = unit
                .entry(symbol, *shape)
                .ok_or_else(|| HarnessError::SymbolNotFound(symbol.to_string()))?;
            entries.insert(symbol.to_string(), entry);
        }

        log::debug!(
            "Submission '{}' bound {} entry point(s) from {}",
            id,
            entries.len(),
            unit.describe()
        );

        Ok(Self {
            id: id.to_string(),
            unit,
            entries,
            active_cursor: Cell::new(None),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> String {
        self.unit.describe()
    }

    pub fn entry(&self, symbol: &str) -> Result<&EntryPoint> {
        self.entries
            .get(symbol)
            .ok_or_else(|| HarnessError::SymbolNotFound(symbol.to_string()))
    }

    /// Call `symbol` with `args`.
    ///
    /// A tokenize call on a fresh cursor claims the submission's tokenizer
    /// state; resuming any cursor other than the current owner is an error.
    pub fn invoke(&self, symbol: &str, args: CallArgs<'_>) -> Result<CallOutput> {
        let entry = self.entry(symbol)?;

        if let CallArgs::Tokenize { cursor, .. } = &args {
            if entry.shape() == CallShape::Tokenize {
                if !cursor.is_started() {
                    self.active_cursor.set(Some(cursor.id()));
                } else if self.active_cursor.get() != Some(cursor.id()) {
                    return Err(HarnessError::Cursor(format!(
                        "cursor {} resumed while {} owns the tokenizer state of '{}'",
                        cursor.id(),
                        self.active_cursor
                            .get()
                            .map(|id| format!("cursor {}", id))
                            .unwrap_or_else(|| "no cursor".to_string()),
                        self.id
                    )));
                }
            }
        }

        shapes::invoke(entry, args)
    }
}

/// Player id derived from a library path: the file stem, with a leading
/// `lib` prefix stripped (`libs/libalice.so` → `alice`).
pub fn player_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_prefix("lib") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}
