use crate::config::types::{HarnessError, Result};

/// Split `text` on every occurrence of `delimiter`, keeping empty fields.
///
/// The delimiter travels to player code as a single C `char`, so it must be
/// a non-NUL ASCII character.
pub fn split_fields(text: &str, delimiter: char) -> Result<Vec<String>> {
    if delimiter == '\0' {
        return Err(HarnessError::InvalidTestCase(
            "split delimiter must not be NUL".to_string(),
        ));
    }
    if !delimiter.is_ascii() {
        return Err(HarnessError::InvalidTestCase(format!(
            "split delimiter {:?} is not a single byte",
            delimiter
        )));
    }
    Ok(text.split(delimiter).map(str::to_string).collect())
}
