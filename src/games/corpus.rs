use crate::config::types::{HarnessError, Result};
use std::path::Path;

/// Read a corpus file and join its lines with terminators (`\n`, `\r\n`)
/// removed
pub fn load_concatenated(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HarnessError::Corpus(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(content.lines().collect())
}

/// Expand a `{n}` file pattern for the 1-based case `number`
pub fn case_file_name(pattern: &str, number: usize) -> String {
    pattern.replace("{n}", &number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn joins_lines_without_terminators() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first line\r\nsecond\nthird").unwrap();
        assert_eq!(
            load_concatenated(file.path()).unwrap(),
            "first linesecondthird"
        );
    }

    #[test]
    fn missing_file_is_a_corpus_error() {
        let err = load_concatenated(Path::new("/nonexistent/test_1.txt")).unwrap_err();
        assert!(matches!(err, HarnessError::Corpus(_)));
    }

    #[test]
    fn expands_case_number() {
        assert_eq!(case_file_name("test_{n}.txt", 7), "test_7.txt");
    }
}
