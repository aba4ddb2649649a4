// Config validation
// Configuration is validated once at startup; errors are fatal, warnings are logged.

use crate::config::harness::HarnessConfig;
use crate::config::types::{HarnessError, Result};
use std::path::Path;

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validate config at startup. Any error fails the whole configuration.
pub fn validate_config(config: &HarnessConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_isolation(config, &mut result);
    validate_games(config, &mut result);
    validate_rating(config, &mut result);
    validate_audit(config, &mut result);

    if !result.is_valid() {
        return Err(HarnessError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_isolation(config: &HarnessConfig, result: &mut ValidationResult) {
    let iso = &config.isolation;

    if iso.wall_timeout_ms == 0 {
        result.add_error("isolation.wall_timeout_ms cannot be zero".to_string());
    }
    if iso.timing_timeout_ms == 0 {
        result.add_error("isolation.timing_timeout_ms cannot be zero".to_string());
    }
    if iso.timing_timeout_ms < iso.wall_timeout_ms {
        result.add_warning(format!(
            "isolation.timing_timeout_ms ({}) is below wall_timeout_ms ({}); timing runs may be cut short",
            iso.timing_timeout_ms, iso.wall_timeout_ms
        ));
    }
    if iso.result_slot_bytes < 64 {
        result.add_error(format!(
            "isolation.result_slot_bytes ({}) is too small to hold a result",
            iso.result_slot_bytes
        ));
    }
    if let Some(limit) = iso.address_space_limit {
        if limit < 64 * 1024 * 1024 {
            result.add_warning(format!(
                "isolation.address_space_limit {} is very low (< 64MB), children may fail to start",
                limit
            ));
        }
    }
    if iso.cpu_time_limit_secs == Some(0) {
        result.add_error("isolation.cpu_time_limit_secs cannot be zero".to_string());
    }
}

fn validate_games(config: &HarnessConfig, result: &mut ValidationResult) {
    let numbers = &config.numbers;
    if numbers.min_border < 1 {
        result.add_error(format!(
            "numbers.min_border must be >= 1, got {}",
            numbers.min_border
        ));
    }
    if numbers.min_border > numbers.max_border {
        result.add_error(format!(
            "numbers.min_border ({}) must be <= numbers.max_border ({})",
            numbers.min_border, numbers.max_border
        ));
    }
    if numbers.max_border > 22 {
        result.add_warning(format!(
            "numbers.max_border {} may produce answers that overflow a C int",
            numbers.max_border
        ));
    }

    for (game, timing) in [
        ("numbers", &config.numbers.timing),
        ("split", &config.split.timing),
        ("strtok", &config.strtok.timing),
    ] {
        if timing.repeats == 0 {
            result.add_error(format!("{game}.timing.repeats cannot be zero"));
        }
        if timing.input_multiplier == 0 {
            result.add_error(format!("{game}.timing.input_multiplier cannot be zero"));
        }
    }

    if config.split.delimiters.is_empty() {
        result.add_error("split.delimiters cannot be empty".to_string());
    }
    for (index, delimiter) in config.split.delimiters.iter().enumerate() {
        if *delimiter == '\0' || !delimiter.is_ascii() {
            result.add_error(format!(
                "split.delimiters[{index}] must be a non-NUL ASCII character, got {:?}",
                delimiter
            ));
        }
    }
    if !config.split.file_pattern.contains("{n}") {
        result.add_error(format!(
            "split.file_pattern must contain '{{n}}': {}",
            config.split.file_pattern
        ));
    }

    if config.strtok.delimiters.is_empty() {
        result.add_warning("strtok.delimiters is empty; every corpus is a single token".to_string());
    }
    if config.strtok.delimiters.contains('\0') {
        result.add_error("strtok.delimiters cannot contain NUL".to_string());
    }

    for (game, symbol) in [
        ("numbers", &config.numbers.symbol),
        ("split", &config.split.symbol),
        ("strtok", &config.strtok.symbol),
    ] {
        if symbol.is_empty() || symbol.contains('\0') {
            result.add_error(format!("{game}.symbol must be a non-empty C identifier"));
        }
    }
}

fn validate_rating(config: &HarnessConfig, result: &mut ValidationResult) {
    let rating = &config.rating;
    if rating.scale <= 0.0 {
        result.add_error(format!("rating.scale must be positive, got {}", rating.scale));
    }
    if rating.base_k <= 0.0 {
        result.add_error(format!("rating.base_k must be positive, got {}", rating.base_k));
    }
    for pair in rating.tiers.windows(2) {
        if pair[0].above <= pair[1].above {
            result.add_error(format!(
                "rating.tiers must be sorted by descending threshold ({} then {})",
                pair[0].above, pair[1].above
            ));
        }
    }
    if rating.tiers.iter().any(|tier| tier.k <= 0.0) {
        result.add_error("rating.tiers K-factors must be positive".to_string());
    }
}

fn validate_audit(config: &HarnessConfig, result: &mut ValidationResult) {
    if !config.audit.enabled {
        return;
    }
    if !config.audit.artifact_dir.is_absolute() {
        result.add_error(format!(
            "audit.artifact_dir must be an absolute path: {:?}",
            config.audit.artifact_dir
        ));
    }
    if config.audit.timeout_secs == 0 {
        result.add_error("audit.timeout_secs must be positive".to_string());
    }
    for tool in [&config.audit.compiler, &config.audit.detector] {
        if resolve_in_path(tool).is_none() {
            result.add_warning(format!(
                "audit tool '{}' not found in PATH; leak checks will report could-not-run",
                tool
            ));
        }
    }
}

/// Resolve a tool name the way `execvp` would
pub fn resolve_in_path(tool: &str) -> Option<std::path::PathBuf> {
    if tool.contains('/') {
        let path = Path::new(tool);
        return path.is_file().then(|| path.to_path_buf());
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::harness::KFactorTier;

    #[test]
    fn test_valid_default_config() {
        let config = HarnessConfig::default();
        let result = validate_config(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_zero_wall_timeout() {
        let mut config = HarnessConfig::default();
        config.isolation.wall_timeout_ms = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("wall_timeout_ms cannot be zero"));
    }

    #[test]
    fn test_inverted_numbers_borders() {
        let mut config = HarnessConfig::default();
        config.numbers.min_border = 10;
        config.numbers.max_border = 3;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("min_border (10)"));
    }

    #[test]
    fn test_zero_repeats_rejected() {
        let mut config = HarnessConfig::default();
        config.strtok.timing.repeats = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("strtok.timing.repeats"));
    }

    #[test]
    fn test_nul_split_delimiter_rejected() {
        let mut config = HarnessConfig::default();
        config.split.delimiters[3] = '\0';

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("split.delimiters[3]"));
    }

    #[test]
    fn test_unsorted_rating_tiers_rejected() {
        let mut config = HarnessConfig::default();
        config.rating.tiers = vec![
            KFactorTier {
                above: 1800.0,
                k: 20.0,
            },
            KFactorTier {
                above: 2400.0,
                k: 10.0,
            },
        ];

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("descending"));
    }

    #[test]
    fn test_wide_borders_only_warn() {
        let mut config = HarnessConfig::default();
        config.numbers.max_border = 30;

        let result = validate_config(&config).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("overflow")));
    }

    #[test]
    fn test_missing_audit_tool_is_a_warning() {
        let mut config = HarnessConfig::default();
        config.audit.enabled = true;
        config.audit.compiler = "/nonexistent/cc".to_string();

        let result = validate_config(&config).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("/nonexistent/cc")));
    }

    #[test]
    fn test_resolve_in_path_finds_sh() {
        assert!(resolve_in_path("sh").is_some());
        assert!(resolve_in_path("definitely-not-a-real-tool-xyz").is_none());
    }
}
