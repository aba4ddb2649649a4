/// Harness configuration loading from a JSON file
use crate::config::presets::{NumbersPreset, SplitPreset, StrtokPreset};
use crate::config::types::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Limits applied to every isolated child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationConfig {
    /// Wall-clock budget for one correctness invocation
    pub wall_timeout_ms: u64,
    /// Wall-clock budget for one timing run (all trials)
    pub timing_timeout_ms: u64,
    /// Delay between SIGTERM and SIGKILL on timeout
    pub kill_grace_ms: u64,
    /// Address space the child may map beyond what it inherits, in bytes
    pub address_space_limit: Option<u64>,
    /// RLIMIT_CPU for the child, in seconds
    pub cpu_time_limit_secs: Option<u64>,
    /// Capacity of the result slot the child writes into
    pub result_slot_bytes: usize,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            wall_timeout_ms: 5_000,
            timing_timeout_ms: 120_000,
            kill_grace_ms: 200,
            address_space_limit: Some(4 * 1024 * 1024 * 1024),
            cpu_time_limit_secs: Some(180),
            result_slot_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Memory-safety auditor toolchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub enabled: bool,
    pub compiler: String,
    pub compiler_args: Vec<String>,
    pub detector: String,
    pub detector_args: Vec<String>,
    /// Directory where the linked driver executable is placed
    pub artifact_dir: PathBuf,
    /// Wall-clock budget for each of the compile and detector steps
    #[serde(default = "default_audit_timeout")]
    pub timeout_secs: u64,
}

fn default_audit_timeout() -> u64 {
    300
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            compiler: "gcc".to_string(),
            compiler_args: vec!["--std=c99".to_string(), "-O3".to_string()],
            detector: "valgrind".to_string(),
            detector_args: vec![
                "--quiet".to_string(),
                "--verbose".to_string(),
                "--leak-check=full".to_string(),
                "--show-leak-kinds=all".to_string(),
                "--track-origins=yes".to_string(),
                "--error-exitcode=1".to_string(),
            ],
            artifact_dir: std::env::temp_dir().join("gamejudge-audit"),
            timeout_secs: default_audit_timeout(),
        }
    }
}

/// One K-factor tier: applies when the rating is strictly above `above`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFactorTier {
    pub above: f64,
    pub k: f64,
}

/// Rating aggregator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Tiers checked in descending `above` order
    pub tiers: Vec<KFactorTier>,
    /// K used when no tier matches
    pub base_k: f64,
    /// Logistic scale (rating difference giving 10:1 odds)
    pub scale: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                KFactorTier {
                    above: 2400.0,
                    k: 10.0,
                },
                KFactorTier {
                    above: 1800.0,
                    k: 20.0,
                },
            ],
            base_k: 40.0,
            scale: 400.0,
        }
    }
}

/// Full configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub isolation: IsolationConfig,
    #[serde(default)]
    pub numbers: NumbersPreset,
    #[serde(default)]
    pub split: SplitPreset,
    #[serde(default)]
    pub strtok: StrtokPreset,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub rating: RatingConfig,
}

impl HarnessConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| HarnessError::Config(format!("Failed to parse config JSON: {}", e)))
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
