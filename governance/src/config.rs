//! Governance parameters
//!
//! Fixed when the engine is constructed. Period lengths are counted in
//! time units of `time_unit_secs` seconds.
//!
//! Example `governance.toml`:
//!
//! ```toml
//! num_slots = 256
//! approval_pct = 10
//! contest_pct = -10
//! treasury_limit_pct = 2
//! initial_period = 7
//! contest_period = 7
//! min_period_length = 3
//! history_periods = 128
//! time_unit_secs = 86400
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GovernanceError, Result};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Number of voting slots per ballot
    pub num_slots: u32,

    /// Minimum vote difference (percent) for acceptance
    pub approval_pct: i8,

    /// Vote difference (percent) at or below which an accepted proposal is contested
    pub contest_pct: i8,

    /// Share of the treasury (percent) a single proposal may reserve
    pub treasury_limit_pct: u8,

    /// Voting time before the first decision, in time units
    pub initial_period: u64,

    /// Length of a contest, in time units
    pub contest_period: u64,

    /// Shortest allowed budget period, in time units
    pub min_period_length: u64,

    /// Entries kept in each proposal's voting history
    pub history_periods: u32,

    /// Seconds per time unit
    pub time_unit_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            num_slots: 256,
            approval_pct: 10,
            contest_pct: -10,
            treasury_limit_pct: 2,
            initial_period: 7,
            contest_period: 7,
            min_period_length: 3,
            history_periods: 128,
            time_unit_secs: 86_400,
        }
    }
}

impl GovernanceConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GovernanceConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_slots == 0 {
            return Err(invalid("num_slots must be positive"));
        }
        if self.time_unit_secs == 0 {
            return Err(invalid("time_unit_secs must be positive"));
        }
        if self.history_periods == 0 {
            return Err(invalid("history_periods must be positive"));
        }
        if self.min_period_length == 0 {
            return Err(invalid("min_period_length must be positive"));
        }
        for (name, pct) in [("approval_pct", self.approval_pct), ("contest_pct", self.contest_pct)] {
            if !(-100..=100).contains(&pct) {
                return Err(invalid(&format!("{} must be within [-100, 100], got {}", name, pct)));
            }
        }
        if self.contest_pct >= self.approval_pct {
            return Err(invalid(&format!(
                "contest_pct ({}) must be below approval_pct ({})",
                self.contest_pct, self.approval_pct
            )));
        }
        if self.treasury_limit_pct > 100 {
            return Err(invalid(&format!(
                "treasury_limit_pct must be at most 100, got {}",
                self.treasury_limit_pct
            )));
        }
        Ok(())
    }

    pub fn initial_period_secs(&self) -> u64 {
        self.initial_period.saturating_mul(self.time_unit_secs)
    }

    pub fn contest_period_secs(&self) -> u64 {
        self.contest_period.saturating_mul(self.time_unit_secs)
    }

    /// Threshold the rejection helper drives the vote difference down to
    pub fn rejection_threshold(&self) -> i64 {
        (self.contest_pct as i64).min(self.approval_pct as i64 - 1)
    }
}

fn invalid(message: &str) -> GovernanceError {
    GovernanceError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_period_secs(), 7 * 86_400);
        assert_eq!(config.rejection_threshold(), -10);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = GovernanceConfig::from_toml_str(
            r#"
            num_slots = 4
            contest_pct = -100
            time_unit_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.num_slots, 4);
        assert_eq!(config.contest_pct, -100);
        assert_eq!(config.approval_pct, 10);
        assert_eq!(config.contest_period_secs(), 7 * 120);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = GovernanceConfig::from_toml_str("approval_pct = 5\ncontest_pct = 5").unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(GovernanceConfig::from_toml_str("approval_pct = 101").is_err());
        assert!(GovernanceConfig::from_toml_str("treasury_limit_pct = 150").is_err());
        assert!(GovernanceConfig::from_toml_str("num_slots = 0").is_err());
        assert!(GovernanceConfig::from_toml_str("time_unit_secs = 0").is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = GovernanceConfig::from_toml_str("num_slots = \"many\"").unwrap_err();
        assert!(matches!(err, GovernanceError::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("governance.toml");
        fs::write(&path, "num_slots = 8\nhistory_periods = 35\n").unwrap();

        let config = GovernanceConfig::load(&path).unwrap();
        assert_eq!(config.num_slots, 8);
        assert_eq!(config.history_periods, 35);
    }
}
