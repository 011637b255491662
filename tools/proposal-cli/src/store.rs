//! Config and state files

use anyhow::{bail, Context, Result};
use governance::{Governance, GovernanceConfig, Ledger, SlotRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub type Engine = Governance<SlotRegistry>;

/// Contents of the TOML config file
///
/// ```toml
/// genesis_treasury = 1000000000
///
/// [governance]
/// num_slots = 256
/// time_unit_secs = 86400
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Treasury balance minted by `init` when none is given
    pub genesis_treasury: u64,
    pub governance: GovernanceConfig,
}

impl CliConfig {
    /// Load `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: CliConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .governance
            .validate()
            .with_context(|| format!("Invalid governance section in {}", path.display()))?;
        Ok(config)
    }
}

/// Create a fresh state file
pub fn init_state(path: &Path, config: GovernanceConfig, treasury: u64, force: bool) -> Result<Engine> {
    if path.exists() && !force {
        bail!(
            "State file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let engine = Governance::new(config, Ledger::with_treasury(treasury), SlotRegistry::new())
        .context("Invalid governance configuration")?;
    save_state(&engine, path)?;
    log::info!("Initialised {} with treasury {}", path.display(), treasury);
    Ok(engine)
}

pub fn load_state(path: &Path) -> Result<Engine> {
    if !path.exists() {
        bail!(
            "State file {} not found (run `proposal-cli init` first)",
            path.display()
        );
    }
    Governance::load(path).with_context(|| format!("Failed to load state {}", path.display()))
}

pub fn save_state(engine: &Engine, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    engine
        .save(path)
        .with_context(|| format!("Failed to save state {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance::SlotOwnership;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.governance.num_slots, 256);
    }

    #[test]
    fn test_config_with_governance_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proposal-cli.toml");
        fs::write(
            &path,
            "genesis_treasury = 5000\n\n[governance]\nnum_slots = 4\ntime_unit_secs = 120\n",
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.genesis_treasury, 5000);
        assert_eq!(config.governance.num_slots, 4);
        assert_eq!(config.governance.approval_pct, 10);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proposal-cli.toml");
        fs::write(&path, "[governance]\nnum_slots = 0\n").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut engine = init_state(&path, GovernanceConfig::default(), 1_000, false).unwrap();
        engine.slots_mut().assign(7, "alice");
        save_state(&engine, &path).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.treasury_balance(), 1_000);
        assert_eq!(loaded.slots().owner_of(7), Some("alice"));

        assert!(init_state(&path, GovernanceConfig::default(), 1, false).is_err());
        assert!(init_state(&path, GovernanceConfig::default(), 1, true).is_ok());
    }

    #[test]
    fn test_load_missing_state() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_state(&dir.path().join("state.json")).unwrap_err();
        assert!(err.to_string().contains("init"));
    }
}
