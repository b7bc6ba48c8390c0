use std::path::{Path, PathBuf};

use anyhow::Context;
use cropchain_server::ServerConfig;
use cropchain_state::JournalSync;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub ledger: LedgerConfig,
    pub server: ServerConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub sync: JournalSync,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".cropchain/ledger.journal"),
            sync: JournalSync::default(),
        }
    }
}

impl CliConfig {
    /// Load `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
