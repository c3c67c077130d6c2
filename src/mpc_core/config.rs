//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! party_index = 1
//! party_count = 3
//! batch_size = 4096
//! open_value_threshold = 100000
//! receive_timeout_ms = 5000
//! dealer_seed = 42
//! ```
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use serde::Deserialize;

pub const DEFAULT_BATCH_SIZE: usize = 4096;
pub const DEFAULT_OPEN_VALUE_THRESHOLD: usize = 100_000;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_open_value_threshold() -> usize {
    DEFAULT_OPEN_VALUE_THRESHOLD
}

/// The configuration of one party.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// 1-based index of the local party.
    pub party_index: usize,
    pub party_count: usize,
    /// Maximum number of native protocols evaluated together.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// A MAC check runs after a batch once more opened values than this are unchecked.
    #[serde(default = "default_open_value_threshold")]
    pub open_value_threshold: usize,
    #[serde(default)]
    pub receive_timeout_ms: Option<u64>,
    /// Seed of the dealer that simulates preprocessing. Must be the same for all parties.
    #[serde(default)]
    pub dealer_seed: u64,
}

impl EngineConfig {
    pub fn new(party_index: usize, party_count: usize) -> Self {
        Self {
            party_index,
            party_count,
            batch_size: DEFAULT_BATCH_SIZE,
            open_value_threshold: DEFAULT_OPEN_VALUE_THRESHOLD,
            receive_timeout_ms: None,
            dealer_seed: 0,
        }
    }

    /// Loads the [EngineConfig] from a file.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let file_content = fs::read_to_string(path)?;
        Self::from_toml_str(&file_content)
    }

    pub fn from_toml_str(content: &str) -> io::Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|ser| io::Error::new(io::ErrorKind::InvalidData, format!("{}", ser)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.party_count < 2 {
            return Err(invalid_data(format!(
                "Invalid party_count: {}; at least 2 parties are required",
                self.party_count
            )));
        }
        // check party index is valid 1 <= party_index <= party_count
        if self.party_index < 1 || self.party_index > self.party_count {
            return Err(invalid_data(format!(
                "Invalid party_index: {}; must be 1 <= party_index <= {}",
                self.party_index, self.party_count
            )));
        }
        if self.batch_size == 0 {
            return Err(invalid_data("Invalid batch_size: must be positive".to_string()));
        }
        Ok(())
    }

    /// 0-based id of the local party.
    pub fn party_id(&self) -> usize {
        self.party_index - 1
    }

    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
