use serde::{Deserialize, Serialize};

pub use crate::utils::logging::LogLevel;

/// Library configuration passed to [`crate::init`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CtConfig {
    /// Log level; `RUST_LOG` applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub blind: BlindOptions,
}

/// Range proof parameters used when blinding outputs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BlindOptions {
    /// Smallest value the range proof covers
    pub minimum_range_value: u64,
    /// Base-10 exponent; 0 proves the exact value
    pub exponent: i32,
    /// Number of mantissa bits proven
    pub minimum_bits: u8,
}

impl Default for BlindOptions {
    fn default() -> Self {
        Self {
            minimum_range_value: 1,
            exponent: 0,
            minimum_bits: 52,
        }
    }
}
