//! # elements-ct
//!
//! Confidential transaction primitives for Elements and Liquid.
//!
//! This crate builds, blinds, unblinds and signs Elements transactions in
//! pure Rust on top of `secp256k1-zkp`. It also carries the Schnorr and ECDSA
//! adaptor signature utilities used by swap protocols.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elements_ct::{init, CtConfig, ConfidentialTransaction};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init(&CtConfig::default())?;
//!
//!     let tx = ConfidentialTransaction::new(2, 0)?;
//!     println!("{}", tx.hex());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture Overview
//!
//! - [`transaction`]: the mutable transaction container
//! - [`blind`]: commitments, range proofs and surjection proofs for outputs and issuances
//! - [`unblind`]: rewinding range proofs with a blinding key
//! - [`issuance`]: asset ids, reissuance tokens and issuance blinding keys
//! - [`sighash`]: per-input signature hashes
//! - [`transaction_signer`]: ECDSA signing and multisig aggregation
//! - [`schnorr`] and [`adaptor`]: standalone signature schemes
//! - [`primitives`]: Elements consensus encoding
//!
//! ## Error Handling
//!
//! All public APIs return [`Result<T, CtError>`](error::CtError).

/// Implements the byte-reversed hex conventions shared by 32-byte
/// identifiers (txids, asset ids, blinding factors).
macro_rules! impl_reversed_hex {
    ($name:ident) => {
        impl $name {
            pub fn from_slice(bytes: &[u8]) -> $crate::Result<Self> {
                let array: [u8; 32] = bytes.try_into().map_err(|_| {
                    $crate::CtError::IllegalArgument(format!(
                        "{} must be 32 bytes, got {}",
                        stringify!($name),
                        bytes.len()
                    ))
                })?;
                Ok($name(array))
            }

            /// Internal (serialization) byte order.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_bytes(&self) -> [u8; 32] {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut reversed = self.0;
                reversed.reverse();
                f.write_str(&hex::encode(reversed))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::CtError;

            fn from_str(s: &str) -> $crate::Result<Self> {
                let mut bytes = hex::decode(s)?;
                bytes.reverse();
                $name::from_slice(&bytes)
            }
        }
    };
}

/// Fixed-length byte strings exchanged as plain hex.
macro_rules! impl_fixed_hex {
    ($name:ident, $len:expr) => {
        impl $name {
            pub fn from_slice(bytes: &[u8]) -> $crate::Result<Self> {
                let array: [u8; $len] = bytes.try_into().map_err(|_| {
                    $crate::CtError::IllegalArgument(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok($name(array))
            }

            pub fn from_hex(s: &str) -> $crate::Result<Self> {
                $name::from_slice(&hex::decode(s)?)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::CtError;

            fn from_str(s: &str) -> $crate::Result<Self> {
                $name::from_hex(s)
            }
        }
    };
}

pub mod error;
pub mod keys;
pub mod primitives;
pub mod types;
pub mod utils;

pub mod adaptor;
pub mod blind;
pub mod issuance;
pub mod schnorr;
pub mod sighash;
pub mod transaction;
pub mod transaction_signer;
pub mod unblind;

pub use error::{CtError, Result};
pub use transaction::ConfidentialTransaction;
pub use types::{BlindOptions, CtConfig};

/// Initializes the library.
///
/// Installs `env_logger` at the configured level. A logger installed
/// earlier stays in place.
pub fn init(config: &CtConfig) -> Result<()> {
    if !utils::logging::init_logging(config.log_level) {
        log::debug!("logger already installed");
    }
    log::info!("elements-ct initialized with config: {:?}", config);
    Ok(())
}
