//! DocVault Core — configuration, data paths, error taxonomy.

pub mod config;
pub mod error;

pub use config::{DataPaths, DocVaultConfig};
pub use error::{Error, Result};
