//! Shared logic of the MSS maintenance tools.
//!
//! The binaries in `cron-scripts` and `dali` are thin wrappers around the
//! entry points exported here:
//!
//! - [`retention::sweep`] deletes recordings older than the retention window
//! - [`config_update::run_config_update`] applies the signed dali config
//! - [`software_update::run_software_update`] installs signed packages
//! - [`device_config`] reads and updates the INI files of the device
//!
//! Network, gpg and privileged commands sit behind the [`fetch::Fetcher`],
//! [`signature::SignatureVerifier`] and [`system::SystemControl`] traits.

pub mod config_update;
pub mod device_config;
mod error;
pub mod fetch;
pub mod jitter;
pub mod retention;
pub mod settings;
pub mod signature;
pub mod software_update;
pub mod system;
pub mod update;
pub mod utils;

pub use error::{Error, Result};
pub use settings::MssSettings;
pub use update::UpdateContext;
