// Settings shared by the MSS maintenance tools
//
// Every path, URL and service name the tools touch lives here. The defaults
// describe a production MSS; a JSON file can override any subset of fields.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_DIR: &str = "/home/mss/config";
const DEFAULT_UPDATE_DIR: &str = "/home/mss/update";
const DEFAULT_MSEED_DIR: &str = "/home/mss/mseed";
const DEFAULT_REMOTE_BASE_URL: &str = "http://www.macroseismicsensor.at/msn_config/";
const DEFAULT_SIGNER_IDENTITY: &str = "mss@mertl-research.at";
const DEFAULT_MSEED_RETENTION_SECS: u64 = 120;

/// Configuration for every MSS maintenance entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MssSettings {
    /// INI file holding the `[pcb]` section (hardware revision)
    pub record_ini: PathBuf,

    /// INI file holding the `[dali]` section (forwarding target)
    pub dali_ini: PathBuf,

    /// Single-line file with the device serial number
    pub serial_file: PathBuf,

    /// Staging directory for downloaded update files
    pub update_dir: PathBuf,

    /// Base URL of the update server, must end with '/'
    pub remote_base_url: String,

    /// Name of the signed dali config document on the update server
    pub dali_config_name: String,

    /// Name of the signed software manifest on the update server
    pub software_manifest_name: String,

    /// Identity string that must appear in the gpg output
    pub signer_identity: String,

    /// Upper bound of the random start delay of the updaters
    pub jitter_max_secs: u64,

    /// Timeout for connecting and for the response headers of a download,
    /// the body transfer itself is not bounded
    pub http_timeout_secs: u64,

    /// Directory -> maximum file age in seconds
    pub retention: BTreeMap<PathBuf, u64>,

    pub hotspot_service: String,
    pub dali_service: String,
    pub recorder_service: String,

    /// GPIO character device the button is wired to
    pub gpio_chip: PathBuf,

    /// Presses closer together than this are treated as bounce
    pub button_debounce_ms: u64,

    /// Data forwarding daemon started by `mss-start-dali`
    pub dali_binary: PathBuf,

    /// Scan interval passed to the forwarding daemon with `-s`
    pub dali_scan_interval_secs: u32,
}

impl Default for MssSettings {
    fn default() -> Self {
        let config_dir = Path::new(DEFAULT_CONFIG_DIR);
        Self {
            record_ini: config_dir.join("mss_record.ini"),
            dali_ini: config_dir.join("dali.ini"),
            serial_file: config_dir.join("mss_serial"),
            update_dir: PathBuf::from(DEFAULT_UPDATE_DIR),
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            dali_config_name: "dali_config.json".to_string(),
            software_manifest_name: "mssrecord_update.json".to_string(),
            signer_identity: DEFAULT_SIGNER_IDENTITY.to_string(),
            jitter_max_secs: 60,
            http_timeout_secs: 120,
            retention: BTreeMap::from([(
                PathBuf::from(DEFAULT_MSEED_DIR),
                DEFAULT_MSEED_RETENTION_SECS,
            )]),
            hotspot_service: "hostapd.service".to_string(),
            dali_service: "mseedscan2dali.service".to_string(),
            recorder_service: "mss_record.service".to_string(),
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            button_debounce_ms: 100,
            dali_binary: PathBuf::from("/usr/bin/mseedscan2dali"),
            dali_scan_interval_secs: 5,
        }
    }
}

impl MssSettings {
    /// Load settings, applying the overrides in `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Self = serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded settings from {}", path.display());

        Ok(settings)
    }

    /// URL of a file published on the update server
    pub fn remote_url(&self, name: &str) -> String {
        if self.remote_base_url.ends_with('/') {
            format!("{}{name}", self.remote_base_url)
        } else {
            format!("{}/{name}", self.remote_base_url)
        }
    }
}
