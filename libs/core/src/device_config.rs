// INI-backed device configuration
//
// Two files are involved: `mss_record.ini` carries the `[pcb]` section with
// the hardware revision, `dali.ini` carries the `[dali]` forwarding target.

use crate::error::{Error, Result};
use crate::utils::with_suffix;
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::path::{Path, PathBuf};

const PCB_SECTION: &str = "pcb";
const DALI_SECTION: &str = "dali";

/// Load an INI file, mapping parse and IO failures to [`Error`]
///
/// Values are kept as written: backslashes and quotes are not interpreted.
pub fn load_ini(path: &Path) -> Result<Ini> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    Ini::load_from_file_opt(path, opt).map_err(|source| Error::Ini {
        path: path.to_path_buf(),
        source,
    })
}

fn write_ini(ini: &Ini, path: &Path) -> Result<()> {
    let opt = WriteOption {
        escape_policy: EscapePolicy::Nothing,
        kv_separator: " = ",
        ..WriteOption::default()
    };
    ini.write_to_file_opt(path, opt).map_err(|e| Error::io(path, e))
}

/// Replace the value of an existing key without moving it within its section
fn replace_value(ini: &mut Ini, section: &str, key: &str, value: &str) -> bool {
    let Some(properties) = ini.section_mut(Some(section)) else {
        return false;
    };
    match properties.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
        Some((_, current)) => {
            *current = value.to_string();
            true
        }
        None => false,
    }
}

fn get_value(ini: &Ini, path: &Path, section: &str, key: &str) -> Result<String> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(|v| v.trim().to_string())
        .ok_or_else(|| Error::MissingKey {
            path: path.to_path_buf(),
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn parse_number<T: std::str::FromStr>(section: &str, key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Read the PCB hardware revision (`[pcb] pcb_version`)
pub fn read_pcb_version(path: &Path) -> Result<u32> {
    let ini = load_ini(path)?;
    let value = get_value(&ini, path, PCB_SECTION, "pcb_version")?;
    parse_number(PCB_SECTION, "pcb_version", &value)
}

/// The `[dali]` section of `dali.ini`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaliConfig {
    pub host: String,
    pub port: u16,
    pub mseed_dir: PathBuf,
}

impl DaliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let ini = load_ini(path)?;
        let host = get_value(&ini, path, DALI_SECTION, "host")?;
        let port = get_value(&ini, path, DALI_SECTION, "port")?;
        let mseed_dir = get_value(&ini, path, DALI_SECTION, "mseed_dir")?;

        Ok(Self {
            host,
            port: parse_number(DALI_SECTION, "port", &port)?,
            mseed_dir: PathBuf::from(mseed_dir),
        })
    }

    /// `host:port` as expected by the forwarding daemon
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Forwarding target published by the update server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaliTarget {
    pub host: String,
    pub port: u16,
}

/// Bring `[dali] host` and `[dali] port` in line with `target`
///
/// Only the fields that differ are written. When something changed the
/// previous file is renamed to `<name>.old` (replacing an older backup) and
/// the updated content is written in its place. Returns whether the file
/// changed; an unchanged file is not touched at all.
pub fn apply_dali_target(path: &Path, target: &DaliTarget) -> Result<bool> {
    let mut ini = load_ini(path)?;

    let current_host = get_value(&ini, path, DALI_SECTION, "host")?;
    let current_port = get_value(&ini, path, DALI_SECTION, "port")?;
    let new_port = target.port.to_string();

    let mut changed = false;
    if current_host != target.host {
        log::info!("dali host changed: {current_host} -> {}", target.host);
        changed |= replace_value(&mut ini, DALI_SECTION, "host", &target.host);
    }
    if current_port.parse::<u16>().ok() != Some(target.port) {
        log::info!("dali port changed: {current_port} -> {new_port}");
        changed |= replace_value(&mut ini, DALI_SECTION, "port", &new_port);
    }

    if !changed {
        log::debug!("{} is up to date", path.display());
        return Ok(false);
    }

    let backup = backup_path(path);
    std::fs::rename(path, &backup).map_err(|e| Error::io(path, e))?;
    write_ini(&ini, path)?;
    log::debug!("Previous configuration kept as {}", backup.display());

    Ok(true)
}

/// `dali.ini` -> `dali.ini.old`
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".old")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DALI_INI: &str = "[dali]\nhost = 1.2.3.4\nport = 18000\nmseed_dir = /home/mss/mseed\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_pcb_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "mss_record.ini", "[pcb]\npcb_version = 2 \n");
        assert_eq!(read_pcb_version(&path).unwrap(), 2);
    }

    #[test]
    fn test_read_pcb_version_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "mss_record.ini", "[pcb]\npcb_version = two\n");
        assert!(matches!(
            read_pcb_version(&path),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_section_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "mss_record.ini", "[other]\nkey = 1\n");
        let err = read_pcb_version(&path).unwrap_err();
        assert!(err.to_string().contains("[pcb] pcb_version"));
    }

    #[test]
    fn test_load_dali_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dali.ini", DALI_INI);
        let config = DaliConfig::load(&path).unwrap();

        assert_eq!(config.host, "1.2.3.4");
        assert_eq!(config.port, 18000);
        assert_eq!(config.mseed_dir, Path::new("/home/mss/mseed"));
        assert_eq!(config.server_address(), "1.2.3.4:18000");
    }

    #[test]
    fn test_unchanged_target_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dali.ini", DALI_INI);
        let target = DaliTarget {
            host: "1.2.3.4".to_string(),
            port: 18000,
        };

        assert!(!apply_dali_target(&path, &target).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DALI_INI);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_changed_host_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dali.ini", DALI_INI);
        let target = DaliTarget {
            host: "5.6.7.8".to_string(),
            port: 18000,
        };

        assert!(apply_dali_target(&path, &target).unwrap());
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), DALI_INI);

        let updated = DaliConfig::load(&path).unwrap();
        assert_eq!(updated.host, "5.6.7.8");
        assert_eq!(updated.port, 18000);
        assert_eq!(updated.mseed_dir, Path::new("/home/mss/mseed"));
    }

    #[test]
    fn test_backup_keeps_single_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "dali.ini", DALI_INI);
        write_file(dir.path(), "dali.ini.old", "stale");

        let target = DaliTarget {
            host: "1.2.3.4".to_string(),
            port: 16000,
        };
        assert!(apply_dali_target(&path, &target).unwrap());

        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), DALI_INI);
        assert_eq!(DaliConfig::load(&path).unwrap().port, 16000);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_untouched_values_survive_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let original = "[dali]\nhost = 1.2.3.4\nport = 18000\nmseed_dir = C:\\data\\mseed\n\n\
                        [other]\nx = \"quoted\"\n";
        let path = write_file(dir.path(), "dali.ini", original);
        let target = DaliTarget {
            host: "5.6.7.8".to_string(),
            port: 18000,
        };

        assert!(apply_dali_target(&path, &target).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            original.replace("1.2.3.4", "5.6.7.8")
        );
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let original = "[dali]\nHost = 1.2.3.4\nPORT = 18000\nmseed_dir = /home/mss/mseed\n";
        let path = write_file(dir.path(), "dali.ini", original);

        let config = DaliConfig::load(&path).unwrap();
        assert_eq!(config.server_address(), "1.2.3.4:18000");

        let target = DaliTarget {
            host: "1.2.3.4".to_string(),
            port: 16000,
        };
        assert!(apply_dali_target(&path, &target).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[dali]\nHost = 1.2.3.4\nPORT = 16000\nmseed_dir = /home/mss/mseed\n"
        );
    }
}
