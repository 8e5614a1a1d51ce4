// Remote dali configuration update
//
// Downloads the signed dali config document, and when the signature checks
// out, brings `dali.ini` in line with it and restarts the forwarding service.
// The staged download is removed whatever the outcome.

use crate::device_config::{DaliTarget, apply_dali_target};
use crate::error::{Error, Result};
use crate::fetch::{cleanup_staged, fetch_all};
use crate::settings::MssSettings;
use crate::signature::verify_trusted;
use crate::update::UpdateContext;
use crate::utils::{success, with_suffix};
use serde::Deserialize;
use std::path::Path;

/// What a config update run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdateOutcome {
    /// The document or its signature could not be downloaded
    NotDownloaded,
    /// The signature was not accepted, nothing was applied
    Untrusted,
    /// The local configuration already matched
    Unchanged,
    /// `dali.ini` was rewritten and the service restarted
    Updated,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

/// The signed config document served by the update server
#[derive(Debug, Deserialize)]
struct RemoteDaliConfig {
    dali_host: String,
    dali_port: PortValue,
}

impl RemoteDaliConfig {
    fn into_target(self) -> Result<DaliTarget> {
        let port = match self.dali_port {
            PortValue::Number(port) => port,
            PortValue::Text(text) => text.trim().parse().map_err(|_| Error::InvalidValue {
                section: "remote".to_string(),
                key: "dali_port".to_string(),
                value: text,
            })?,
        };
        Ok(DaliTarget {
            host: self.dali_host.trim().to_string(),
            port,
        })
    }
}

fn read_remote_config(path: &Path) -> Result<DaliTarget> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let remote: RemoteDaliConfig =
        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
    remote.into_target()
}

/// Download, verify and apply the remote dali configuration
pub fn run_config_update(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
) -> Result<ConfigUpdateOutcome> {
    let url = settings.remote_url(&settings.dali_config_name);
    let sig_url = format!("{url}.sig");
    let staged = settings.update_dir.join(&settings.dali_config_name);
    let staged_sig = with_suffix(&staged, ".sig");

    let files = [
        (url.as_str(), staged.as_path()),
        (sig_url.as_str(), staged_sig.as_path()),
    ];
    let result = fetch_and_apply(settings, ctx, &files);

    let cleanup = cleanup_staged(&[staged.as_path(), staged_sig.as_path()]);
    let outcome = result?;
    cleanup?;

    log::info!("Config update finished: {outcome:?}");
    Ok(outcome)
}

fn fetch_and_apply(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
    files: &[(&str, &Path); 2],
) -> Result<ConfigUpdateOutcome> {
    if !fetch_all(ctx.fetcher, files)? {
        return Ok(ConfigUpdateOutcome::NotDownloaded);
    }
    let [(_, staged), (_, staged_sig)] = files;
    apply_staged_config(settings, ctx, staged, staged_sig)
}

fn apply_staged_config(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
    staged: &Path,
    staged_sig: &Path,
) -> Result<ConfigUpdateOutcome> {
    if !verify_trusted(ctx.verifier, staged_sig, &settings.signer_identity)? {
        return Ok(ConfigUpdateOutcome::Untrusted);
    }

    let target = read_remote_config(staged)?;
    if !apply_dali_target(&settings.dali_ini, &target)? {
        return Ok(ConfigUpdateOutcome::Unchanged);
    }

    ctx.system.restart_service(&settings.dali_service)?;
    success("Restarted the service.");

    Ok(ConfigUpdateOutcome::Updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DaliTarget> {
        let remote: RemoteDaliConfig = serde_json::from_str(json).unwrap();
        remote.into_target()
    }

    #[test]
    fn test_numeric_port() {
        let target = parse(r#"{ "dali_host": "5.6.7.8", "dali_port": 18000 }"#).unwrap();
        assert_eq!(
            target,
            DaliTarget {
                host: "5.6.7.8".to_string(),
                port: 18000
            }
        );
    }

    #[test]
    fn test_string_port() {
        let target = parse(r#"{ "dali_host": "5.6.7.8", "dali_port": "16000" }"#).unwrap();
        assert_eq!(target.port, 16000);
    }

    #[test]
    fn test_invalid_port() {
        let result = parse(r#"{ "dali_host": "5.6.7.8", "dali_port": "dali" }"#);
        assert!(matches!(result, Err(Error::InvalidValue { .. })));
    }
}
