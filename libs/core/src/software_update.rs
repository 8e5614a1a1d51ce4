// Remote software update
//
// The update server publishes a signed manifest naming the recorders that
// should update and the Debian packages to install. Every package is fetched,
// verified and installed on its own; a failure skips that package only.

use crate::error::{Error, Result};
use crate::fetch::{cleanup_staged, fetch_all};
use crate::settings::MssSettings;
use crate::signature::verify_trusted;
use crate::update::UpdateContext;
use crate::utils::{info, success, warning, with_suffix};
use serde::Deserialize;
use std::path::Path;

/// Who the manifest is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    /// A single string, only `all` (any case) selects devices
    Keyword(String),
    /// Explicit serial numbers
    Serials(Vec<String>),
}

impl Recipients {
    pub fn includes(&self, serial: &str) -> bool {
        match self {
            Self::Keyword(keyword) => keyword.eq_ignore_ascii_case("all"),
            Self::Serials(serials) => serials.iter().any(|s| s == serial),
        }
    }
}

/// The signed software manifest
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateManifest {
    #[serde(rename = "recorders")]
    pub recipients: Recipients,
    #[serde(rename = "filename")]
    pub packages: Vec<String>,
}

/// What happened to the packages of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftwareUpdateReport {
    /// The manifest and its signature were downloaded
    pub manifest_downloaded: bool,
    /// The manifest signature was accepted
    pub manifest_trusted: bool,
    /// This device is among the manifest recipients
    pub applicable: bool,
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Read the device serial, the first line of the serial file
pub fn read_serial(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(content.lines().next().unwrap_or_default().trim().to_string())
}

fn read_manifest(path: &Path) -> Result<UpdateManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Package names end up in URLs and staging paths, keep them to one plain
/// path component
fn check_package_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');
    if plain {
        Ok(())
    } else {
        Err(Error::UnsafeFileName(name.to_string()))
    }
}

/// Download, verify and install the packages of the remote manifest
pub fn run_software_update(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
) -> Result<SoftwareUpdateReport> {
    let url = settings.remote_url(&settings.software_manifest_name);
    let sig_url = format!("{url}.sig");
    let staged = settings.update_dir.join(&settings.software_manifest_name);
    let staged_sig = with_suffix(&staged, ".sig");

    let files = [
        (url.as_str(), staged.as_path()),
        (sig_url.as_str(), staged_sig.as_path()),
    ];
    let result = fetch_and_apply(settings, ctx, &files);

    let cleanup = cleanup_staged(&[staged.as_path(), staged_sig.as_path()]);
    let report = result?;
    cleanup?;

    log::info!(
        "Software update finished: {} installed, {} skipped, {} failed",
        report.installed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

fn fetch_and_apply(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
    files: &[(&str, &Path); 2],
) -> Result<SoftwareUpdateReport> {
    let mut report = SoftwareUpdateReport::default();
    if !fetch_all(ctx.fetcher, files)? {
        return Ok(report);
    }
    report.manifest_downloaded = true;

    let serial = read_serial(&settings.serial_file)?;
    let [(_, staged), (_, staged_sig)] = files;
    if !verify_trusted(ctx.verifier, staged_sig, &settings.signer_identity)? {
        return Ok(report);
    }
    report.manifest_trusted = true;

    let manifest = read_manifest(staged)?;
    if !manifest.recipients.includes(&serial) {
        log::info!("Update is not addressed to recorder {serial}");
        return Ok(report);
    }
    report.applicable = true;

    for package in &manifest.packages {
        match install_package(settings, ctx, package) {
            Ok(true) => report.installed.push(package.clone()),
            Ok(false) => report.skipped.push(package.clone()),
            Err(e) => {
                log::error!("Update with {package} failed: {e}");
                warning(&format!("Failed to install {package}: {e}"));
                report.failed.push(package.clone());
            }
        }
    }

    Ok(report)
}

/// Fetch, verify and install one package
///
/// `Ok(false)` means the package was skipped (download failed or the
/// signature was not accepted). The staged files are removed afterwards.
fn install_package(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
    package: &str,
) -> Result<bool> {
    check_package_name(package)?;

    info(&format!("Downloading the deb package {package}."));
    let url = settings.remote_url(package);
    let sig_url = format!("{url}.sig");
    let staged = settings.update_dir.join(package);
    let staged_sig = with_suffix(&staged, ".sig");

    let files = [
        (url.as_str(), staged.as_path()),
        (sig_url.as_str(), staged_sig.as_path()),
    ];
    let result = fetch_and_install(settings, ctx, package, &files);

    let cleanup = cleanup_staged(&[staged.as_path(), staged_sig.as_path()]);
    let installed = result?;
    cleanup?;
    Ok(installed)
}

fn fetch_and_install(
    settings: &MssSettings,
    ctx: &UpdateContext<'_>,
    package: &str,
    files: &[(&str, &Path); 2],
) -> Result<bool> {
    if !fetch_all(ctx.fetcher, files)? {
        return Ok(false);
    }
    let [_, (_, staged_sig)] = files;
    if !verify_trusted(ctx.verifier, staged_sig, &settings.signer_identity)? {
        return Ok(false);
    }

    info("Updating the software.");
    ctx.system.install_package(&settings.update_dir, package)?;
    success("Installed the software.");
    ctx.system.restart_service(&settings.recorder_service)?;
    success("Restarted the service.");
    Ok(true)
}
