// Detached signature verification through gpg
//
// gpg's exit status alone does not say who signed a file, so the textual
// report is checked for the good-signature marker and the expected signer
// identity. The parsed result is kept as structured data for logging.

use crate::error::Result;
use crate::utils::run;
use regex::Regex;
use std::path::Path;
use std::process::Command;

const GOOD_SIGNATURE_MARKER: &str = "gpg: Good signature";

/// User ids quoted in "Good signature from" lines
fn extract_signers(report: &str) -> Option<Vec<String>> {
    let re = Regex::new(r#"Good signature from "([^"]+)""#).ok()?;
    Some(
        re.captures_iter(report)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
    )
}

/// Outcome of one `gpg --verify` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// gpg exited with status 0
    pub exit_ok: bool,
    /// The report contains the good-signature marker
    pub good_signature: bool,
    /// User ids named in "Good signature from" lines
    pub signers: Vec<String>,
    /// Combined stdout and stderr of gpg
    pub report: String,
}

impl Verification {
    /// Build a verification result from the textual gpg report
    pub fn from_report(exit_ok: bool, report: impl Into<String>) -> Self {
        let report = report.into();
        Self {
            exit_ok,
            good_signature: report.contains(GOOD_SIGNATURE_MARKER),
            signers: extract_signers(&report).unwrap_or_default(),
            report,
        }
    }

    /// Whether the signed file can be trusted
    ///
    /// Requires a zero exit status, the good-signature marker and the
    /// expected identity anywhere in the report.
    pub fn is_trusted_by(&self, identity: &str) -> bool {
        self.exit_ok && self.good_signature && self.report.contains(identity)
    }
}

/// Verify a detached signature whose data file sits next to it
pub trait SignatureVerifier {
    fn verify(&self, signature: &Path) -> Result<Verification>;
}

/// `gpg --verify <file>.sig` with an English locale
#[derive(Debug, Default, Clone, Copy)]
pub struct GpgVerifier;

impl SignatureVerifier for GpgVerifier {
    fn verify(&self, signature: &Path) -> Result<Verification> {
        let output = run(Command::new("gpg")
            .arg("--verify")
            .arg(signature)
            .env("LANGUAGE", "en_US:en"))?;

        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Verification::from_report(output.status.success(), report))
    }
}

/// Verify `signature` and decide whether it is trusted by `identity`
pub fn verify_trusted(
    verifier: &dyn SignatureVerifier,
    signature: &Path,
    identity: &str,
) -> Result<bool> {
    let verification = verifier.verify(signature)?;
    let trusted = verification.is_trusted_by(identity);

    if trusted {
        log::info!(
            "Good signature on {} from {}",
            signature.display(),
            verification.signers.join(", ")
        );
    } else {
        log::warn!(
            "Untrusted signature {} (exit ok: {}, good signature: {}, signers: {:?})",
            signature.display(),
            verification.exit_ok,
            verification.good_signature,
            verification.signers
        );
    }

    Ok(trusted)
}
