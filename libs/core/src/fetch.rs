use crate::error::{Error, Result};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Download a remote file to a local path
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Blocking HTTP downloader backed by a `ureq` agent
///
/// Connecting and waiting for the response headers are bounded by the
/// timeout. The body transfer is not, large packages on a slow uplink take
/// as long as they take.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = Some(Duration::from_secs(timeout_secs));
        let config = ureq::Agent::config_builder()
            .timeout_connect(timeout)
            .timeout_recv_response(timeout)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        log::debug!("Downloading {url} -> {}", dest.display());

        let fetch_error = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;

        if response.status() != 200 {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }

        let mut file = std::fs::File::create(dest).map_err(|e| Error::io(dest, e))?;
        let mut reader = response.body_mut().as_reader();
        let mut buf = [0u8; 8192];
        // Read errors are network failures, write errors are local ones
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(fetch_error(e.to_string())),
            };
            file.write_all(&buf[..n]).map_err(|e| Error::io(dest, e))?;
        }
        file.flush().map_err(|e| Error::io(dest, e))?;

        Ok(())
    }
}

/// Fetch each `(url, dest)` pair in order
///
/// Returns `Ok(false)` on the first download failure after removing anything
/// already written, so the caller can treat it as "nothing to do". Local IO
/// failures other than the download itself are still returned as errors.
pub fn fetch_all(fetcher: &dyn Fetcher, files: &[(&str, &Path)]) -> Result<bool> {
    for (url, dest) in files {
        match fetcher.fetch(url, dest) {
            Ok(()) => {}
            Err(Error::Fetch { url, reason }) => {
                log::info!("Could not download {url}: {reason}");
                for (_, staged) in files {
                    remove_if_exists(staged)?;
                }
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Remove a staged file, tolerating it being gone already
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove every staged file, attempting all of them before reporting the
/// first failure
pub fn cleanup_staged(paths: &[&Path]) -> Result<()> {
    let mut first_error = None;
    for path in paths {
        if let Err(e) = remove_if_exists(path) {
            log::error!("Failed to remove staged file: {e}");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
