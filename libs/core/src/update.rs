use crate::fetch::Fetcher;
use crate::signature::SignatureVerifier;
use crate::system::SystemControl;

/// Collaborators of an update run
///
/// The binaries wire in `HttpFetcher`, `GpgVerifier` and `SudoSystem`; tests
/// substitute in-memory fakes.
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub verifier: &'a dyn SignatureVerifier,
    pub system: &'a dyn SystemControl,
}
