//! Discovery diagnostics.

/// Observer for per-candidate failures during discovery.
///
/// Failures on individual candidates never abort the probe loop; they
/// are reported here and the next candidate is tried. The aggregate
/// error returned on exhaustion does not carry them, so an embedder
/// that wants the causes logs them from this callback. The default
/// method does nothing.
pub trait DiscoveryObserver {
    /// Called when a candidate URL is given up on after a transport
    /// failure, an unexpected HTTP status, or an unparseable response.
    fn candidate_failed(&self, url: &str, err: &anyhow::Error) {
        let _ = (url, err);
    }
}

/// No-op observer.
impl DiscoveryObserver for () {}
