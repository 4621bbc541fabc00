//! Progress reporting for hierarchy loading.
//!
//! Reading a country-sized corpus takes a while, so [`crate::Hierarchy::load`]
//! reports how many bytes of the file it has consumed. The CLI renders this
//! with `indicatif`; tests and library callers pass [`NullProgress`].

/// Receives progress updates from long-running loads.
pub trait ProgressCallback: Send + Sync {
    /// Total units of work (bytes of the corpus file).
    fn set_total(&self, total: u64);

    /// Advance by `delta` units.
    fn inc(&self, delta: u64);

    /// Mark the load as complete with a summary message.
    fn finish(&self, msg: String);
}

/// Ignores all updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _msg: String) {}
}
