//! Progress hooks for the slow steps of data preparation.
//!
//! Fetching the yearly delay tables and geocoding thousands of location
//! descriptions both take minutes. They report through [`ProgressCallback`]
//! so the CLI can draw its `indicatif` bars while the server and tests pass
//! `None` and stay quiet.

/// Receives progress updates from a download or a geocoding run.
///
/// Shared as `Arc<dyn ProgressCallback>`, so implementations must be
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Number of resources or queries the run will process.
    fn set_total(&self, total: u64);

    /// Marks `delta` more resources or queries as processed.
    fn inc(&self, delta: u64);

    /// Names the item currently being processed.
    fn set_message(&self, msg: String);

    /// Ends the run with a closing summary, e.g. the number of rows written.
    fn finish(&self, msg: String);
}
