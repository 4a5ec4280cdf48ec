//! # Genre-Resolution Pipeline
//!
//! The algorithmic heart of the organizer: takes the full list of liked-track
//! ids, splits it into rate-limit-friendly batches, resolves each batch's
//! tracks to genres through a shared artist-genre cache, and merges the
//! partial results into one aggregate genre → tracks mapping.
//!
//! ```text
//! liked track ids
//!       ↓ split (tiered batch size)
//! [GenrePipeline] ── worker pool (bounded) ──┐
//!       ↓                                    │
//! [resolve_batch]  tracks → artists → genres │ per batch
//!       ↓ consults                           │
//! [GenreCache]  artist → genres, coarse TTL  │
//!       ↓                                    │
//! partial GenreMap ←─────────────────────────┘
//!       ↓ serialized merge
//! aggregate GenreMap + RunStats
//! ```
//!
//! Failure tolerance: a batch that exhausts its retries or exceeds its
//! wall-clock ceiling is logged and skipped; its data is absent from the
//! aggregate but the run continues. Only configuration and authentication
//! problems abort the whole run, and those are caught before the pipeline
//! starts.

mod cache;
mod orchestrator;
mod resolver;

pub use cache::{CacheLookup, GenreCache};
pub use orchestrator::{DEFAULT_WORKERS, GenrePipeline, RunStats, batch_size_for};
pub use resolver::{BATCH_DEADLINE, BatchError, BatchOutcome, resolve_batch};

use std::collections::HashMap;
use std::future::Future;

use crate::spotify::client::RemoteError;
use crate::types::{ArtistRecord, Track};

/// Mapping from a normalized (lowercase) genre tag to the track ids carrying
/// it, in processing order. A track appears at most once per genre within a
/// single batch; duplicates across batches are possible and merged as-is.
pub type GenreMap = HashMap<String, Vec<String>>;

/// Batched metadata lookups against the music catalog.
///
/// The seam between the pipeline and the remote service: production code uses
/// [`crate::spotify::catalog::SpotifyCatalog`], tests substitute an in-memory
/// fake. Null entries mean "not found on the service" and must be preserved
/// positionally so callers can count them.
pub trait Catalog: Send + Sync {
    fn several_tracks(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Option<Track>>, RemoteError>> + Send;

    fn several_artists(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Option<ArtistRecord>>, RemoteError>> + Send;
}
