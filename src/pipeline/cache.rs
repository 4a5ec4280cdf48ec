use std::{
    collections::{BTreeSet, HashMap},
    time::{Duration, Instant},
};

use crate::{config, pipeline::Catalog, spotify::client::RemoteError};

/// Result of a cache lookup: the full requested mapping plus how many of the
/// freshly fetched artists came back null from the service.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    /// artist id → lowercased genre tags; covers every requested id.
    pub genres: HashMap<String, Vec<String>>,
    /// Artists the service reported as not found during this lookup.
    pub missing: usize,
}

/// Process-lifetime artist → genres cache with coarse time-based invalidation.
///
/// Instead of per-entry expiry the whole cache is cleared once the time since
/// the last fetch exceeds the TTL; with the lookup volume of a single run
/// that keeps bookkeeping trivial while still bounding staleness. A TTL of
/// zero disables caching entirely: every lookup re-fetches.
///
/// The cache is owned by the orchestrator and shared across batch workers
/// behind a `tokio::sync::Mutex`; holding the lock across
/// [`GenreCache::get_or_fetch`] keeps the clear-and-repopulate sequence free
/// of races.
pub struct GenreCache {
    entries: HashMap<String, Vec<String>>,
    last_refreshed: Option<Instant>,
    ttl: Duration,
}

impl GenreCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            last_refreshed: None,
            ttl,
        }
    }

    pub fn from_env() -> Self {
        Self::new(Duration::from_secs(config::cache_expiry()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves genres for every requested artist id, hitting the catalog
    /// only for ids not already cached.
    ///
    /// An artist the service reports as null is recorded as having zero
    /// genres (and counted in [`CacheLookup::missing`]) rather than treated
    /// as an error. The returned mapping always contains every requested id.
    pub async fn get_or_fetch<C: Catalog>(
        &mut self,
        catalog: &C,
        artist_ids: &BTreeSet<String>,
    ) -> Result<CacheLookup, RemoteError> {
        self.expire_if_stale();

        let uncached: Vec<String> = artist_ids
            .iter()
            .filter(|id| !self.entries.contains_key(*id))
            .cloned()
            .collect();

        let mut missing = 0;
        if !uncached.is_empty() {
            let records = catalog.several_artists(&uncached).await?;

            // responses come back in request order, nulls included
            for (id, record) in uncached.iter().zip(records) {
                match record {
                    Some(artist) => {
                        let genres = artist.genres.iter().map(|g| g.to_lowercase()).collect();
                        self.entries.insert(artist.id, genres);
                    }
                    None => {
                        missing += 1;
                        self.entries.insert(id.clone(), Vec::new());
                    }
                }
            }

            self.last_refreshed = Some(Instant::now());
        }

        let genres = artist_ids
            .iter()
            .map(|id| (id.clone(), self.entries.get(id).cloned().unwrap_or_default()))
            .collect();

        Ok(CacheLookup { genres, missing })
    }

    fn expire_if_stale(&mut self) {
        if let Some(refreshed_at) = self.last_refreshed {
            if refreshed_at.elapsed() >= self.ttl {
                self.entries.clear();
                self.last_refreshed = None;
            }
        }
    }
}
