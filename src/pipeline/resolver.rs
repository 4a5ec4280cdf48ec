use std::{collections::BTreeSet, fmt, time::Duration};

use tokio::sync::Mutex;

use crate::{
    pipeline::{Catalog, GenreCache, GenreMap},
    spotify::client::RemoteError,
    types::Track,
};

/// Wall-clock ceiling for resolving a single batch.
pub const BATCH_DEADLINE: Duration = Duration::from_secs(300);

/// Why a batch produced no result. Either way the batch is lost as a whole;
/// the resolver never returns partial data.
#[derive(Debug)]
pub enum BatchError {
    Remote(RemoteError),
    Timeout(Duration),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Remote(err) => write!(f, "remote error: {}", err),
            BatchError::Timeout(limit) => {
                write!(f, "batch processing timeout ({}s exceeded)", limit.as_secs())
            }
        }
    }
}

impl std::error::Error for BatchError {}

impl From<RemoteError> for BatchError {
    fn from(err: RemoteError) -> Self {
        BatchError::Remote(err)
    }
}

/// Genre mapping produced from exactly one batch, plus what was skipped
/// along the way. Consumed immediately by the orchestrator's merge step.
#[derive(Debug, Default, Clone)]
pub struct BatchOutcome {
    pub genres: GenreMap,
    pub tracks_skipped: usize,
    pub artists_skipped: usize,
}

/// Resolves one batch of track ids to a partial genre map.
///
/// Fetches the track records, drops (and counts) tracks the service no
/// longer knows, resolves the distinct artist set through the shared cache,
/// and inverts the per-track genre unions into a genre → tracks map. A track
/// whose artists share a genre still appears only once under that genre.
///
/// The whole sequence runs under [`BATCH_DEADLINE`]; exceeding it fails the
/// batch with [`BatchError::Timeout`] instead of returning partial data.
pub async fn resolve_batch<C: Catalog>(
    catalog: &C,
    cache: &Mutex<GenreCache>,
    track_ids: &[String],
) -> Result<BatchOutcome, BatchError> {
    match tokio::time::timeout(BATCH_DEADLINE, resolve_inner(catalog, cache, track_ids)).await {
        Ok(outcome) => outcome.map_err(BatchError::from),
        Err(_) => Err(BatchError::Timeout(BATCH_DEADLINE)),
    }
}

async fn resolve_inner<C: Catalog>(
    catalog: &C,
    cache: &Mutex<GenreCache>,
    track_ids: &[String],
) -> Result<BatchOutcome, RemoteError> {
    let records = catalog.several_tracks(track_ids).await?;

    // deleted/unavailable tracks come back as null
    let valid: Vec<Track> = records.into_iter().flatten().collect();
    let tracks_skipped = track_ids.len().saturating_sub(valid.len());

    let artist_ids: BTreeSet<String> = valid
        .iter()
        .flat_map(|track| track.artists.iter().map(|artist| artist.id.clone()))
        .collect();

    let lookup = cache
        .lock()
        .await
        .get_or_fetch(catalog, &artist_ids)
        .await?;

    let mut genres = GenreMap::new();
    for track in &valid {
        // union of genres across the track's artists, de-duplicated so the
        // track lands at most once per genre
        let mut track_genres: BTreeSet<&str> = BTreeSet::new();
        for artist in &track.artists {
            if let Some(artist_genres) = lookup.genres.get(&artist.id) {
                track_genres.extend(artist_genres.iter().map(|g| g.as_str()));
            }
        }

        for genre in track_genres {
            genres
                .entry(genre.to_string())
                .or_default()
                .push(track.id.clone());
        }
    }

    Ok(BatchOutcome {
        genres,
        tracks_skipped,
        artists_skipped: lookup.missing,
    })
}
