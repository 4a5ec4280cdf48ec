use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use sporgcli::pipeline::{
    Catalog, GenreCache, GenreMap, GenrePipeline, batch_size_for, resolve_batch,
};
use sporgcli::spotify::client::RemoteError;
use sporgcli::types::{ArtistRecord, Track, TrackArtist};

// In-memory catalog. Track ids absent from `tracks` come back as null, the
// same way the service reports deleted tracks. Any request containing an id
// from `fail_for` fails as if the retry budget were exhausted.
struct FakeCatalog {
    tracks: HashMap<String, Vec<String>>,
    artists: HashMap<String, Option<Vec<String>>>,
    fail_for: HashSet<String>,
    artist_calls: AtomicUsize,
}

impl FakeCatalog {
    fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            artists: HashMap::new(),
            fail_for: HashSet::new(),
            artist_calls: AtomicUsize::new(0),
        }
    }

    fn with_track(mut self, id: &str, artist_ids: &[&str]) -> Self {
        self.tracks
            .insert(id.to_string(), artist_ids.iter().map(|a| a.to_string()).collect());
        self
    }

    fn with_artist(mut self, id: &str, genres: &[&str]) -> Self {
        self.artists.insert(
            id.to_string(),
            Some(genres.iter().map(|g| g.to_string()).collect()),
        );
        self
    }

    fn with_missing_artist(mut self, id: &str) -> Self {
        self.artists.insert(id.to_string(), None);
        self
    }

    fn failing_for(mut self, track_id: &str) -> Self {
        self.fail_for.insert(track_id.to_string());
        self
    }

    fn artist_calls(&self) -> usize {
        self.artist_calls.load(Ordering::SeqCst)
    }
}

impl Catalog for FakeCatalog {
    async fn several_tracks(&self, ids: &[String]) -> Result<Vec<Option<Track>>, RemoteError> {
        if ids.iter().any(|id| self.fail_for.contains(id)) {
            return Err(RemoteError::Unavailable {
                attempts: 5,
                last: "HTTP 503 Service Unavailable".to_string(),
            });
        }

        Ok(ids
            .iter()
            .map(|id| {
                self.tracks.get(id).map(|artist_ids| Track {
                    id: id.clone(),
                    name: format!("track {}", id),
                    artists: artist_ids
                        .iter()
                        .map(|aid| TrackArtist {
                            id: aid.clone(),
                            name: format!("artist {}", aid),
                        })
                        .collect(),
                })
            })
            .collect())
    }

    async fn several_artists(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<ArtistRecord>>, RemoteError> {
        self.artist_calls.fetch_add(1, Ordering::SeqCst);

        Ok(ids
            .iter()
            .map(|id| match self.artists.get(id) {
                Some(Some(genres)) => Some(ArtistRecord {
                    id: id.clone(),
                    name: format!("artist {}", id),
                    genres: genres.clone(),
                }),
                _ => None,
            })
            .collect())
    }
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn cache_with_ttl(secs: u64) -> Mutex<GenreCache> {
    Mutex::new(GenreCache::new(Duration::from_secs(secs)))
}

#[tokio::test]
async fn resolves_batch_with_missing_track() {
    // A has artists [X], B has [X, Y], C is gone from the catalog.
    let catalog = FakeCatalog::new()
        .with_track("A", &["X"])
        .with_track("B", &["X", "Y"])
        .with_artist("X", &["rock"])
        .with_artist("Y", &["rock", "jazz"]);
    let cache = cache_with_ttl(3600);

    let outcome = resolve_batch(&catalog, &cache, &ids(&["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(outcome.tracks_skipped, 1);
    assert_eq!(outcome.genres.len(), 2);
    assert_eq!(outcome.genres["rock"], ids(&["A", "B"]));
    assert_eq!(outcome.genres["jazz"], ids(&["B"]));
}

#[tokio::test]
async fn track_appears_at_most_once_per_genre() {
    // both artists of T carry "rock"; T must not be double-counted
    let catalog = FakeCatalog::new()
        .with_track("T", &["X", "Z"])
        .with_artist("X", &["rock"])
        .with_artist("Z", &["rock", "metal"]);
    let cache = cache_with_ttl(3600);

    let outcome = resolve_batch(&catalog, &cache, &ids(&["T"])).await.unwrap();

    assert_eq!(outcome.genres["rock"], ids(&["T"]));
    assert_eq!(outcome.genres["metal"], ids(&["T"]));
}

#[tokio::test]
async fn missing_artist_counts_as_zero_genres() {
    let catalog = FakeCatalog::new()
        .with_track("T", &["X", "GONE"])
        .with_artist("X", &["rock"])
        .with_missing_artist("GONE");
    let cache = cache_with_ttl(3600);

    let outcome = resolve_batch(&catalog, &cache, &ids(&["T"])).await.unwrap();

    assert_eq!(outcome.artists_skipped, 1);
    assert_eq!(outcome.genres["rock"], ids(&["T"]));
    assert_eq!(outcome.genres.len(), 1);
}

#[tokio::test]
async fn cache_lookup_covers_every_requested_id() {
    let catalog = FakeCatalog::new()
        .with_artist("X", &["rock"])
        .with_missing_artist("U");
    let mut cache = GenreCache::new(Duration::from_secs(3600));

    let requested: BTreeSet<String> = ids(&["X", "U", "NEVER_SEEN"]).into_iter().collect();
    let lookup = cache.get_or_fetch(&catalog, &requested).await.unwrap();

    let returned: BTreeSet<String> = lookup.genres.keys().cloned().collect();
    assert_eq!(returned, requested);
    assert_eq!(lookup.genres["X"], vec!["rock".to_string()]);
    assert!(lookup.genres["U"].is_empty());
    assert!(lookup.genres["NEVER_SEEN"].is_empty());
    assert_eq!(lookup.missing, 2);
}

#[tokio::test]
async fn zero_ttl_always_refetches() {
    let catalog = FakeCatalog::new().with_artist("X", &["rock"]);
    let mut cache = GenreCache::new(Duration::ZERO);

    let requested: BTreeSet<String> = ids(&["X"]).into_iter().collect();
    cache.get_or_fetch(&catalog, &requested).await.unwrap();
    cache.get_or_fetch(&catalog, &requested).await.unwrap();

    assert_eq!(catalog.artist_calls(), 2);
}

#[tokio::test]
async fn warm_cache_resolution_is_idempotent() {
    let catalog = FakeCatalog::new()
        .with_track("A", &["X"])
        .with_track("B", &["X", "Y"])
        .with_artist("X", &["rock"])
        .with_artist("Y", &["jazz"]);
    let cache = cache_with_ttl(3600);

    let batch = ids(&["A", "B"]);
    let first = resolve_batch(&catalog, &cache, &batch).await.unwrap();
    let second = resolve_batch(&catalog, &cache, &batch).await.unwrap();

    assert_eq!(first.genres, second.genres);
    // the second pass was answered entirely from cache
    assert_eq!(catalog.artist_calls(), 1);
}

#[tokio::test]
async fn remote_failure_loses_only_the_affected_batch() {
    // 150 tracks -> 3 batches of 50; poisoning a track in the second batch
    // makes exactly that batch fail.
    let mut catalog = FakeCatalog::new().with_artist("X", &["rock"]);
    let mut all_ids = Vec::new();
    for i in 0..150 {
        let id = format!("t{:03}", i);
        catalog = catalog.with_track(&id, &["X"]);
        all_ids.push(id);
    }
    catalog = catalog.failing_for("t075");

    let pipeline = GenrePipeline::new(
        catalog,
        GenreCache::new(Duration::from_secs(3600)),
        2,
        Duration::ZERO,
    );
    let (genres, stats) = pipeline.run(all_ids).await;

    assert_eq!(stats.batches_attempted, 3);
    assert_eq!(stats.batches_failed, 1);

    let rock = &genres["rock"];
    assert_eq!(rock.len(), 100);
    assert!(!rock.contains(&"t075".to_string()));
    assert!(rock.contains(&"t000".to_string()));
    assert!(rock.contains(&"t149".to_string()));
}

#[tokio::test]
async fn merge_content_is_independent_of_completion_order() {
    fn build_catalog() -> FakeCatalog {
        let mut catalog = FakeCatalog::new()
            .with_artist("X", &["rock"])
            .with_artist("Y", &["jazz"]);
        for i in 0..120 {
            let artist = if i % 2 == 0 { "X" } else { "Y" };
            catalog = catalog.with_track(&format!("t{:03}", i), &[artist]);
        }
        catalog
    }
    let all_ids: Vec<String> = (0..120).map(|i| format!("t{:03}", i)).collect();

    let serial = GenrePipeline::new(
        build_catalog(),
        GenreCache::new(Duration::from_secs(3600)),
        1,
        Duration::ZERO,
    );
    let concurrent = GenrePipeline::new(
        build_catalog(),
        GenreCache::new(Duration::from_secs(3600)),
        2,
        Duration::ZERO,
    );

    let (mut first, _) = serial.run(all_ids.clone()).await;
    let (mut second, _) = concurrent.run(all_ids).await;

    let sort_lists = |map: &mut GenreMap| {
        for tracks in map.values_mut() {
            tracks.sort();
        }
    };
    sort_lists(&mut first);
    sort_lists(&mut second);

    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_library_yields_empty_aggregate() {
    let pipeline = GenrePipeline::new(
        FakeCatalog::new(),
        GenreCache::new(Duration::from_secs(3600)),
        2,
        Duration::ZERO,
    );
    let (genres, stats) = pipeline.run(Vec::new()).await;

    assert!(genres.is_empty());
    assert_eq!(stats.batches_attempted, 0);
    assert_eq!(stats.batches_failed, 0);
}

#[test]
fn batch_size_tiers() {
    // very large libraries trade throughput for rate-limit headroom
    assert_eq!(batch_size_for(5000), 20);
    assert_eq!(batch_size_for(3001), 20);
    assert_eq!(batch_size_for(3000), 30);
    assert_eq!(batch_size_for(2000), 30);
    assert_eq!(batch_size_for(1001), 30);
    assert_eq!(batch_size_for(1000), 50);
    assert_eq!(batch_size_for(500), 50);
    assert_eq!(batch_size_for(0), 50);
}
