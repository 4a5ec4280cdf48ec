use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::{
    config, info,
    pipeline::{Catalog, GenreCache, GenreMap, resolve_batch},
    warning,
};

/// Fixed number of concurrent batch workers. Two gives some overlap between
/// network waits without bursting the rate limit.
pub const DEFAULT_WORKERS: usize = 2;

/// Counters describing a completed run.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub batches_attempted: usize,
    pub batches_failed: usize,
    pub tracks_skipped: usize,
    pub artists_skipped: usize,
}

/// Batch size tiered by library size: large libraries get smaller batches to
/// trade throughput against rate-limit risk, everything else uses the
/// service's 50-per-call maximum.
pub fn batch_size_for(total_tracks: usize) -> usize {
    if total_tracks > 3000 {
        20
    } else if total_tracks > 1000 {
        30
    } else {
        50
    }
}

/// Splits the liked-track list into batches, dispatches them across a small
/// worker pool and merges the partial genre maps into the final aggregate.
///
/// Batches are pulled from a shared queue, so dispatch order is the input
/// order but completion order is not guaranteed. Merging happens under a
/// mutex on the aggregate, one batch at a time. A failed batch is logged and
/// skipped; its tracks are permanently absent from the result.
pub struct GenrePipeline<C> {
    catalog: Arc<C>,
    cache: Arc<Mutex<GenreCache>>,
    workers: usize,
    delay_floor: Duration,
}

impl<C: Catalog + 'static> GenrePipeline<C> {
    pub fn new(catalog: C, cache: GenreCache, workers: usize, delay_floor: Duration) -> Self {
        Self {
            catalog: Arc::new(catalog),
            cache: Arc::new(Mutex::new(cache)),
            workers: workers.max(1),
            delay_floor,
        }
    }

    pub fn from_env(catalog: C, workers: usize) -> Self {
        Self::new(
            catalog,
            GenreCache::from_env(),
            workers,
            Duration::from_secs(config::batch_delay()),
        )
    }

    /// Runs the full pipeline over the given track ids.
    ///
    /// Always returns an aggregate, even when batches were lost; the caller
    /// can read [`RunStats::batches_failed`] to see how much is missing.
    pub async fn run(&self, track_ids: Vec<String>) -> (GenreMap, RunStats) {
        let batch_size = batch_size_for(track_ids.len());
        let batches: VecDeque<(usize, Vec<String>)> = track_ids
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .enumerate()
            .collect();
        let total_batches = batches.len();

        if total_batches == 0 {
            return (GenreMap::new(), RunStats::default());
        }

        info!(
            "Processing {} songs in {} batches (~{} tracks/batch)...",
            track_ids.len(),
            total_batches,
            batch_size
        );

        let pb = ProgressBar::new(total_batches as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} [{bar:40.cyan/blue}] {pos}/{len} batches")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        let queue = Arc::new(Mutex::new(batches));
        let aggregate = Arc::new(Mutex::new(GenreMap::new()));
        let stats = Arc::new(Mutex::new(RunStats::default()));

        let mut handles = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let catalog = Arc::clone(&self.catalog);
            let cache = Arc::clone(&self.cache);
            let queue = Arc::clone(&queue);
            let aggregate = Arc::clone(&aggregate);
            let stats = Arc::clone(&stats);
            let pb = pb.clone();
            let delay_floor = self.delay_floor;

            handles.push(tokio::spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, batch)) = next else {
                        break;
                    };

                    let started = Instant::now();
                    match resolve_batch(catalog.as_ref(), &cache, &batch).await {
                        Ok(outcome) => {
                            // merge is serialized through the aggregate lock
                            {
                                let mut agg = aggregate.lock().await;
                                for (genre, ids) in outcome.genres {
                                    agg.entry(genre).or_default().extend(ids);
                                }
                            }

                            let mut stats = stats.lock().await;
                            stats.batches_attempted += 1;
                            stats.tracks_skipped += outcome.tracks_skipped;
                            stats.artists_skipped += outcome.artists_skipped;
                        }
                        Err(e) => {
                            warning!(
                                "Skipping batch {}/{} due to unrecoverable error: {}",
                                index + 1,
                                total_batches,
                                e
                            );
                            let mut stats = stats.lock().await;
                            stats.batches_attempted += 1;
                            stats.batches_failed += 1;
                        }
                    }
                    pb.inc(1);

                    // pacing: wait at least the floor, longer after slow batches
                    if !queue.lock().await.is_empty() {
                        let pause = delay_floor.max(started.elapsed() / 2);
                        tokio::time::sleep(pause).await;
                    }
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warning!("Batch worker failed: {}", e);
            }
        }
        pb.finish_and_clear();

        let genres = std::mem::take(&mut *aggregate.lock().await);
        let stats = std::mem::take(&mut *stats.lock().await);
        (genres, stats)
    }
}
