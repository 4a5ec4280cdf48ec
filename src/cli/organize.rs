use std::sync::Arc;

use tabled::Table;
use tokio::sync::Mutex;

use crate::{
    error, info,
    management::TokenManager,
    pipeline::{GenreMap, GenrePipeline, RunStats},
    report, spotify,
    spotify::{catalog::SpotifyCatalog, client::RetryClient},
    success,
    types::GenreTableRow,
    warning,
};

/// Runs the full organize pipeline: liked tracks in, genre playlists out.
///
/// With `dry_run` the pipeline and report still run but no playlist is
/// touched. `workers` bounds the number of concurrent batch workers.
pub async fn organize(dry_run: bool, workers: usize) {
    let token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run sporgcli auth\n Error: {}",
                e
            );
        }
    };

    let client = RetryClient::from_env();
    let tokens = Arc::new(Mutex::new(token_mgr));

    info!("Fetching your liked songs from Spotify...");
    let liked = match spotify::tracks::get_liked_track_ids(&client, &tokens).await {
        Ok(ids) => ids,
        Err(e) => error!("Failed to fetch liked songs: {}", e),
    };

    if liked.is_empty() {
        success!("No liked songs found, nothing to organize.");
        return;
    }
    info!("Found {} liked songs to process", liked.len());

    let catalog = SpotifyCatalog::new(client.clone(), Arc::clone(&tokens));
    let pipeline = GenrePipeline::from_env(catalog, workers);
    let (genres, stats) = pipeline.run(liked).await;

    print_summary(&genres, &stats);

    if genres.is_empty() {
        warning!("No genres resolved, skipping playlist sync.");
        return;
    }

    let (created, updated) = if dry_run {
        info!("Dry run: skipping playlist sync.");
        (Vec::new(), Vec::new())
    } else {
        spotify::playlist::sync_genre_playlists(&client, &tokens, &genres).await
    };

    match report::write_report(&genres, &created, &updated).await {
        Ok(path) => success!("Report saved to {}", path.display()),
        Err(e) => warning!("Failed to save report: {}", e),
    }

    success!(
        "All done! {} playlists created, {} updated.",
        created.len(),
        updated.len()
    );
}

fn print_summary(genres: &GenreMap, stats: &RunStats) {
    success!("Found {} distinct genres in your library", genres.len());

    if !genres.is_empty() {
        let mut rows: Vec<GenreTableRow> = genres
            .iter()
            .map(|(genre, tracks)| GenreTableRow {
                genre: genre.clone(),
                tracks: tracks.len(),
            })
            .collect();
        rows.sort_by(|a, b| b.tracks.cmp(&a.tracks).then_with(|| a.genre.cmp(&b.genre)));

        let table = Table::new(rows);
        println!("{}", table);
    }

    info!(
        "Batches: {} processed, {} failed; {} tracks and {} artists skipped",
        stats.batches_attempted, stats.batches_failed, stats.tracks_skipped, stats.artists_skipped
    );
    if stats.batches_failed > 0 {
        warning!(
            "{} batches were lost; their tracks are missing from the playlists.",
            stats.batches_failed
        );
    }
}
