use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::{
    config,
    management::TokenManager,
    spotify::client::{RemoteError, RetryClient},
    types::SavedTracksResponse,
};

/// Enumerates the ids of all tracks the user has liked.
///
/// Pages through `GET /me/tracks` (50 items per page, following the `next`
/// link) until the library is fully drained, showing a spinner with running
/// progress. Items whose track is null (removed from the catalog) are
/// skipped here; the pipeline re-checks availability per batch anyway.
///
/// The returned list preserves the service's ordering (most recently liked
/// first) and is handed to the pipeline as-is.
pub async fn get_liked_track_ids(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
) -> Result<Vec<String>, RemoteError> {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching liked songs...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let mut ids: Vec<String> = Vec::new();
    let mut total: Option<u64> = None;
    let mut api_url = format!(
        "{uri}/me/tracks?limit={limit}",
        uri = &config::spotify_apiurl(),
        limit = 50
    );

    loop {
        let token = tokens.lock().await.get_valid_token().await;
        let page: SavedTracksResponse = match client.get_json(&api_url, &token).await {
            Ok(page) => page,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        if total.is_none() {
            total = page.total;
        }

        for item in page.items {
            if let Some(track) = item.track {
                ids.push(track.id);
            }
        }

        match total {
            Some(total) => pb.set_message(format!("Retrieved {}/{} liked songs...", ids.len(), total)),
            None => pb.set_message(format!("Retrieved {} liked songs...", ids.len())),
        }

        match page.next {
            Some(next) => api_url = next,
            None => break,
        }
    }

    pb.finish_and_clear();
    Ok(ids)
}
