use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    config, info,
    management::TokenManager,
    pipeline::GenreMap,
    spotify::client::{RemoteError, RetryClient},
    types::{
        CreatePlaylistRequest, CreatePlaylistResponse, GetUserPlaylistsResponse,
        PlaylistTracksRequest, SnapshotResponse,
    },
    utils, warning,
};

/// The `/playlists/{id}/tracks` endpoints accept at most 100 uris per call.
const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Creates or updates one playlist per genre with the matching tracks.
///
/// Existing playlists are discovered once up front; for each genre the
/// playlist `Genre: {Title Case}` is created (private) when missing, its
/// contents are replaced, and the genre's tracks are added in chunks of 100.
/// Genres are processed in alphabetical order so repeated runs touch
/// playlists in a stable order.
///
/// Failures on a single playlist are downgraded to warnings; the remaining
/// genres continue. Returns the names of playlists created and updated.
pub async fn sync_genre_playlists(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
    genres: &GenreMap,
) -> (Vec<String>, Vec<String>) {
    let mut created: Vec<String> = Vec::new();
    let mut updated: Vec<String> = Vec::new();

    let existing = match user_playlists_by_name(client, tokens).await {
        Ok(map) => map,
        Err(e) => {
            warning!("Failed to list existing playlists: {}", e);
            HashMap::new()
        }
    };

    let mut ordered: Vec<(&String, &Vec<String>)> = genres.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));

    for (genre, track_ids) in ordered {
        let playlist_name = utils::playlist_name_for_genre(genre);

        let (playlist_id, is_new) = match existing.get(&playlist_name) {
            Some(id) => (id.clone(), false),
            None => match create(client, tokens, &playlist_name).await {
                Ok(resp) => (resp.id, true),
                Err(e) => {
                    warning!("Failed to create playlist {}: {}", playlist_name, e);
                    continue;
                }
            },
        };

        // clear existing tracks, then add the fresh set
        if let Err(e) = replace_tracks(client, tokens, &playlist_id, &[]).await {
            warning!("Failed to clear playlist {}: {}", playlist_name, e);
            continue;
        }

        let mut add_failed = false;
        for chunk in track_ids.chunks(MAX_TRACKS_PER_REQUEST) {
            if let Err(e) = add_tracks(client, tokens, &playlist_id, chunk).await {
                warning!("Failed to add tracks to playlist {}: {}", playlist_name, e);
                add_failed = true;
                break;
            }
        }
        if add_failed {
            continue;
        }

        let action = if is_new { "created" } else { "updated" };
        info!(
            "Playlist {} {} with {} tracks",
            playlist_name,
            action,
            track_ids.len()
        );

        if is_new {
            created.push(playlist_name);
        } else {
            updated.push(playlist_name);
        }
    }

    (created, updated)
}

/// Pages through the user's playlists and indexes them by name.
async fn user_playlists_by_name(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
) -> Result<HashMap<String, String>, RemoteError> {
    let mut playlists: HashMap<String, String> = HashMap::new();
    let mut api_url = format!(
        "{uri}/me/playlists?limit={limit}",
        uri = &config::spotify_apiurl(),
        limit = 50
    );

    loop {
        let token = tokens.lock().await.get_valid_token().await;
        let page: GetUserPlaylistsResponse = client.get_json(&api_url, &token).await?;

        for playlist in page.items {
            playlists.insert(playlist.name, playlist.id);
        }

        match page.next {
            Some(next) => api_url = next,
            None => break,
        }
    }

    Ok(playlists)
}

async fn create(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
    name: &str,
) -> Result<CreatePlaylistResponse, RemoteError> {
    let api_url = format!(
        "{uri}/users/{user}/playlists",
        uri = &config::spotify_apiurl(),
        user = &config::spotify_user()
    );

    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: "Created by sporgcli from your liked songs.".to_string(),
        public: false,
        collaborative: false,
    };

    let token = tokens.lock().await.get_valid_token().await;
    client.post_json(&api_url, &token, &body).await
}

async fn replace_tracks(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<SnapshotResponse, RemoteError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let body = PlaylistTracksRequest {
        uris: track_uris(track_ids),
    };

    let token = tokens.lock().await.get_valid_token().await;
    client.put_json(&api_url, &token, &body).await
}

async fn add_tracks(
    client: &RetryClient,
    tokens: &Mutex<TokenManager>,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<SnapshotResponse, RemoteError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let body = PlaylistTracksRequest {
        uris: track_uris(track_ids),
    };

    let token = tokens.lock().await.get_valid_token().await;
    client.post_json(&api_url, &token, &body).await
}

fn track_uris(track_ids: &[String]) -> Vec<String> {
    track_ids
        .iter()
        .map(|id| format!("spotify:track:{}", id))
        .collect()
}
