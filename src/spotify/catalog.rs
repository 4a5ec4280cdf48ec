use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config,
    management::TokenManager,
    pipeline::Catalog,
    spotify::client::{RemoteError, RetryClient},
    types::{ArtistRecord, SeveralArtistsResponse, SeveralTracksResponse, Track},
};

/// Maximum number of ids the batched `/tracks` and `/artists` endpoints
/// accept per call.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// [`Catalog`] implementation backed by the Spotify Web API.
///
/// Splits requested id sets into chunks of [`MAX_IDS_PER_REQUEST`] and
/// preserves the service's null entries so callers can count skipped
/// tracks/artists. The token manager is shared behind a mutex because batch
/// workers call into the catalog concurrently.
pub struct SpotifyCatalog {
    client: RetryClient,
    tokens: Arc<Mutex<TokenManager>>,
}

impl SpotifyCatalog {
    pub fn new(client: RetryClient, tokens: Arc<Mutex<TokenManager>>) -> Self {
        Self { client, tokens }
    }

    async fn token(&self) -> String {
        self.tokens.lock().await.get_valid_token().await
    }
}

impl Catalog for SpotifyCatalog {
    async fn several_tracks(&self, ids: &[String]) -> Result<Vec<Option<Track>>, RemoteError> {
        let mut tracks = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let api_url = format!(
                "{uri}/tracks?ids={ids}",
                uri = &config::spotify_apiurl(),
                ids = chunk.join(",")
            );
            let token = self.token().await;
            let res: SeveralTracksResponse = self.client.get_json(&api_url, &token).await?;
            tracks.extend(res.tracks);
        }

        Ok(tracks)
    }

    async fn several_artists(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<ArtistRecord>>, RemoteError> {
        let mut artists = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let api_url = format!(
                "{uri}/artists?ids={ids}",
                uri = &config::spotify_apiurl(),
                ids = chunk.join(",")
            );
            let token = self.token().await;
            let res: SeveralArtistsResponse = self.client.get_json(&api_url, &token).await?;
            artists.extend(res.artists);
        }

        Ok(artists)
    }
}
