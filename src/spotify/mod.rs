//! # Spotify Integration Module
//!
//! Integration layer between the genre organizer and the Spotify Web API.
//! It covers the authorization-code OAuth flow, the retrying HTTP client,
//! batched track/artist lookups and playlist management.
//!
//! ## Submodules
//!
//! - [`auth`] - OAuth 2.0 authorization-code flow (browser consent, local
//!   callback server, token exchange and refresh)
//! - [`client`] - [`client::RetryClient`]: fault-tolerant HTTP wrapper with a
//!   [`client::RetryPolicy`] for transient failures (429/5xx, timeouts) and
//!   `Retry-After` handling
//! - [`catalog`] - [`catalog::SpotifyCatalog`]: batched `/tracks` and
//!   `/artists` lookups behind the pipeline's catalog seam, respecting the
//!   50-ids-per-call API limit
//! - [`tracks`] - paginated enumeration of the user's liked tracks
//! - [`playlist`] - per-genre playlist discovery, creation and track sync
//!
//! ## Error handling
//!
//! Remote operations surface [`client::RemoteError`]: transient failures are
//! retried with exponential backoff and only reported once the attempt budget
//! is exhausted (`Unavailable`); everything else propagates immediately.
//! Nulls inside batched responses are not errors and are passed through for
//! the caller to count.
//!
//! ## API endpoints used
//!
//! - `GET /me/tracks` - saved tracks (paginated)
//! - `GET /tracks?ids=` / `GET /artists?ids=` - batched metadata lookups
//! - `GET /me/playlists` - playlist discovery
//! - `POST /users/{user_id}/playlists` - playlist creation
//! - `PUT|POST /playlists/{playlist_id}/tracks` - replace/add tracks
//! - `POST /api/token` - token exchange and refresh

pub mod auth;
pub mod catalog;
pub mod client;
pub mod playlist;
pub mod tracks;
