//! # API Module
//!
//! HTTP endpoints for the temporary local server used during authentication.
//!
//! - [`callback`] - receives the OAuth redirect from Spotify, verifies the
//!   `state` nonce and exchanges the authorization code for a token
//! - [`health`] - minimal status endpoint for checking the server is up
//!
//! The server only runs for the duration of `sporgcli auth`; see
//! [`crate::server`] for the router setup.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
