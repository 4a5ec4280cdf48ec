//! # CLI Module
//!
//! User-facing command implementations for sporgcli, the Spotify genre
//! playlist organizer.
//!
//! ## Commands
//!
//! - [`auth`] - Spotify OAuth authorization-code flow, persists the token
//! - [`organize`] - the full run: enumerate liked tracks, resolve genres
//!   through the batched pipeline, sync one playlist per genre and write the
//!   run report
//!
//! Each command delegates to the [`crate::spotify`], [`crate::pipeline`] and
//! [`crate::management`] layers and is responsible for progress feedback and
//! error presentation. Fatal conditions (missing configuration, missing
//! token) terminate via `error!`; everything recoverable is surfaced as a
//! `warning!` and the run continues.

mod auth;
mod organize;

pub use auth::auth;
pub use organize::organize;
