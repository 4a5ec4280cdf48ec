use std::{sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config, error,
    management::TokenManager,
    server::start_api_server,
    success,
    types::{AuthFlow, Token},
    utils, warning,
};

/// Runs the complete OAuth 2.0 authorization-code flow against Spotify.
///
/// Generates a random `state` nonce, starts the local callback server, opens
/// the consent URL in the user's browser, waits for the callback handler to
/// exchange the authorization code, and persists the resulting token.
///
/// # Arguments
///
/// * `shared_state` - Thread-safe slot shared with the callback handler; it
///   carries the `state` nonce out and the exchanged token back.
///
/// # Errors
///
/// Browser launch failures degrade to a warning with the URL for manual
/// navigation. A failed exchange or a 60 second wait without a callback
/// terminates the program.
pub async fn auth(shared_state: Arc<Mutex<Option<AuthFlow>>>) {
    let state_token = utils::generate_state_token();

    // start API server
    let server_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        start_api_server(server_state).await;
    });

    // Construct the authorization URL
    let auth_url = format!(
        "{spotify_auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&state={state}&scope={scope}",
        spotify_auth_url = &config::spotify_apiauth_url(),
        client_id = &config::spotify_client_id(),
        redirect_uri = &config::spotify_redirect_uri(),
        state = state_token,
        scope = &config::spotify_scope()
    );

    // Store the nonce in shared state before redirect
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(AuthFlow {
            state: state_token.clone(),
            token: None,
        });
    }

    // Open the authorization URL in the default browser
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    // wait for callback to be hit
    let token = wait_for_token(shared_state).await;

    match token {
        Some(t) => {
            let token_manager = TokenManager::new(t.clone());
            if let Err(e) = token_manager.persist().await {
                error!("Failed to save token to cache: {}", e);
            }

            success!("Authentication successful!");
        }
        None => {
            error!("Authentication failed or timed out.");
        }
    }
}

/// Polls the shared state for a completed token with a 60 second ceiling.
///
/// Runs concurrently with the callback handler that populates the token
/// after a successful exchange. Returns `None` when the wait expires.
async fn wait_for_token(shared_state: Arc<Mutex<Option<AuthFlow>>>) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(60);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(flow) = lock.as_ref() {
            if let Some(token) = &flow.token {
                return Some(token.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

fn basic_auth_header() -> String {
    let credentials = format!(
        "{}:{}",
        config::spotify_client_id(),
        config::spotify_client_secret()
    );
    format!("Basic {}", STANDARD.encode(credentials))
}

/// Exchanges an authorization code for an access token.
///
/// Final step of the authorization-code flow: the client credentials go into
/// the Basic authorization header, the code and redirect URI into the form
/// body. The code is single-use and short-lived, so the exchange happens
/// immediately inside the callback handler.
pub async fn exchange_code(code: &str) -> Result<Token, String> {
    let client = Client::new();
    let res = client
        .post(&config::spotify_apitoken_url())
        .header("Authorization", basic_auth_header())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config::spotify_redirect_uri()),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let json: Value = res.json().await.map_err(|e| e.to_string())?;

    let access_token = json["access_token"]
        .as_str()
        .ok_or_else(|| format!("token response missing access_token: {}", json))?
        .to_string();

    Ok(Token {
        access_token,
        refresh_token: json["refresh_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_i64().unwrap_or(3600) as u64,
        obtained_at: Utc::now().timestamp() as u64,
    })
}

/// Refreshes an expired access token using a refresh token.
///
/// The response may omit a new refresh token, in which case the old one
/// stays valid and is carried over.
pub async fn refresh_token(refresh_token: &str) -> Result<Token, String> {
    let client = Client::new();
    let res = client
        .post(&config::spotify_apitoken_url())
        .header("Authorization", basic_auth_header())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let json: Value = res.json().await.map_err(|e| e.to_string())?;

    let access_token = json["access_token"]
        .as_str()
        .ok_or_else(|| format!("refresh response missing access_token: {}", json))?
        .to_string();

    Ok(Token {
        access_token,
        refresh_token: json["refresh_token"]
            .as_str()
            .unwrap_or(refresh_token)
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_i64().unwrap_or(3600) as u64,
        obtained_at: Utc::now().timestamp() as u64,
    })
}
