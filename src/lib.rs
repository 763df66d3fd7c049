//! Session-authentication and request-signing pipeline for a legacy webapp:
//! nonce-based login, cookie threading, dynamic-token scraping, SHA-1
//! checkcode signing, and combined JSON export.

pub mod aggregator;
pub mod api_client;
pub mod auth;
pub mod checkcode;
pub mod config;
pub mod html_parser;
pub mod network_client;
pub mod tokens;
pub mod utils;

use config::Config;
use log::info;
use once_cell::sync::Lazy;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    PRAGMA, USER_AGENT,
};
use reqwest::{redirect, Client};
use std::time::Duration;

static BASE_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("document"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("navigate"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("same-origin"));
    headers
});

/// Top-level pipeline error, naming the stage that failed.
#[derive(Debug)]
pub enum AppError {
    Client(reqwest::Error),
    Auth(auth::AuthError),
    Api(api_client::ApiError),
    Token(tokens::TokenError),
    Persist(aggregator::PersistError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Client(e) => write!(f, "HTTP client setup failed: {}", e),
            AppError::Auth(e) => write!(f, "Authentication stage failed: {}", e),
            AppError::Api(e) => write!(f, "API stage failed: {}", e),
            AppError::Token(e) => write!(f, "Token-fetch stage failed: {}", e),
            AppError::Persist(e) => write!(f, "Persistence stage failed: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Client(e) => Some(e),
            AppError::Auth(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::Token(e) => Some(e),
            AppError::Persist(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Client(err)
    }
}

impl From<auth::AuthError> for AppError {
    fn from(err: auth::AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<api_client::ApiError> for AppError {
    fn from(err: api_client::ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<tokens::TokenError> for AppError {
    fn from(err: tokens::TokenError) -> Self {
        AppError::Token(err)
    }
}

impl From<aggregator::PersistError> for AppError {
    fn from(err: aggregator::PersistError) -> Self {
        AppError::Persist(err)
    }
}

/// Builds the shared HTTP client: browser-like default headers (user-agent
/// and accept-language come from config so the fingerprint is adjustable),
/// per-request timeout, and redirect following disabled so the login 302 is
/// observable. Cookies are threaded explicitly as `Session` values, never via
/// a client-level jar.
pub fn build_client(config: &Config) -> Result<Client, AppError> {
    let mut headers = BASE_HEADERS.clone();
    if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
        headers.insert(USER_AGENT, ua);
    }
    if let Ok(lang) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, lang);
    }

    let client = Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Runs the full pipeline, strictly sequential and fail-fast: authenticate,
/// fetch users, fetch tokens, fetch signed settings, persist the combined
/// result. Nothing is written unless every stage succeeded.
pub async fn run(client: &Client, config: &Config) -> Result<(), AppError> {
    let session = auth::authenticate(client, config).await?;
    let users = api_client::fetch_users(client, config, &session).await?;
    let token_set = tokens::fetch_tokens(client, config, &session).await?;
    let settings = api_client::fetch_settings(client, config, &session, &token_set).await?;

    let endpoints = vec![config.users_url(), config.tokens_url(), config.settings_url()];
    let combined = aggregator::combine(users, settings, endpoints);
    aggregator::write_combined(&config.output, &combined)?;

    info!("Pipeline complete");
    Ok(())
}
