use crate::auth::Session;
use crate::checkcode;
use crate::config::Config;
use crate::network_client::{self, NetworkError};
use crate::tokens::TokenSet;
use crate::utils;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde_json::Value;

#[derive(Debug)]
pub enum ApiError {
    RequestFailed { status: StatusCode, body: String },
    UnexpectedShape(String),
    InvalidJson(serde_json::Error),
    Transport(NetworkError),
}

impl From<NetworkError> for ApiError {
    fn from(err: NetworkError) -> ApiError {
        ApiError::Transport(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> ApiError {
        ApiError::InvalidJson(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::RequestFailed { status, body } => {
                write!(f, "API request failed ({}). Server response: {}", status, body)
            }
            ApiError::UnexpectedShape(context) => {
                write!(f, "Unexpected API response shape: {}", context)
            }
            ApiError::InvalidJson(e) => write!(f, "JSON deserialization error: {}", e),
            ApiError::Transport(e) => write!(f, "API transport error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::InvalidJson(e) => Some(e),
            ApiError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Fetches the user list: an empty-body POST to the users endpoint with the
/// session cookie attached. The records are opaque pass-through JSON.
pub async fn fetch_users(
    client: &Client,
    config: &Config,
    session: &Session,
) -> Result<Vec<Value>, ApiError> {
    let users_url = config.users_url();
    info!("Fetching user list...");

    let page =
        network_client::post_form(client, &users_url, &[], Some(session.cookie_header())).await?;
    if !page.status.is_success() {
        return Err(ApiError::RequestFailed { status: page.status, body: page.body });
    }

    let value: Value = serde_json::from_str(&page.body)?;
    match value {
        Value::Array(users) => {
            info!("Fetched {} users", users.len());
            Ok(users)
        }
        other => Err(ApiError::UnexpectedShape(format!(
            "users endpoint returned {} instead of an array",
            json_kind(&other)
        ))),
    }
}

/// Fetches the authenticated user's settings via the signed endpoint.
///
/// The timestamp is generated here, immediately before checkcode derivation,
/// so the pair stays inside the server's validation window. A non-2xx
/// response is an expected operational failure when the checkcode
/// reconstruction is wrong, so the server body is carried for diagnostics.
pub async fn fetch_settings(
    client: &Client,
    config: &Config,
    session: &Session,
    tokens: &TokenSet,
) -> Result<Value, ApiError> {
    let settings_url = config.settings_url();

    let timestamp = utils::unix_timestamp().to_string();
    let code = checkcode::compute_checkcode(tokens, &timestamp);
    debug!("Signing settings request at timestamp {}", timestamp);

    let form = [
        ("access_token", tokens.access_token.as_str()),
        ("apiuser", tokens.apiuser.as_str()),
        ("language", tokens.language.as_str()),
        ("openId", tokens.open_id.as_str()),
        ("operateId", tokens.operate_id.as_str()),
        ("timestamp", timestamp.as_str()),
        ("userId", tokens.user_id.as_str()),
        ("checkcode", code.as_str()),
    ];

    info!("Fetching authenticated user settings...");
    let page =
        network_client::post_form(client, &settings_url, &form, Some(session.cookie_header()))
            .await?;
    if !page.status.is_success() {
        return Err(ApiError::RequestFailed { status: page.status, body: page.body });
    }

    Ok(serde_json::from_str(&page.body)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
