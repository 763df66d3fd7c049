use crate::auth::Session;
use crate::config::Config;
use crate::html_parser::{self, ParseError};
use crate::network_client::{self, NetworkError};
use log::{debug, info};
use reqwest::{Client, StatusCode};

/// Hidden-input names on the settings token page, as the server renders them.
pub const TOKEN_FIELDS: [&str; 6] = [
    "access_token",
    "openId",
    "userId",
    "apiuser",
    "operateId",
    "language",
];

/// Per-session dynamic tokens required to construct a signed request.
/// Tokens rotate between sessions, so a set is fetched fresh per run,
/// immediately before signing, and never cached.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub open_id: String,
    pub user_id: String,
    pub apiuser: String,
    pub operate_id: String,
    pub language: String,
}

#[derive(Debug)]
pub enum TokenError {
    TokenUnavailable { field: String, source: ParseError },
    PageRequestFailed { status: StatusCode },
    Transport(NetworkError),
}

impl From<NetworkError> for TokenError {
    fn from(err: NetworkError) -> TokenError {
        TokenError::Transport(err)
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::TokenUnavailable { field, source } => {
                write!(f, "Required token '{}' unavailable: {}", field, source)
            }
            TokenError::PageRequestFailed { status } => {
                write!(f, "Token page request failed with status {}", status)
            }
            TokenError::Transport(e) => write!(f, "Token page transport error: {}", e),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TokenError::TokenUnavailable { source, .. } => Some(source),
            TokenError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Fetches the settings token page with the session cookie attached and
/// extracts all six dynamic tokens. A partial set never proceeds to signing.
pub async fn fetch_tokens(
    client: &Client,
    config: &Config,
    session: &Session,
) -> Result<TokenSet, TokenError> {
    let tokens_url = config.tokens_url();
    info!("Fetching dynamic tokens from settings page...");

    let page = network_client::get_page(client, &tokens_url, Some(session.cookie_header())).await?;
    if !page.status.is_success() {
        return Err(TokenError::PageRequestFailed { status: page.status });
    }

    let tokens = parse_token_page(&page.body)?;
    debug!("All {} dynamic tokens extracted", TOKEN_FIELDS.len());
    Ok(tokens)
}

/// Extracts the six token fields from the settings page HTML, one generic
/// input lookup per field name.
pub fn parse_token_page(html: &str) -> Result<TokenSet, TokenError> {
    let field = |name: &str| {
        html_parser::extract_input_value(html, name).map_err(|source| {
            TokenError::TokenUnavailable { field: name.to_string(), source }
        })
    };

    Ok(TokenSet {
        access_token: field("access_token")?,
        open_id: field("openId")?,
        user_id: field("userId")?,
        apiuser: field("apiuser")?,
        operate_id: field("operateId")?,
        language: field("language")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_page(skip: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        for (field, value) in [
            ("access_token", "tok"),
            ("openId", "oid"),
            ("userId", "uid"),
            ("apiuser", "api"),
            ("operateId", "op"),
            ("language", "en_US"),
        ] {
            if Some(field) != skip {
                html.push_str(&format!(r#"<input type="hidden" id="{0}" name="{0}" value="{1}">"#, field, value));
            }
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn full_page_yields_all_tokens() {
        let tokens = parse_token_page(&token_page(None)).unwrap();
        assert_eq!(tokens.access_token, "tok");
        assert_eq!(tokens.open_id, "oid");
        assert_eq!(tokens.user_id, "uid");
        assert_eq!(tokens.apiuser, "api");
        assert_eq!(tokens.operate_id, "op");
        assert_eq!(tokens.language, "en_US");
    }

    #[test]
    fn missing_user_id_fails_with_field_name() {
        match parse_token_page(&token_page(Some("userId"))) {
            Err(TokenError::TokenUnavailable { field, .. }) => assert_eq!(field, "userId"),
            other => panic!("expected TokenUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn missing_language_fails_with_field_name() {
        match parse_token_page(&token_page(Some("language"))) {
            Err(TokenError::TokenUnavailable { field, .. }) => assert_eq!(field, "language"),
            other => panic!("expected TokenUnavailable, got {:?}", other),
        }
    }
}
