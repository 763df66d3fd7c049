use crate::config::Config;
use crate::html_parser::{self, ParseError};
use crate::network_client::{self, NetworkError};
use log::{debug, info};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

/// An authenticated session: the cookie pairs issued by the login redirect,
/// pre-joined into a `Cookie` header value. Only ever constructed from a 302
/// response carrying at least one `Set-Cookie` header.
#[derive(Clone)]
pub struct Session {
    cookies: String,
}

// Session cookies are credentials; Debug reports only how many pairs exist
// so they never end up in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({} cookie pair(s))", self.cookies.split("; ").count())
    }
}

impl Session {
    fn from_cookie_pairs(pairs: Vec<String>) -> Option<Session> {
        if pairs.is_empty() {
            None
        } else {
            Some(Session { cookies: pairs.join("; ") })
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookies
    }
}

#[derive(Debug)]
pub enum AuthError {
    NonceUnavailable(ParseError),
    LoginPageUnavailable { status: StatusCode },
    LoginRejected { status: StatusCode },
    MissingSessionCookie,
    Transport(NetworkError),
}

impl From<NetworkError> for AuthError {
    fn from(err: NetworkError) -> AuthError {
        AuthError::Transport(err)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NonceUnavailable(e) => write!(f, "Could not extract login nonce: {}", e),
            AuthError::LoginPageUnavailable { status } => {
                write!(f, "Login page request failed with status {}", status)
            }
            AuthError::LoginRejected { status } => write!(
                f,
                "Authentication failed: expected a 302 redirect, got {} (the login form re-renders with 200 on bad credentials)",
                status
            ),
            AuthError::MissingSessionCookie => {
                write!(f, "Login redirect carried no Set-Cookie header")
            }
            AuthError::Transport(e) => write!(f, "Authentication transport error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::NonceUnavailable(e) => Some(e),
            AuthError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Logs in and returns the authenticated session.
///
/// Phase one fetches the login page without cookies, keeping the response's
/// cookie pairs as the pre-auth jar and scraping the single-use `nonce` input.
/// Phase two posts the credentials with that jar attached and redirects
/// disabled; only a 302 response counts as success. The nonce is bound to the
/// page load it came from, so every attempt starts from a fresh fetch.
pub async fn authenticate(client: &Client, config: &Config) -> Result<Session, AuthError> {
    let login_url = config.login_url();

    info!("Fetching login page for a fresh nonce...");
    let page = network_client::get_page(client, &login_url, None).await?;
    if !page.status.is_success() {
        return Err(AuthError::LoginPageUnavailable { status: page.status });
    }

    let pre_auth_pairs = network_client::session_cookies(&page.headers);
    let nonce = html_parser::extract_input_value(&page.body, "nonce")
        .map_err(AuthError::NonceUnavailable)?;
    debug!("Pre-auth cookie pairs: {}, nonce length: {}", pre_auth_pairs.len(), nonce.len());
    let pre_auth_jar = pre_auth_pairs.join("; ");

    info!("Submitting credentials...");
    let form = [
        ("nonce", nonce.as_str()),
        ("username", config.username.as_str()),
        ("password", config.password.as_str()),
    ];
    let cookie = if pre_auth_jar.is_empty() { None } else { Some(pre_auth_jar.as_str()) };
    let response = network_client::post_form(client, &login_url, &form, cookie).await?;

    let session = interpret_login_response(response.status, &response.headers)?;
    info!("Authentication successful, session cookies obtained");
    Ok(session)
}

/// Pure interpretation of the credential-phase response. A 302 with cookies is
/// the only success shape; the form answers 200 when credentials are wrong.
pub fn interpret_login_response(
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<Session, AuthError> {
    if status != StatusCode::FOUND {
        return Err(AuthError::LoginRejected { status });
    }
    Session::from_cookie_pairs(network_client::session_cookies(headers))
        .ok_or(AuthError::MissingSessionCookie)
}
