use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::{Client, Error as ReqwestError, StatusCode};
use std::time::Instant;
use log::{debug, info};

/// A raw HTTP exchange result. Status and headers are kept alongside the body
/// so callers can interpret redirects and `Set-Cookie` headers themselves;
/// the shared client never follows redirects on their behalf.
#[derive(Debug)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Debug)]
pub enum NetworkError {
    Transport(ReqwestError),
}

impl From<ReqwestError> for NetworkError {
    fn from(err: ReqwestError) -> NetworkError {
        NetworkError::Transport(err)
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::Transport(e) => write!(f, "HTTP transport error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkError::Transport(e) => Some(e),
        }
    }
}

/// Performs a GET, attaching `cookie` as the `Cookie` header when given.
pub async fn get_page(
    client: &Client,
    url: &str,
    cookie: Option<&str>,
) -> Result<FetchedPage, NetworkError> {
    let mut request = client.get(url);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }

    let start_time = Instant::now();
    let response = request.send().await?;
    info!("[TIMING] GET {} took {:.2?}", url, start_time.elapsed());

    into_page(response).await
}

/// Performs a form-encoded POST, attaching `cookie` as the `Cookie` header
/// when given. An empty `form` slice still sends the urlencoded content type,
/// which the users endpoint expects.
pub async fn post_form(
    client: &Client,
    url: &str,
    form: &[(&str, &str)],
    cookie: Option<&str>,
) -> Result<FetchedPage, NetworkError> {
    let mut request = client.post(url).form(form);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    debug!("[API] POST {} form fields: {:?}", url, form.iter().map(|(k, _)| *k).collect::<Vec<_>>());

    let start_time = Instant::now();
    let response = request.send().await?;
    info!("[TIMING] POST {} took {:.2?}", url, start_time.elapsed());

    into_page(response).await
}

async fn into_page(response: reqwest::Response) -> Result<FetchedPage, NetworkError> {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;
    debug!("[API] response status {} ({} body bytes)", status, body.len());
    Ok(FetchedPage { status, headers, body })
}

/// Collects cookie pairs from every `Set-Cookie` header on a response,
/// dropping attributes (`Path`, `HttpOnly`, ...) so the result can be sent
/// back verbatim in a `Cookie` header.
pub fn session_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(|pair| pair.trim().to_string())
        .filter(|pair| !pair.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn strips_cookie_attributes() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("JSESSIONID=abc123; Path=/; HttpOnly"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=en"));
        assert_eq!(session_cookies(&headers), vec!["JSESSIONID=abc123", "lang=en"]);
    }

    #[test]
    fn no_set_cookie_yields_empty() {
        assert!(session_cookies(&HeaderMap::new()).is_empty());
    }
}
