use clap::Parser;
use std::path::PathBuf;
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Run configuration. Credentials are never hardcoded: they come from flags
/// or the USERFETCH_USERNAME / USERFETCH_PASSWORD environment variables.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about = "Log into a legacy webapp and export users + signed settings as JSON", long_about = None)]
pub struct Config {
    /// Login username (usually an email address).
    #[clap(long, env = "USERFETCH_USERNAME")]
    pub username: String,

    /// Login password.
    #[clap(long, env = "USERFETCH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Base URL of the web application (login page, users API, token page).
    /// Validated at parse time; an invalid URL fails the run before any
    /// network call.
    #[clap(long, default_value = "https://challenge.sunvoy.com")]
    pub base_url: Url,

    /// Base URL of the signed settings API. Defaults to the main base URL.
    #[clap(long)]
    pub api_base_url: Option<Url>,

    /// Path of the combined JSON output file.
    #[clap(long, default_value = "users.json")]
    pub output: PathBuf,

    /// User-Agent sent on every request. Some deployments fingerprint
    /// automated clients by header set, so this is configurable.
    #[clap(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Accept-Language sent on every request.
    #[clap(long, default_value = "en-US,en;q=0.5")]
    pub accept_language: String,

    /// Per-request timeout in seconds.
    #[clap(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    fn api_base(&self) -> &Url {
        self.api_base_url.as_ref().unwrap_or(&self.base_url)
    }

    pub fn login_url(&self) -> String {
        endpoint(&self.base_url, "/login")
    }

    pub fn users_url(&self) -> String {
        endpoint(&self.base_url, "/api/users")
    }

    pub fn tokens_url(&self) -> String {
        endpoint(&self.base_url, "/settings/tokens")
    }

    pub fn settings_url(&self) -> String {
        endpoint(self.api_base(), "/api/settings")
    }
}

fn endpoint(base: &Url, path: &str) -> String {
    let mut url = base.clone();
    url.set_path(path);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(base: &str, api: Option<&str>) -> Config {
        Config {
            username: "demo@example.org".to_string(),
            password: "test".to_string(),
            base_url: Url::parse(base).unwrap(),
            api_base_url: api.map(|u| Url::parse(u).unwrap()),
            output: PathBuf::from("users.json"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn endpoint_urls_normalize_trailing_slash() {
        let config = config_with("https://app.example.com/", None);
        assert_eq!(config.login_url(), "https://app.example.com/login");
        assert_eq!(config.users_url(), "https://app.example.com/api/users");
        assert_eq!(config.tokens_url(), "https://app.example.com/settings/tokens");

        let bare = config_with("https://app.example.com", None);
        assert_eq!(bare.login_url(), "https://app.example.com/login");
    }

    #[test]
    fn settings_url_prefers_api_base() {
        let config = config_with("https://app.example.com", Some("https://api.example.com"));
        assert_eq!(config.settings_url(), "https://api.example.com/api/settings");

        let fallback = config_with("https://app.example.com", None);
        assert_eq!(fallback.settings_url(), "https://app.example.com/api/settings");
    }

    #[test]
    fn invalid_base_url_is_rejected_at_parse_time() {
        let result = Config::try_parse_from([
            "userfetch",
            "--username",
            "demo@example.org",
            "--password",
            "test",
            "--base-url",
            "not a url",
        ]);
        assert!(result.is_err());
    }
}
