use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{GhAssessError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("ghassess/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Result of checking whether a GitHub account exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found,
    NotFound,
    /// Any other status or a transport failure.
    Inconclusive(String),
}

pub struct GitHubClient {
    client: Client,
    api_url: Url,
    token: Token,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GhAssessError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(base_url)
            .map_err(|e| GhAssessError::Config(format!("Invalid GitHub API URL: {e}")))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.token.as_str())
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    /// `users/{username}{suffix}` below the API root.
    fn user_url(&self, username: &str, suffix: &str) -> Result<Url> {
        self.api_url
            .join(&format!("users/{}{suffix}", urlencoding::encode(username)))
            .map_err(|e| GhAssessError::Config(format!("Invalid user URL: {e}")))
    }

    /// GET `users/{username}{suffix}` and decode the body into `T`.
    pub(super) async fn get_user_resource<T: DeserializeOwned>(
        &self,
        username: &str,
        suffix: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.user_url(username, suffix)?;
        let endpoint = url.path().to_string();
        debug!("GET {endpoint}");

        let request = self.auth_request(self.client.get(url).query(query));
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GhAssessError::Upstream { status });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| GhAssessError::Schema { endpoint, source })
    }

    pub async fn probe_user(&self, username: &str) -> ProbeOutcome {
        let url = match self.user_url(username, "") {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::Inconclusive(e.to_string()),
        };

        match self.auth_request(self.client.get(url)).send().await {
            Ok(response) if response.status() == StatusCode::NOT_FOUND => ProbeOutcome::NotFound,
            Ok(response) if response.status().is_success() => ProbeOutcome::Found,
            Ok(response) => ProbeOutcome::Inconclusive(response.status().to_string()),
            Err(e) => ProbeOutcome::Inconclusive(e.to_string()),
        }
    }
}
