use serde::{Deserialize, Serialize};

pub const DEFAULT_OAUTH_URL: &str = "https://www.deviantart.com/oauth2";
pub const DEFAULT_API_URL: &str = "https://www.deviantart.com/api/v1/oauth2";

/// URLs base do provedor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub oauth_base_url: String,
    pub api_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_OAUTH_URL, DEFAULT_API_URL)
    }
}

impl Endpoints {
    pub fn new(oauth_base_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            oauth_base_url: oauth_base_url.into().trim_end_matches('/').to_string(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.oauth_base_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.oauth_base_url)
    }

    pub fn placebo_url(&self) -> String {
        self.resource_url("placebo")
    }

    /// URL completa de um endpoint de recurso (`user/whoami`, `stash/submit`, ...)
    pub fn resource_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base_url, endpoint.trim_start_matches('/'))
    }
}
