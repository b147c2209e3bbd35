//! Generation endpoint resolution.

use chatrelay_error::{ChatRelayError, ChatRelayResult};
use url::Url;

/// Path appended to a base URL to reach the generation route.
const GENERATE_PATH: &str = "generate";

/// Fully resolved URL that prompts are POSTed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationEndpoint(Url);

impl GenerationEndpoint {
    /// Resolves `<base_url>/generate`.
    ///
    /// A trailing slash on the base URL is tolerated.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatrelay_backend::GenerationEndpoint;
    ///
    /// let endpoint = GenerationEndpoint::from_base_url("http://localhost:8000/").unwrap();
    /// assert_eq!(endpoint.as_str(), "http://localhost:8000/generate");
    ///
    /// let nested = GenerationEndpoint::from_base_url("https://example.com/v1").unwrap();
    /// assert_eq!(nested.as_str(), "https://example.com/v1/generate");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the URL does not parse or is not http(s).
    #[track_caller]
    pub fn from_base_url(base_url: &str) -> ChatRelayResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Self::verbatim(&format!("{}/{}", trimmed, GENERATE_PATH))
    }

    /// Uses `url` exactly as given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the URL does not parse or is not http(s).
    #[track_caller]
    pub fn verbatim(url: &str) -> ChatRelayResult<Self> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            ChatRelayError::configuration(format!("Invalid generation URL '{}': {}", url, e))
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(Self(parsed)),
            other => Err(ChatRelayError::configuration(format!(
                "Generation URL must be http or https, got '{}'",
                other
            ))),
        }
    }

    /// The resolved URL.
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// The resolved URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for GenerationEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
