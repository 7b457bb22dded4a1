use std::str::FromStr;

use crate::config::OcrConfig;
use crate::error::{Result, SnaptextError};
use crate::ocr::hosted::HostedClient;
use crate::ocr::local::LocalClient;

/// The closed set of text-extraction backends selectable per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Hosted chat-completions API; requires a caller-supplied credential.
    Hosted,
    /// Local model daemon; no credential.
    Local,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Hosted => "hosted",
            Provider::Local => "local",
        }
    }

    pub fn requires_credential(&self) -> bool {
        matches!(self, Provider::Hosted)
    }
}

impl FromStr for Provider {
    type Err = SnaptextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hosted" => Ok(Provider::Hosted),
            "local" => Ok(Provider::Local),
            other => Err(SnaptextError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-selected extractor. One capability, two request/response shapes.
#[derive(Clone, Debug)]
pub enum Extractor {
    Hosted(HostedClient),
    Local(LocalClient),
}

impl Extractor {
    /// Extract visible text from a base64-encoded normalized image.
    ///
    /// Failures are terminal for the request; neither variant retries.
    pub async fn extract_text(
        &self,
        base64_image: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        match self {
            Extractor::Hosted(client) => client.extract_text(base64_image, mime_type, prompt).await,
            Extractor::Local(client) => client.extract_text(base64_image, prompt).await,
        }
    }
}

/// Builds extractors per request while holding the one process-wide
/// `LocalClient`, so the local daemon's pull/warm-up happens once regardless
/// of how many requests select it.
#[derive(Clone, Debug)]
pub struct ExtractorFactory {
    config: OcrConfig,
    local: LocalClient,
}

impl ExtractorFactory {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            local: LocalClient::new(config)?,
        })
    }

    /// Resolve a provider to its extractor. The hosted variant demands a
    /// non-empty credential here, before any network activity.
    pub fn create(&self, provider: Provider, api_key: Option<&str>) -> Result<Extractor> {
        match provider {
            Provider::Hosted => {
                let key = api_key
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| {
                        SnaptextError::MissingCredential(
                            "API key is required for the hosted provider.".to_string(),
                        )
                    })?;
                Ok(Extractor::Hosted(HostedClient::new(
                    &self.config,
                    key.to_string(),
                )?))
            }
            Provider::Local => Ok(Extractor::Local(self.local.clone())),
        }
    }
}
