use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::OcrConfig;
use crate::error::{Result, SnaptextError};

/// Client for a local model daemon (Ollama-style API).
///
/// The daemon's chat endpoint takes image file paths, not inline payloads,
/// so each request round-trips through a uniquely named temp file that is
/// removed on every exit path.
#[derive(Clone, Debug)]
pub struct LocalClient {
    client: Client,
    base_url: String,
    model: String,
    temp_dir: PathBuf,
    // Shared across clones so concurrent first requests trigger one pull.
    ready: Arc<OnceCell<()>>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest {
    name: String,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Scoped temp file: created on construction, removed on drop. Drop runs on
/// success, error, and future-cancellation paths alike.
#[derive(Debug)]
struct TempImageFile {
    path: PathBuf,
}

impl TempImageFile {
    async fn create(dir: &Path, bytes: &[u8]) -> Result<Self> {
        let path = dir.join(format!("snaptext-{}.jpg", Uuid::new_v4()));
        let guard = Self { path };
        tokio::fs::write(&guard.path, bytes).await?;
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempImageFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove temp image: {e}");
            }
        }
    }
}

impl LocalClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SnaptextError::Provider(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.local_base_url.clone(),
            model: config.local_model.clone(),
            temp_dir: config.temp_dir(),
            ready: Arc::new(OnceCell::new()),
        })
    }

    /// One-time readiness check: verify the model is present (pulling it if
    /// not), then confirm the daemon responds to a trivial generation.
    /// Synchronized so concurrent first requests do not race duplicate pulls.
    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                if !self.model_present().await? {
                    tracing::info!(model = %self.model, "model not present on local daemon, pulling");
                    self.pull_model().await?;
                }
                self.warm_up().await?;
                tracing::info!(model = %self.model, "local daemon ready");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn model_present(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Local daemon unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(SnaptextError::Provider(format!(
                "Local daemon tag listing failed: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Failed to parse tag listing: {e}")))?;

        // Daemon tags carry a version suffix ("model:latest"); match either.
        Ok(tags.models.iter().any(|m| {
            m.name == self.model || m.name.split(':').next() == Some(self.model.as_str())
        }))
    }

    async fn pull_model(&self) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&PullRequest {
                name: self.model.clone(),
                stream: false,
            })
            .send()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Model pull failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SnaptextError::Provider(format!(
                "Model pull failed: {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn warm_up(&self) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: self.model.clone(),
                prompt: "Respond with OK.".to_string(),
                stream: false,
            })
            .send()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Warm-up generation failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SnaptextError::Provider(format!(
                "Warm-up generation failed: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Send one transcription request through the daemon's chat endpoint.
    pub async fn extract_text(&self, base64_image: &str, prompt: &str) -> Result<String> {
        self.ensure_ready().await?;

        let bytes = STANDARD
            .decode(base64_image)
            .map_err(|e| SnaptextError::Internal(format!("Invalid base64 payload: {e}")))?;

        let temp_file = TempImageFile::create(&self.temp_dir, &bytes).await?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
                images: vec![temp_file.path().display().to_string()],
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Local chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnaptextError::Provider(format!(
                "Local chat request failed: {status} - {body}"
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| SnaptextError::Provider(format!("Failed to parse response: {e}")))?;

        chat_response
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| {
                SnaptextError::UnexpectedResponseShape(
                    "local daemon response missing message.content".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(temp_dir: Option<PathBuf>) -> OcrConfig {
        OcrConfig {
            default_provider: "local".to_string(),
            hosted_model: "test-model".to_string(),
            hosted_base_url: "https://example.com/v1".to_string(),
            local_model: "test-vision".to_string(),
            local_base_url: "http://localhost:11434".to_string(),
            timeout_secs: 5,
            max_image_dimension: 512,
            jpeg_quality: 85,
            system_prompt: None,
            temp_dir,
        }
    }

    #[test]
    fn temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = tokio_test::block_on(async {
            let guard = TempImageFile::create(dir.path(), b"jpeg bytes")
                .await
                .unwrap();
            assert!(guard.path().exists());
            guard.path().to_path_buf()
        });
        assert!(!path.exists());
    }

    #[test]
    fn temp_files_get_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        tokio_test::block_on(async {
            let a = TempImageFile::create(dir.path(), b"a").await.unwrap();
            let b = TempImageFile::create(dir.path(), b"b").await.unwrap();
            assert_ne!(a.path(), b.path());
        });
    }

    #[test]
    fn clones_share_readiness_state() {
        let client = LocalClient::new(&test_config(None)).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.ready, &clone.ready));
    }

    #[test]
    fn tag_listing_matches_versioned_names() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"test-vision:latest"},{"name":"other:7b"}]}"#,
        )
        .unwrap();
        let client = LocalClient::new(&test_config(None)).unwrap();
        assert!(tags.models.iter().any(|m| {
            m.name == client.model || m.name.split(':').next() == Some(client.model.as_str())
        }));
    }

    #[test]
    fn chat_response_without_content_is_detected() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(parsed.message.and_then(|m| m.content).is_none());
    }
}
