use std::env;
use std::path::PathBuf;

use serde::Deserialize;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Default instruction sent to the vision model when the request does not
/// override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
Transcribe all visible text in the image into markdown.
Rules:
1. Preserve the reading order of the original page.
2. Use markdown headings, lists, and tables where the layout implies them.
3. Transcribe the text exactly; do not describe the image or add commentary.
4. If no text is visible, return an empty response.";

/// File extensions accepted on upload (lowercase, with leading dot).
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Provider used when the request does not name one.
    pub default_provider: String,
    /// Model identifier sent to the hosted chat-completions API.
    pub hosted_model: String,
    /// Base URL of the hosted API (no trailing slash).
    pub hosted_base_url: String,
    /// Model name expected on (and pulled into) the local daemon.
    pub local_model: String,
    /// Base URL of the local daemon (no trailing slash).
    pub local_base_url: String,
    /// Bound on every outbound provider call.
    pub timeout_secs: u64,
    /// Larger dimension of a normalized image never exceeds this.
    pub max_image_dimension: u32,
    /// Quality for the JPEG re-encode step.
    pub jpeg_quality: u8,
    /// Default instruction prompt; `None` falls back to the built-in one.
    pub system_prompt: Option<String>,
    /// Directory for the local provider's ephemeral image files.
    /// `None` means the OS temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl OcrConfig {
    pub fn prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("SNAPTEXT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("SNAPTEXT_PORT", 8008),
            },
            ocr: OcrConfig {
                default_provider: env::var("OCR_DEFAULT_PROVIDER")
                    .unwrap_or_else(|_| "local".to_string()),
                hosted_model: env::var("HOSTED_MODEL").unwrap_or_else(|_| {
                    "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo".to_string()
                }),
                hosted_base_url: env::var("HOSTED_BASE_URL")
                    .unwrap_or_else(|_| "https://api.together.xyz/v1".to_string()),
                local_model: env::var("LOCAL_MODEL")
                    .unwrap_or_else(|_| "llama3.2-vision".to_string()),
                local_base_url: env::var("LOCAL_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 120),
                max_image_dimension: parse_env_or("MAX_IMAGE_DIMENSION", 512),
                jpeg_quality: parse_env_or("JPEG_QUALITY", 85),
                system_prompt: env::var("DEFAULT_SYSTEM_PROMPT").ok(),
                temp_dir: env::var("OCR_TEMP_DIR").ok().map(PathBuf::from),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
