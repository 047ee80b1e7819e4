use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::types::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
    pub platforms: PlatformsConfig,
    pub doccloud: DocCloudConfig,
    /// Offline classification and mock delivery
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl LLMConfig {
    /// Demo keys ship in sample `.env` files and can never reach the API.
    pub fn is_demo_key(&self) -> bool {
        self.openai_api_key.starts_with("sk-demo")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_upload_size: usize,
    pub supported_file_types: Vec<String>,
}

impl UploadConfig {
    pub fn is_supported(&self, extension: &str) -> bool {
        self.supported_file_types.iter().any(|t| t == extension)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub language: String,
    pub tessdata_dir: Option<String>,
}

/// Base API URLs for the generic platform registry.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsConfig {
    pub sharepoint_api_url: String,
    pub box_api_url: String,
    pub dropbox_api_url: String,
    pub gdrive_api_url: String,
    pub onedrive_api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocCloudConfig {
    pub api_url: String,
    pub api_key: String,
    pub client_id: String,
    pub client_secret: String,
}

impl DocCloudConfig {
    /// Names of the credential variables that are unset.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_empty() {
            missing.push("BU_DOCCLOUD_API_KEY");
        }
        if self.client_id.is_empty() {
            missing.push("BU_DOCCLOUD_CLIENT_ID");
        }
        if self.client_secret.is_empty() {
            missing.push("BU_DOCCLOUD_CLIENT_SECRET");
        }
        missing
    }
}

const DEFAULT_SUPPORTED_FILE_TYPES: &str = ".pdf,.jpg,.jpeg,.png,.tiff,.txt,.doc,.docx,.csv";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. `from_env` is
    /// the production entry point; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                port: parse_var(&lookup, "PORT", 8000)?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: split_list(&var("ALLOWED_ORIGINS", "*")),
            },
            llm: LLMConfig {
                openai_api_key: var("OPENAI_API_KEY", ""),
                base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: var("LLM_MODEL", "gpt-4o"),
                temperature: parse_var(&lookup, "LLM_TEMPERATURE", 0.0)?,
            },
            upload: UploadConfig {
                max_upload_size: parse_var(&lookup, "MAX_UPLOAD_SIZE", 50_000_000)?,
                supported_file_types: split_list(&var(
                    "SUPPORTED_FILE_TYPES",
                    DEFAULT_SUPPORTED_FILE_TYPES,
                ))
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect(),
            },
            ocr: OcrConfig {
                language: var("OCR_LANGUAGE", "eng"),
                tessdata_dir: lookup("TESSDATA_PREFIX"),
            },
            platforms: PlatformsConfig {
                sharepoint_api_url: var("SHAREPOINT_API_URL", ""),
                box_api_url: var("BOX_API_URL", "https://api.box.com/2.0"),
                dropbox_api_url: var("DROPBOX_API_URL", "https://api.dropboxapi.com/2"),
                gdrive_api_url: var("GDRIVE_API_URL", "https://www.googleapis.com/drive/v3"),
                onedrive_api_url: var(
                    "ONEDRIVE_API_URL",
                    "https://graph.microsoft.com/v1.0/me/drive",
                ),
            },
            doccloud: DocCloudConfig {
                api_url: var("BU_DOCCLOUD_API_URL", "https://api.doccloud.BU.com/v1"),
                api_key: var("BU_DOCCLOUD_API_KEY", ""),
                client_id: var("BU_DOCCLOUD_CLIENT_ID", ""),
                client_secret: var("BU_DOCCLOUD_CLIENT_SECRET", ""),
            },
            debug: parse_flag(lookup("DEBUG").as_deref()),
        })
    }

    /// Whether classification runs without the LLM.
    pub fn offline_classification(&self) -> bool {
        self.debug || self.llm.is_demo_key()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
