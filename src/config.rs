use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub server: String,
    /// Overrides the OS login name used for basic auth (Jira Cloud wants an email here).
    pub username: Option<String>,
    pub issue_type_id: String,
    pub api_version: ApiVersion,
    pub fields: FieldKeys,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: "https://yourdomain.atlassian.net".into(),
            username: None,
            issue_type_id: "7".into(),
            api_version: ApiVersion::V2,
            fields: FieldKeys::default(),
        }
    }
}

/// Tracker-specific keys for the custom fields an imported issue fills in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldKeys {
    pub product_owner: String,
    pub team: String,
    pub epic: String,
    pub acceptance_criteria: String,
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            product_owner: "customfield_10811".into(),
            team: "customfield_11248".into(),
            epic: "customfield_10400".into(),
            acceptance_criteria: "customfield_17600".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u8")]
pub enum ApiVersion {
    #[default]
    V2,
    V3,
}

impl ApiVersion {
    pub fn path_segment(self) -> &'static str {
        match self {
            ApiVersion::V2 => "2",
            ApiVersion::V3 => "3",
        }
    }
}

impl TryFrom<u8> for ApiVersion {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(ApiVersion::V2),
            3 => Ok(ApiVersion::V3),
            other => Err(format!("unsupported Jira REST API version {other} (expected 2 or 3)")),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ImportConfig {
    pub on_error: FailurePolicy,
}

/// What the submitter does with the remaining rows after one fails.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Halt,
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".localpipeline")
        .join("jira-import.toml")
}

/// Load the default config file, falling back to built-in defaults when it doesn't exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    load_config_from(&path)
}

/// Load an explicitly chosen config file. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    Ok(config)
}
