use serde::{Deserialize, Serialize};

use crate::model::Platform;

/// Connection to the text generation service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    /// Chat-completions URL.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContent {
    pub topic: String,
    pub platform: Platform,
    #[serde(default)]
    pub tone: Option<String>,
    /// Rough word count.
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub prompt: String,
    pub text: String,
    pub model: String,
}
