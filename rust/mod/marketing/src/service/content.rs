use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use clinic_core::{Principal, ServiceError};

use crate::model::{GenerateContent, GeneratedContent, Platform};
use crate::service::{require_writer, MarketingService};

const DEFAULT_LENGTH: u32 = 150;
const MAX_LENGTH: u32 = 1_000;

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

fn platform_style(platform: Platform) -> &'static str {
    match platform {
        Platform::Facebook => "a Facebook post with a friendly hook and a clear call to book",
        Platform::Google => "Google search ad copy with a short headline and description",
        Platform::TikTok => "a TikTok video script with a strong opening line",
        Platform::Zalo => "a Zalo message to existing customers, short and personal",
        Platform::Other => "general advertising copy",
    }
}

/// Assemble the instruction sent to the generator.
pub fn build_prompt(input: &GenerateContent) -> Result<String, ServiceError> {
    let topic = input.topic.trim();
    if topic.is_empty() {
        return Err(ServiceError::Validation("topic is required".into()));
    }
    let length = input.length.unwrap_or(DEFAULT_LENGTH).clamp(20, MAX_LENGTH);
    let mut prompt = format!(
        "Write {} for a beauty clinic about: {topic}.\nLength: about {length} words.",
        platform_style(input.platform)
    );
    if let Some(tone) = input.tone.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!("\nTone: {tone}."));
    }
    let keywords: Vec<&str> = input
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        prompt.push_str(&format!("\nInclude these keywords: {}.", keywords.join(", ")));
    }
    prompt.push_str("\nDo not promise medical outcomes.");
    Ok(prompt)
}

impl MarketingService {
    /// Generate ad copy through the configured text generation service.
    pub async fn generate_content(
        &self,
        caller: &Principal,
        input: GenerateContent,
    ) -> Result<GeneratedContent, ServiceError> {
        require_writer(caller)?;
        if !self.ai.is_configured() {
            return Err(ServiceError::Validation("content generation is not configured".into()));
        }
        let prompt = build_prompt(&input)?;

        let resp = self
            .http
            .post(&self.ai.endpoint)
            .bearer_auth(&self.ai.api_key)
            .json(&json!({
                "model": self.ai.model,
                "messages": [
                    {"role": "system", "content": "You write marketing copy for a beauty clinic."},
                    {"role": "user", "content": prompt},
                ],
            }))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("content generation request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "content generation rejected");
            return Err(ServiceError::Internal(format!(
                "content generation returned {status}: {body}"
            )));
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Internal(format!("content generation response parse failed: {e}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::Internal("content generation returned no text".into()))?;

        info!(by = %caller.staff_id, platform = %input.platform, chars = text.len(), "generated content");
        Ok(GeneratedContent {
            prompt,
            text,
            model: parsed.model.unwrap_or_else(|| self.ai.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::model::AiConfig;
    use crate::service::testing::{marketer, service, service_with};

    fn input() -> GenerateContent {
        GenerateContent {
            topic: "acne treatment".into(),
            platform: Platform::TikTok,
            tone: Some("playful".into()),
            length: None,
            keywords: vec!["clear skin".into(), " ".into(), "summer".into()],
        }
    }

    async fn upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/v1/chat/completions")
    }

    fn config(endpoint: String) -> AiConfig {
        AiConfig { endpoint, api_key: "k".into(), model: "test-model".into() }
    }

    #[test]
    fn prompt_mentions_inputs() {
        let prompt = build_prompt(&input()).unwrap();
        assert!(prompt.contains("acne treatment"));
        assert!(prompt.contains("TikTok"));
        assert!(prompt.contains("Tone: playful."));
        assert!(prompt.contains("clear skin, summer"));
        assert!(prompt.contains("about 150 words"));

        let mut empty = input();
        empty.topic = "  ".into();
        assert!(matches!(build_prompt(&empty), Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unconfigured_is_validation() {
        let svc = service();
        assert!(matches!(
            svc.generate_content(&marketer(), input()).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn returns_generated_text() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "test-model");
                Json(json!({"model": "test-model", "choices": [{"message": {"content": " Glow up! "}}]}))
            }),
        );
        let svc = service_with(config(upstream(app).await));
        let out = svc.generate_content(&marketer(), input()).await.unwrap();
        assert_eq!(out.text, "Glow up!");
        assert_eq!(out.model, "test-model");
    }

    #[tokio::test]
    async fn upstream_failure_is_internal() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let svc = service_with(config(upstream(app).await));
        match svc.generate_content(&marketer(), input()).await {
            Err(ServiceError::Internal(msg)) => assert!(msg.contains("503")),
            other => panic!("expected internal error, got {other:?}"),
        }
    }
}
