use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{RequestPart, StylizeError, StylizeRequest, StylizedImage};

use super::ImageGenerationProvider;
use super::env::{parse_timeout_seconds, read_env_var};
use super::response_parsing::{refusal_explanation, truncate_message};

const PROVIDER_ID: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash-image";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ENV_API_KEY: &str = "RESTYLE_GEMINI_API_KEY";
const ENV_API_KEY_FALLBACK: &str = "GEMINI_API_KEY";
const ENV_BASE_URL: &str = "RESTYLE_GEMINI_BASE_URL";
const ENV_MODEL_ID: &str = "RESTYLE_GEMINI_MODEL";
const ENV_TIMEOUT_SECS: &str = "RESTYLE_GEMINI_TIMEOUT_SECS";

const NO_IMAGE_LIKELY_FILTERED: &str =
    "The model returned no image; the result was likely filtered.";
const NO_IMAGE_NO_EXPLANATION: &str =
    "response contained no image data and no explanation";

/// Finish reasons the API uses when a candidate was withheld for safety.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_PROHIBITED_CONTENT",
    "RECITATION",
    "IMAGE_RECITATION",
    "BLOCKLIST",
];

#[derive(Debug)]
pub struct GeminiImageProvider {
    api_key: String,
    api_base_url: String,
    model_id: String,
    client: Client,
}

impl GeminiImageProvider {
    /// Builds the provider from process environment. A missing API key is a
    /// fatal precondition reported here, before any network call is possible.
    pub fn from_env() -> Result<Self, StylizeError> {
        let api_key = read_env_var(ENV_API_KEY)?
            .or(read_env_var(ENV_API_KEY_FALLBACK)?)
            .ok_or_else(|| {
                StylizeError::validation(
                    "Gemini API key is missing (set RESTYLE_GEMINI_API_KEY or GEMINI_API_KEY)",
                )
            })?;
        let api_base_url = read_env_var(ENV_BASE_URL)?.unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let model_id = read_env_var(ENV_MODEL_ID)?.unwrap_or_else(|| DEFAULT_MODEL_ID.into());
        let timeout = match read_env_var(ENV_TIMEOUT_SECS)? {
            Some(raw) => parse_timeout_seconds(ENV_TIMEOUT_SECS, &raw)?,
            None => DEFAULT_TIMEOUT,
        };
        Self::with_config(api_key, api_base_url, model_id, timeout)
    }

    pub fn with_config(
        api_key: impl Into<String>,
        api_base_url: impl Into<String>,
        model_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StylizeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StylizeError::validation("Gemini API key must not be empty"));
        }

        let api_base_url = api_base_url.into();
        if api_base_url.trim().is_empty() {
            return Err(StylizeError::validation(
                "Gemini API base URL must not be empty",
            ));
        }

        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(StylizeError::validation(
                "Gemini model ID must not be empty",
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            StylizeError::internal(format!("failed to create Gemini HTTP client: {err}"))
        })?;

        Ok(Self {
            api_key,
            api_base_url,
            model_id,
            client,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model_id
        )
    }

    fn build_request_payload(&self, request: &StylizeRequest) -> GenerateContentRequest {
        let parts = request
            .build_parts()
            .into_iter()
            .map(|part| match part {
                RequestPart::InlineImage { mime_type, data } => WirePart::InlineData {
                    inline_data: InlineDataBody { mime_type, data },
                },
                RequestPart::Text(text) => WirePart::Text { text },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![ContentBody { parts }],
            generation_config: GenerationConfigBody {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }

    fn map_success_response(&self, response_body: &str) -> Result<StylizedImage, StylizeError> {
        let response: GenerateContentResponse =
            serde_json::from_str(response_body).map_err(|err| {
                StylizeError::invalid_response(format!("Gemini response decode failed: {err}"))
            })?;

        // Prompt-level blocks arrive as HTTP 200 with no usable candidates.
        if let Some(feedback) = &response.prompt_feedback
            && let Some(reason) = &feedback.block_reason
        {
            let reason = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| reason.clone());
            return Err(StylizeError::safety_refusal(reason));
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(StylizeError::EmptyResponse);
        };

        if let Some(finish_reason) = &candidate.finish_reason
            && SAFETY_FINISH_REASONS.contains(&finish_reason.as_str())
        {
            return Err(StylizeError::safety_refusal(finish_reason.clone()));
        }

        let parts = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default();

        // Ordered scan: the first inline image wins, even after text parts.
        for part in &parts {
            if let Some(inline) = &part.inline_data {
                return Ok(StylizedImage::from_png_base64(&inline.data));
            }
        }

        if let Some(text) = parts.iter().find_map(|part| part.text.as_deref()) {
            let message = refusal_explanation(text)
                .unwrap_or_else(|| NO_IMAGE_LIKELY_FILTERED.to_string());
            return Err(StylizeError::generation_failed(message));
        }

        Err(StylizeError::invalid_response(NO_IMAGE_NO_EXPLANATION))
    }
}

impl ImageGenerationProvider for GeminiImageProvider {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn generate(&self, request: &StylizeRequest) -> Result<StylizedImage, StylizeError> {
        let payload = self.build_request_payload(request);

        let response = self
            .client
            .post(self.endpoint_url())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        let response_body = response.text().map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_http_error(status, &response_body));
        }

        self.map_success_response(&response_body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ContentBody>,
    generation_config: GenerationConfigBody,
}

#[derive(Debug, Serialize)]
struct ContentBody {
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataBody,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataBody {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<CandidateBody>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedbackBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateBody {
    #[serde(default)]
    content: Option<CandidateContentBody>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentBody {
    #[serde(default)]
    parts: Vec<CandidatePartBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidatePartBody {
    #[serde(default)]
    inline_data: Option<InlineDataBody>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedbackBody {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

fn map_http_error(status: StatusCode, body: &str) -> StylizeError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return StylizeError::Auth;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return StylizeError::RateLimited;
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return StylizeError::Timeout;
    }

    let message = serde_json::from_str::<ErrorEnvelopeBody>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|detail| detail.message)
        .unwrap_or_else(|| truncate_message(body));
    StylizeError::Transport {
        message: format!("Gemini API returned HTTP {status}: {message}"),
    }
}

fn map_transport_error(error: reqwest::Error) -> StylizeError {
    if error.is_timeout() {
        return StylizeError::Timeout;
    }
    StylizeError::Transport {
        message: format!("Gemini transport error: {error}"),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelopeBody {
    #[serde(default)]
    error: Option<ErrorDetailBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetailBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;
    use serde_json::json;

    use super::{GeminiImageProvider, map_http_error};
    use crate::domain::{ImagePayload, ImageRole, PromptVariant, StylizeError, StylizeRequest};

    fn provider() -> GeminiImageProvider {
        GeminiImageProvider::with_config(
            "test-key",
            "https://generativelanguage.googleapis.com",
            "gemini-2.5-flash-image",
            Duration::from_secs(2),
        )
        .expect("provider should build")
    }

    fn request_with_style() -> StylizeRequest {
        StylizeRequest {
            content_image: ImagePayload::new(
                ImageRole::Content,
                "data:image/jpeg;base64,Y29udGVudA==",
            ),
            style_image: Some(ImagePayload::new(
                ImageRole::Style,
                "data:image/png;base64,c3R5bGU=",
            )),
            prompt: PromptVariant::WithStyle.template().to_string(),
        }
    }

    #[test]
    fn with_config_rejects_blank_credentials_and_identifiers() {
        let missing_key = GeminiImageProvider::with_config(
            "  ",
            "https://example.test",
            "gemini-2.5-flash-image",
            Duration::from_secs(2),
        )
        .expect_err("blank API key should fail validation");
        assert!(matches!(
            missing_key,
            StylizeError::Validation { message } if message == "Gemini API key must not be empty"
        ));

        let missing_model =
            GeminiImageProvider::with_config("key", "https://example.test", " ", Duration::from_secs(2))
                .expect_err("blank model ID should fail validation");
        assert!(matches!(missing_model, StylizeError::Validation { .. }));
    }

    #[test]
    fn endpoint_url_joins_base_model_and_action() {
        let provider = GeminiImageProvider::with_config(
            "key",
            "https://example.test/",
            "gemini-2.5-flash-image",
            Duration::from_secs(2),
        )
        .expect("provider should build");

        assert_eq!(
            provider.endpoint_url(),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn request_payload_serializes_ordered_parts_in_camel_case() {
        let payload = provider().build_request_payload(&request_with_style());
        let value = serde_json::to_value(&payload).expect("payload should serialize");

        let parts = value["contents"][0]["parts"]
            .as_array()
            .expect("parts should be an array");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["data"], "c3R5bGU=");
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "Y29udGVudA==");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert!(parts[2]["text"].is_string());

        assert_eq!(value["generationConfig"]["responseModalities"][0], "IMAGE");
        assert!(value.get("generation_config").is_none());
    }

    #[test]
    fn success_response_returns_first_inline_image_even_after_text() {
        let body = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": {
                    "parts": [
                        { "text": "Here is your stylized character:" },
                        { "inlineData": { "mimeType": "image/png", "data": "aW1hZ2U=" } },
                        { "inlineData": { "mimeType": "image/png", "data": "c2Vjb25k" } }
                    ]
                }
            }]
        })
        .to_string();

        let image = provider()
            .map_success_response(&body)
            .expect("image part should win over text");
        assert_eq!(image.data_url, "data:image/png;base64,aW1hZ2U=");
    }

    #[test]
    fn empty_candidate_list_maps_to_empty_response() {
        let error = provider()
            .map_success_response(r#"{"candidates": []}"#)
            .expect_err("missing candidates should fail");
        assert!(matches!(error, StylizeError::EmptyResponse));
    }

    #[test]
    fn safety_finish_reason_maps_to_safety_refusal_not_no_data() {
        let body = json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        })
        .to_string();

        let error = provider()
            .map_success_response(&body)
            .expect_err("safety finish reason should fail");
        assert!(matches!(
            error,
            StylizeError::SafetyRefusal { reason } if reason == "IMAGE_SAFETY"
        ));
    }

    #[test]
    fn prompt_feedback_block_maps_to_safety_refusal() {
        let body = json!({
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        })
        .to_string();

        let error = provider()
            .map_success_response(&body)
            .expect_err("blocked prompt should fail");
        assert!(matches!(
            error,
            StylizeError::SafetyRefusal { reason } if reason == "Prompt was blocked due to safety"
        ));
    }

    #[test]
    fn text_only_response_surfaces_model_explanation_verbatim() {
        let body = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": {
                    "parts": [{ "text": "I cannot restyle photographs of identification documents." }]
                }
            }]
        })
        .to_string();

        let error = provider()
            .map_success_response(&body)
            .expect_err("text-only response should fail");
        assert!(matches!(
            error,
            StylizeError::GenerationFailed { message }
            if message == "I cannot restyle photographs of identification documents."
        ));
    }

    #[test]
    fn fence_only_text_substitutes_generic_filtered_message() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "```\n```" }] }
            }]
        })
        .to_string();

        let error = provider()
            .map_success_response(&body)
            .expect_err("fence-only text should fail");
        assert!(matches!(
            error,
            StylizeError::GenerationFailed { message }
            if message == "The model returned no image; the result was likely filtered."
        ));
    }

    #[test]
    fn response_without_image_or_text_maps_to_invalid_response() {
        let body = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": { "parts": [{}] }
            }]
        })
        .to_string();

        let error = provider()
            .map_success_response(&body)
            .expect_err("empty parts should fail");
        assert!(matches!(
            error,
            StylizeError::InvalidResponse { message }
            if message == "response contained no image data and no explanation"
        ));
    }

    #[test]
    fn map_http_error_maps_status_codes() {
        assert!(matches!(
            map_http_error(StatusCode::UNAUTHORIZED, "{}"),
            StylizeError::Auth
        ));
        assert!(matches!(
            map_http_error(StatusCode::FORBIDDEN, "{}"),
            StylizeError::Auth
        ));
        assert!(matches!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, "{}"),
            StylizeError::RateLimited
        ));
        assert!(matches!(
            map_http_error(StatusCode::GATEWAY_TIMEOUT, "{}"),
            StylizeError::Timeout
        ));

        let transport = map_http_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":{"code":500,"message":"backend exploded","status":"INTERNAL"}}"#,
        );
        assert!(matches!(
            transport,
            StylizeError::Transport { message }
            if message.contains("backend exploded") && message.contains("500")
        ));
    }
}
