use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StylizeError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("provider authentication failed")]
    Auth,
    #[error("provider rate limit reached")]
    RateLimited,
    #[error("provider request timed out")]
    Timeout,
    #[error("provider returned no candidates")]
    EmptyResponse,
    #[error("generation was refused by the safety filter: {reason}")]
    SafetyRefusal { reason: String },
    #[error("generation failed: {message}")]
    GenerationFailed { message: String },
    #[error("provider returned an invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("provider transport failed: {message}")]
    Transport { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl StylizeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn safety_refusal(reason: impl Into<String>) -> Self {
        Self::SafetyRefusal {
            reason: reason.into(),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures the generation model itself reported, as opposed to
    /// failures of the surrounding machinery. These pass through to the user
    /// verbatim instead of being rendered as a service-availability message.
    pub fn is_domain_failure(&self) -> bool {
        matches!(
            self,
            Self::SafetyRefusal { .. } | Self::GenerationFailed { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => {
                format!("Please review the stylization input: {message}")
            }
            Self::Auth => {
                "Authentication failed. Check your Gemini API key configuration.".to_string()
            }
            Self::RateLimited => {
                "The image service is rate limiting requests. Please retry in a moment.".to_string()
            }
            Self::Timeout => "The image service did not respond in time. Please retry.".to_string(),
            Self::EmptyResponse => {
                "The image service returned an empty response. Please retry.".to_string()
            }
            Self::SafetyRefusal { reason } => {
                format!("The request was declined by the safety filter: {reason}")
            }
            Self::GenerationFailed { message } => {
                format!("Image generation failed: {message}")
            }
            Self::InvalidResponse { message } => {
                format!("The image service returned an unexpected response: {message}")
            }
            Self::Transport { message } => {
                format!("The image service is unavailable: {message}")
            }
            Self::Internal { message } => {
                format!("An internal error occurred while generating: {message}")
            }
        }
    }
}
