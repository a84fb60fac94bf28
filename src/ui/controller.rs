use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use crate::app::{
    LoadImageCommand, LoadImageError, LoadImageUseCase, StylizeJobManager, StylizeJobState,
    StylizeJobUpdate, StylizeService,
};
use crate::domain::{ImagePayload, PromptVariant, StylizeError, StylizeRequest, StylizedImage};

use super::state::StudioStatus;
use super::utils::{log_job_outcome, log_stylize_submission};
use super::{CONTENT_REQUIRED_MESSAGE, DOWNLOAD_FILE_NAME, GENERATION_IN_FLIGHT_MESSAGE};

/// Whether the instruction text sent to the model is a fixed template or may
/// be overridden by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptPolicy {
    #[default]
    Fixed,
    Editable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveResultError {
    #[error("no stylized image is available to save")]
    NoResult,
    #[error("stylized image payload is not valid base64: {message}")]
    Decode { message: String },
    #[error("failed to write stylized image: {message}")]
    Io { message: String },
}

/// Headless front-end state machine. Owns the image slots, the background
/// job manager, and the status shown to the user.
pub struct StudioController {
    images: LoadImageUseCase,
    jobs: StylizeJobManager,
    status: StudioStatus,
    result: Option<StylizedImage>,
    prompt_policy: PromptPolicy,
    custom_prompt: Option<String>,
    active_job_id: Option<u64>,
}

impl StudioController {
    pub fn new(service: StylizeService) -> Result<Self, StylizeError> {
        Ok(Self::with_components(
            LoadImageUseCase::new(),
            StylizeJobManager::new(service)?,
        ))
    }

    pub fn with_components(images: LoadImageUseCase, jobs: StylizeJobManager) -> Self {
        Self {
            images,
            jobs,
            status: StudioStatus::Idle,
            result: None,
            prompt_policy: PromptPolicy::default(),
            custom_prompt: None,
            active_job_id: None,
        }
    }

    pub fn status(&self) -> &StudioStatus {
        &self.status
    }

    pub fn result(&self) -> Option<&StylizedImage> {
        self.result.as_ref()
    }

    pub fn content_image(&self) -> Option<ImagePayload> {
        self.images.content_image()
    }

    pub fn style_image(&self) -> Option<ImagePayload> {
        self.images.style_image()
    }

    pub fn prompt_policy(&self) -> PromptPolicy {
        self.prompt_policy
    }

    pub fn set_prompt_policy(&mut self, policy: PromptPolicy) {
        self.prompt_policy = policy;
    }

    /// Stores a user-edited prompt. Ignored under the fixed-prompt policy;
    /// returns whether the edit was accepted.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> bool {
        if self.prompt_policy != PromptPolicy::Editable {
            return false;
        }
        let prompt = prompt.into();
        self.custom_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        true
    }

    /// The instruction text the next generation will carry. The template is
    /// re-selected from style-image presence on every call, so toggling the
    /// style slot switches templates without any further action.
    pub fn effective_prompt(&self) -> String {
        if self.prompt_policy == PromptPolicy::Editable
            && let Some(custom) = &self.custom_prompt
        {
            return custom.clone();
        }
        PromptVariant::select(self.images.has_style_image())
            .template()
            .to_string()
    }

    /// Loads the character photo. A newly loaded photo invalidates any
    /// previously generated result, and a job still running for the replaced
    /// photo is detached so its completion is discarded as stale.
    pub fn select_content_image(&mut self, path: &str) -> Result<(), LoadImageError> {
        self.status = StudioStatus::Uploading;
        match self.images.execute(LoadImageCommand::SetContent {
            path: path.to_string(),
        }) {
            Ok(_) => {
                self.result = None;
                self.active_job_id = None;
                self.status = StudioStatus::Idle;
                Ok(())
            }
            Err(error) => {
                self.status = StudioStatus::Error {
                    message: error.user_message(),
                };
                Err(error)
            }
        }
    }

    /// Loads the style reference. An in-flight generation keeps running and
    /// keeps its status; the new reference only affects later generations.
    pub fn select_style_image(&mut self, path: &str) -> Result<(), LoadImageError> {
        self.status = StudioStatus::Uploading;
        match self.images.execute(LoadImageCommand::SetStyle {
            path: path.to_string(),
        }) {
            Ok(_) => {
                self.status = if self.active_job_id.is_some() {
                    StudioStatus::Generating
                } else {
                    StudioStatus::Idle
                };
                Ok(())
            }
            Err(error) => {
                self.status = StudioStatus::Error {
                    message: error.user_message(),
                };
                Err(error)
            }
        }
    }

    /// Removes the character photo along with any result generated from it.
    /// An in-flight job for the removed photo is detached so its completion
    /// is discarded as stale.
    pub fn clear_content_image(&mut self) {
        let _ = self.images.execute(LoadImageCommand::ClearContent);
        self.result = None;
        self.active_job_id = None;
        self.status = StudioStatus::Idle;
    }

    pub fn clear_style_image(&mut self) {
        let _ = self.images.execute(LoadImageCommand::ClearStyle);
    }

    /// Submits a stylize job for the loaded images. At most one job may be
    /// in flight; the gate is the attached job itself, so intake actions
    /// that rewrite the status cannot re-enable the trigger.
    pub fn generate(&mut self) -> Result<u64, StylizeError> {
        if self.active_job_id.is_some() {
            return Err(StylizeError::validation(GENERATION_IN_FLIGHT_MESSAGE));
        }
        let Some(content_image) = self.images.content_image() else {
            return Err(StylizeError::validation(CONTENT_REQUIRED_MESSAGE));
        };

        let prompt = self.effective_prompt();
        let style_image = self.images.style_image();
        let has_style_image = style_image.is_some();
        let request = StylizeRequest::new(content_image, style_image, prompt.clone());
        request.validate()?;

        let job_id = self.jobs.submit_stylize(request)?;
        log_stylize_submission(job_id, &prompt, has_style_image);
        self.active_job_id = Some(job_id);
        self.status = StudioStatus::Generating;
        Ok(job_id)
    }

    /// Applies any updates the worker has published since the last poll.
    /// Updates for detached jobs are drained but ignored.
    pub fn poll_updates(&mut self) -> Vec<StylizeJobUpdate> {
        let updates = self.jobs.drain_updates();
        for update in &updates {
            if self.active_job_id != Some(update.job_id) {
                continue;
            }

            match update.state {
                StylizeJobState::Running => {
                    self.status = StudioStatus::Generating;
                }
                StylizeJobState::Succeeded => {
                    self.result = update.result.clone();
                    self.active_job_id = None;
                    self.status = StudioStatus::Success;
                    log_job_outcome(update.job_id, "succeeded");
                }
                StylizeJobState::Failed => {
                    let message = update
                        .error
                        .as_ref()
                        .map(StylizeError::user_message)
                        .unwrap_or_else(|| "Stylization failed.".to_string());
                    self.active_job_id = None;
                    self.status = StudioStatus::Error { message };
                    log_job_outcome(update.job_id, "failed");
                }
                StylizeJobState::Idle => {}
            }
        }
        updates
    }

    /// Decodes the stylized result and writes it as a PNG file into `dir`.
    pub fn save_result(&self, dir: &Path) -> Result<PathBuf, SaveResultError> {
        let result = self.result.as_ref().ok_or(SaveResultError::NoResult)?;
        let bytes = BASE64
            .decode(result.raw_base64())
            .map_err(|error| SaveResultError::Decode {
                message: error.to_string(),
            })?;

        fs::create_dir_all(dir).map_err(|error| SaveResultError::Io {
            message: error.to_string(),
        })?;
        let path = dir.join(DOWNLOAD_FILE_NAME);
        fs::write(&path, bytes).map_err(|error| SaveResultError::Io {
            message: error.to_string(),
        })?;
        Ok(path)
    }
}
