use std::path::Path;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::domain::{ImagePayload, ImageRole};
use crate::infra::image::{ImageLoadError, ImageSourceData, load_image_source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadImageCommand {
    SetContent { path: String },
    SetStyle { path: String },
    ClearContent,
    ClearStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadImageOutcome {
    Loaded {
        role: ImageRole,
        replaced: bool,
        image: ImagePayload,
    },
    Cleared {
        role: ImageRole,
        had_image: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadImageError {
    #[error("image path must not be empty")]
    EmptyPath,
    #[error("failed to load image: {source}")]
    LoadFailed { source: ImageLoadError },
}

impl LoadImageError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyPath => "Select an image file before loading.".to_string(),
            Self::LoadFailed { source } => match source {
                ImageLoadError::UnsupportedType { .. } => {
                    "Only image files (PNG, JPEG, GIF, WebP) are supported.".to_string()
                }
                ImageLoadError::TooLarge { .. } => {
                    "The selected image is larger than 5 MiB. Choose a smaller file.".to_string()
                }
                ImageLoadError::Io { .. } => {
                    "Could not read the image file. Check the file path and permissions."
                        .to_string()
                }
            },
        }
    }
}

pub trait ImageSourceLoader: Send + Sync {
    fn load_source(&self, path: &Path) -> Result<ImageSourceData, ImageLoadError>;
}

#[derive(Debug, Default)]
pub struct FileImageSourceLoader;

impl ImageSourceLoader for FileImageSourceLoader {
    fn load_source(&self, path: &Path) -> Result<ImageSourceData, ImageLoadError> {
        load_image_source(path)
    }
}

pub struct LoadImageUseCase {
    loader: Arc<dyn ImageSourceLoader>,
    state: Mutex<ImageSlotState>,
}

impl LoadImageUseCase {
    pub fn new() -> Self {
        Self::with_loader(Arc::new(FileImageSourceLoader))
    }

    pub fn with_loader(loader: Arc<dyn ImageSourceLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(ImageSlotState::default()),
        }
    }

    pub fn execute(&self, command: LoadImageCommand) -> Result<LoadImageOutcome, LoadImageError> {
        match command {
            LoadImageCommand::SetContent { path } => self.set_slot(ImageRole::Content, path),
            LoadImageCommand::SetStyle { path } => self.set_slot(ImageRole::Style, path),
            LoadImageCommand::ClearContent => Ok(self.clear_slot(ImageRole::Content)),
            LoadImageCommand::ClearStyle => Ok(self.clear_slot(ImageRole::Style)),
        }
    }

    pub fn content_image(&self) -> Option<ImagePayload> {
        self.lock_state().content.clone()
    }

    pub fn style_image(&self) -> Option<ImagePayload> {
        self.lock_state().style.clone()
    }

    pub fn has_style_image(&self) -> bool {
        self.lock_state().style.is_some()
    }

    fn set_slot(&self, role: ImageRole, path: String) -> Result<LoadImageOutcome, LoadImageError> {
        let path = path.trim().to_string();
        if path.is_empty() {
            return Err(LoadImageError::EmptyPath);
        }

        let source = self
            .loader
            .load_source(Path::new(&path))
            .map_err(|source| LoadImageError::LoadFailed { source })?;
        let image = ImagePayload::new(role, source.data_url);

        let mut state = self.lock_state();
        let replaced = state.slot_mut(role).replace(image.clone()).is_some();

        Ok(LoadImageOutcome::Loaded {
            role,
            replaced,
            image,
        })
    }

    fn clear_slot(&self, role: ImageRole) -> LoadImageOutcome {
        let mut state = self.lock_state();
        let had_image = state.slot_mut(role).take().is_some();
        LoadImageOutcome::Cleared { role, had_image }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ImageSlotState> {
        self.state
            .lock()
            .expect("image slot state lock poisoned")
    }
}

impl Default for LoadImageUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct ImageSlotState {
    content: Option<ImagePayload>,
    style: Option<ImagePayload>,
}

impl ImageSlotState {
    fn slot_mut(&mut self, role: ImageRole) -> &mut Option<ImagePayload> {
        match role {
            ImageRole::Content => &mut self.content,
            ImageRole::Style => &mut self.style,
        }
    }
}
