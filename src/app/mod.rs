mod load_image_use_case;
mod stylize_job_manager;
mod stylize_service;

pub use load_image_use_case::{
    FileImageSourceLoader, ImageSourceLoader, LoadImageCommand, LoadImageError, LoadImageOutcome,
    LoadImageUseCase,
};
pub use stylize_job_manager::{StylizeJobManager, StylizeJobState, StylizeJobUpdate};
pub use stylize_service::StylizeService;
