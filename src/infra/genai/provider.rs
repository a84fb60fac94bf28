use crate::domain::{StylizeError, StylizeRequest, StylizedImage};

pub trait ImageGenerationProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    fn generate(&self, request: &StylizeRequest) -> Result<StylizedImage, StylizeError>;
}
