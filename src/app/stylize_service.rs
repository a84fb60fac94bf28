use std::sync::Arc;

use crate::domain::{StylizeError, StylizeRequest, StylizedImage};
use crate::infra::genai::ImageGenerationProvider;

/// Validates stylize requests and dispatches them to the configured
/// generation provider.
#[derive(Clone)]
pub struct StylizeService {
    provider: Arc<dyn ImageGenerationProvider>,
}

impl StylizeService {
    pub fn new(provider: Arc<dyn ImageGenerationProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    pub fn generate(&self, request: &StylizeRequest) -> Result<StylizedImage, StylizeError> {
        request.validate()?;
        self.provider.generate(request)
    }
}
