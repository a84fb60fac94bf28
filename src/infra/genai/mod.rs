mod env;
mod gemini;
mod provider;
mod response_parsing;

pub use gemini::GeminiImageProvider;
pub use provider::ImageGenerationProvider;
