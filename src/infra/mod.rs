pub mod genai;
pub mod image;
