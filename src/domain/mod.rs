mod errors;
mod stylize_contract;

pub use errors::StylizeError;
pub use stylize_contract::{
    ImagePayload, ImageRole, MAX_IMAGE_BYTES, PromptVariant, RequestPart, StylizeRequest,
    StylizedImage, data_url_mime_type, is_supported_image_mime, strip_data_url_prefix,
};
