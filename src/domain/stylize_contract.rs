use super::StylizeError;

/// Intake ceiling for a single source image, applied before the file is read.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

const SINGLE_PROMPT_TEMPLATE: &str = "Transform the character in this photo into a polished \
stylized illustration. Keep the subject's identity, pose, and expression clearly recognizable \
while rendering the scene with clean line work, rich colors, and soft lighting. Return only the \
final image.";

const WITH_STYLE_PROMPT_TEMPLATE: &str = "The first image is a style reference and the second \
image is the character to restyle. Redraw the character from the second image in the visual \
style of the first image, keeping the character's identity, pose, and expression clearly \
recognizable. Imitate only the style of the reference, never its subject. Return only the final \
image.";

/// Strips a `data:<mime>;base64,` header from a data-URL, leaving the raw
/// base64 payload. Splits on the first comma; a string without a comma is
/// already a bare payload and is returned verbatim.
pub fn strip_data_url_prefix(data_url: &str) -> &str {
    match data_url.split_once(',') {
        Some((_, payload)) => payload,
        None => data_url,
    }
}

/// Reads the MIME type out of a `data:<mime>;base64,` header, if one exists.
pub fn data_url_mime_type(data_url: &str) -> Option<&str> {
    let header = data_url.strip_prefix("data:")?;
    let mime = header.split(&[';', ','][..]).next()?;
    if mime.is_empty() { None } else { Some(mime) }
}

pub fn is_supported_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// The required subject photograph to be restyled.
    Content,
    /// An optional reference whose visual style, not subject, is imitated.
    Style,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub role: ImageRole,
    pub data_url: String,
}

impl ImagePayload {
    pub fn new(role: ImageRole, data_url: impl Into<String>) -> Self {
        Self {
            role,
            data_url: data_url.into(),
        }
    }

    pub fn raw_base64(&self) -> &str {
        strip_data_url_prefix(&self.data_url)
    }

    pub fn mime_type(&self) -> &str {
        data_url_mime_type(&self.data_url).unwrap_or(DEFAULT_IMAGE_MIME_TYPE)
    }
}

/// One element of the ordered multimodal request. The remote model weights
/// earlier parts as context and the trailing text as instruction, so the
/// sequence is a `Vec`, never a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    InlineImage { mime_type: String, data: String },
    Text(String),
}

impl RequestPart {
    fn inline_image(image: &ImagePayload) -> Self {
        Self::InlineImage {
            mime_type: image.mime_type().to_string(),
            data: image.raw_base64().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    Single,
    WithStyle,
}

impl PromptVariant {
    /// Deterministic variant selection from style-image presence alone.
    pub fn select(has_style_image: bool) -> Self {
        if has_style_image {
            Self::WithStyle
        } else {
            Self::Single
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Self::Single => SINGLE_PROMPT_TEMPLATE,
            Self::WithStyle => WITH_STYLE_PROMPT_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylizeRequest {
    pub content_image: ImagePayload,
    pub style_image: Option<ImagePayload>,
    pub prompt: String,
}

impl StylizeRequest {
    pub fn new(
        content_image: ImagePayload,
        style_image: Option<ImagePayload>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            content_image,
            style_image,
            prompt: prompt.into(),
        }
    }

    pub fn validate(&self) -> Result<(), StylizeError> {
        if self.content_image.role != ImageRole::Content {
            return Err(StylizeError::validation(
                "content image slot must carry a content-role payload",
            ));
        }
        if self.content_image.raw_base64().trim().is_empty() {
            return Err(StylizeError::validation(
                "content image payload must not be empty",
            ));
        }
        if let Some(style) = &self.style_image {
            if style.role != ImageRole::Style {
                return Err(StylizeError::validation(
                    "style image slot must carry a style-role payload",
                ));
            }
            if style.raw_base64().trim().is_empty() {
                return Err(StylizeError::validation(
                    "style image payload must not be empty",
                ));
            }
        }
        if self.prompt.trim().is_empty() {
            return Err(StylizeError::validation("prompt must not be empty"));
        }
        Ok(())
    }

    /// Assembles the ordered part list: style reference first when present,
    /// then the content image, then the text prompt last.
    pub fn build_parts(&self) -> Vec<RequestPart> {
        let mut parts = Vec::with_capacity(3);
        if let Some(style) = &self.style_image {
            parts.push(RequestPart::inline_image(style));
        }
        parts.push(RequestPart::inline_image(&self.content_image));
        parts.push(RequestPart::Text(self.prompt.clone()));
        parts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylizedImage {
    /// The generated image as a `data:image/png;base64,` URL.
    pub data_url: String,
}

impl StylizedImage {
    pub fn from_png_base64(data: impl AsRef<str>) -> Self {
        Self {
            data_url: format!("data:image/png;base64,{}", data.as_ref()),
        }
    }

    pub fn raw_base64(&self) -> &str {
        strip_data_url_prefix(&self.data_url)
    }
}
