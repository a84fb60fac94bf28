#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StudioStatus {
    #[default]
    Idle,
    Uploading,
    Generating,
    Success,
    Error {
        message: String,
    },
}

impl StudioStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Uploading => "Reading image...".to_string(),
            Self::Generating => "Stylizing...".to_string(),
            Self::Success => "Done".to_string(),
            Self::Error { message } => format!("Failed: {message}"),
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}
