mod controller;
mod state;
mod utils;

pub use controller::{PromptPolicy, SaveResultError, StudioController};
pub use state::StudioStatus;
pub use utils::display_file_name_from_path;

pub const JOB_UPDATE_POLL_INTERVAL_MS: u64 = 50;

pub const DOWNLOAD_FILE_NAME: &str = "stylized-character.png";

pub const CONTENT_REQUIRED_MESSAGE: &str = "Select a character photo before stylizing.";
pub const GENERATION_IN_FLIGHT_MESSAGE: &str = "A stylization is already running.";

const DEBUG_LOG_ENV: &str = "RESTYLE_DEBUG_LOG";
const DEBUG_PROMPT_PREVIEW_CHARS: usize = 120;
