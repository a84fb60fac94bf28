use std::path::Path;

use super::{DEBUG_LOG_ENV, DEBUG_PROMPT_PREVIEW_CHARS};

pub(super) fn log_stylize_submission(job_id: u64, prompt: &str, has_style_image: bool) {
    if !debug_log_enabled() {
        return;
    }

    let preview = prompt_preview(prompt, DEBUG_PROMPT_PREVIEW_CHARS);
    eprintln!(
        "restyle: submitting job_id={job_id} has_style_image={has_style_image} \
prompt_chars={} prompt_preview={preview:?}",
        prompt.chars().count()
    );
}

pub(super) fn log_job_outcome(job_id: u64, outcome: &str) {
    if debug_log_enabled() {
        eprintln!("restyle: job_id={job_id} {outcome}");
    }
}

fn debug_log_enabled() -> bool {
    std::env::var(DEBUG_LOG_ENV)
        .ok()
        .as_deref()
        .is_some_and(parse_truthy_flag)
}

pub(super) fn parse_truthy_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("1")
        || raw.eq_ignore_ascii_case("true")
        || raw.eq_ignore_ascii_case("yes")
        || raw.eq_ignore_ascii_case("on")
}

pub(super) fn prompt_preview(prompt: &str, max_chars: usize) -> String {
    let mut chars = prompt.chars();
    let mut preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        preview.push_str("...");
    }
    preview
}

pub fn display_file_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(path)
        .to_string()
}
