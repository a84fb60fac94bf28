const MAX_ERROR_MESSAGE_LEN: usize = 256;

pub(crate) fn truncate_message(body: &str) -> String {
    let compact = body.trim().replace('\n', " ");
    compact.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

/// Classifies a text part that arrived instead of an image. Returns `None`
/// when the text carries no usable explanation (empty, code-fence markers,
/// bare punctuation) and the trimmed explanation otherwise. The model's own
/// wording passes through untruncated; only transport error bodies go
/// through `truncate_message`.
pub(crate) fn refusal_explanation(text: &str) -> Option<String> {
    let stripped = text.replace("```", "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| !c.is_alphanumeric()) {
        return None;
    }
    Some(trimmed.to_string())
}
