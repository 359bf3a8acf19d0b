/// Title carried by a `$ <title>` line, the shorthand for creating a sibling
/// task from the last block of a document.
///
/// `"$100"`, `"$ "` and `"$"` are ordinary text.
pub fn parse_task_trigger(content: &str) -> Option<&str> {
    let rest = content.trim().strip_prefix("$ ")?;
    let title = rest.trim();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
