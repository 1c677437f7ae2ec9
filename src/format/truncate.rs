/// Applies the short-mode ceiling.
///
/// Returns `None` when `text` fits within `max_chars`, not counting trailing
/// whitespace. Otherwise returns the first paragraph, cut to `max_chars`
/// chars if the paragraph alone is still too long.
pub fn truncate_short(text: &str, max_chars: usize) -> Option<String> {
    if text.trim_end().chars().count() <= max_chars {
        return None;
    }

    let paragraph = first_paragraph(text);
    let cut = if paragraph.chars().count() > max_chars {
        paragraph.chars().take(max_chars).collect::<String>()
    } else {
        paragraph
    };
    Some(cut.trim_end().to_string())
}

fn first_paragraph(text: &str) -> String {
    text.lines()
        .skip_while(|line| line.trim().is_empty())
        .take_while(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
