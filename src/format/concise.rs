use super::{ListMarker, Segment};

/// Rewrites prose as a numbered list for `--concise`.
///
/// Responses that already contain list items are left alone. Otherwise each
/// paragraph becomes an item, or each sentence when there is only one
/// paragraph. Headings and code blocks pass through unchanged.
pub(crate) fn into_numbered_list(segments: Vec<Segment>) -> Vec<Segment> {
    if segments
        .iter()
        .any(|segment| matches!(segment, Segment::ListItem { .. }))
    {
        return segments;
    }

    let paragraphs = segments
        .iter()
        .filter(|segment| matches!(segment, Segment::Prose(_)))
        .count();
    let mut next_number = 0u32;
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        match segment {
            Segment::Prose(text) => {
                let chunks = if paragraphs == 1 {
                    split_sentences(&text)
                } else {
                    vec![collapse_whitespace(&text)]
                };
                let items: Vec<String> = chunks
                    .into_iter()
                    .filter(|chunk| chunk.chars().any(char::is_alphanumeric))
                    .collect();
                if items.is_empty() {
                    out.push(Segment::Prose(text));
                    continue;
                }
                for text in items {
                    next_number += 1;
                    out.push(Segment::ListItem {
                        marker: ListMarker::Numbered(next_number),
                        indent: 0,
                        text,
                    });
                }
            }
            other => out.push(other),
        }
    }

    drop_blanks_between_items(out)
}

/// Best-effort sentence split on `.`, `!` or `?` followed by whitespace or
/// the end of the text. Whitespace inside a sentence is collapsed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let flat = collapse_whitespace(text);
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = flat.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
        if matches!(ch, '.' | '!' | '?') && at_boundary {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn drop_blanks_between_items(segments: Vec<Segment>) -> Vec<Segment> {
    let is_item = |segment: Option<&Segment>| matches!(segment, Some(Segment::ListItem { .. }));
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut iter = segments.into_iter().peekable();

    while let Some(segment) = iter.next() {
        if segment == Segment::Blank && is_item(out.last()) && is_item(iter.peek()) {
            continue;
        }
        out.push(segment);
    }
    out
}
