use super::{ListMarker, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    Numbered { number: u32, indent: usize, text: &'a str },
    Bullet { indent: usize, text: &'a str },
    Prose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fence<'a> {
    marker: &'static str,
    language: Option<&'a str>,
}

/// Splits `text` into fenced code, headings, list items, blank separators and
/// prose. Runs of blank lines collapse into one `Blank`; leading and trailing
/// blanks are dropped.
pub fn parse_segments(text: &str) -> Vec<Segment> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segments = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];

        if let Some(fence) = opening_fence(line)
            && let Some(len) = closing_fence_offset(&lines[idx + 1..], fence.marker)
        {
            flush_prose(&mut prose, &mut segments);
            segments.push(Segment::Code {
                language: fence.language.map(str::to_string),
                body: lines[idx + 1..idx + 1 + len].join("\n"),
            });
            idx += len + 2;
            continue;
        }

        match classify(line) {
            LineKind::Blank => {
                flush_prose(&mut prose, &mut segments);
                if !matches!(segments.last(), None | Some(Segment::Blank)) {
                    segments.push(Segment::Blank);
                }
            }
            LineKind::Heading { level, text } => {
                flush_prose(&mut prose, &mut segments);
                segments.push(Segment::Heading {
                    level,
                    text: text.to_string(),
                });
            }
            LineKind::Numbered {
                number,
                indent,
                text,
            } => {
                flush_prose(&mut prose, &mut segments);
                segments.push(Segment::ListItem {
                    marker: ListMarker::Numbered(number),
                    indent,
                    text: text.to_string(),
                });
            }
            LineKind::Bullet { indent, text } => {
                flush_prose(&mut prose, &mut segments);
                segments.push(Segment::ListItem {
                    marker: ListMarker::Bullet,
                    indent,
                    text: text.to_string(),
                });
            }
            LineKind::Prose => prose.push(line),
        }
        idx += 1;
    }

    flush_prose(&mut prose, &mut segments);
    if segments.last() == Some(&Segment::Blank) {
        segments.pop();
    }
    segments
}

fn flush_prose(prose: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if prose.is_empty() {
        return;
    }
    segments.push(Segment::Prose(prose.join("\n")));
    prose.clear();
}

fn opening_fence(line: &str) -> Option<Fence<'_>> {
    let trimmed = line.trim_start();
    let marker = ["```", "~~~"]
        .into_iter()
        .find(|marker| trimmed.starts_with(marker))?;
    let fence_char = marker.chars().next()?;
    let info = trimmed.trim_start_matches(fence_char).trim();
    let language = info
        .split_whitespace()
        .next()
        .filter(|tag| !tag.contains(fence_char));
    Some(Fence { marker, language })
}

/// Index, within `rest`, of the line closing a fence opened with `marker`.
fn closing_fence_offset(rest: &[&str], marker: &str) -> Option<usize> {
    let fence_char = marker.chars().next()?;
    rest.iter().position(|line| {
        let trimmed = line.trim();
        trimmed.starts_with(marker) && trimmed.trim_start_matches(fence_char).is_empty()
    })
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    let indent = line[..line.len() - trimmed.len()].chars().count();

    if let Some((level, text)) = heading(trimmed) {
        return LineKind::Heading { level, text };
    }
    if let Some((number, text)) = numbered(trimmed) {
        return LineKind::Numbered {
            number,
            indent,
            text,
        };
    }
    if let Some(text) = bullet(trimmed) {
        return LineKind::Bullet { indent, text };
    }
    LineKind::Prose
}

fn heading(trimmed: &str) -> Option<(u8, &str)> {
    let level = trimmed.bytes().take_while(|byte| *byte == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some((level as u8, text))
}

fn numbered(trimmed: &str) -> Option<(u32, &str)> {
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    let number = trimmed[..digits].parse().ok()?;
    Some((number, text))
}

fn bullet(trimmed: &str) -> Option<&str> {
    let mut chars = trimmed.chars();
    if !matches!(chars.next()?, '-' | '*' | '•') {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}
