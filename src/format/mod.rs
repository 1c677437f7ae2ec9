//! Turns raw model text into display segments.
//!
//! Everything here is a pure function of its input. Detection is best effort:
//! anything that does not parse cleanly (an unclosed fence, say) is kept as
//! plain prose rather than dropped.

mod blocks;
mod concise;
mod truncate;

use std::borrow::Cow;

use crate::config::Thresholds;
use crate::request::StyleMode;

pub use blocks::parse_segments;
pub use concise::split_sentences;
pub use truncate::truncate_short;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Numbered(u32),
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// One or more consecutive lines of ordinary text, newline separated.
    Prose(String),
    Heading {
        level: u8,
        text: String,
    },
    Code {
        language: Option<String>,
        body: String,
    },
    ListItem {
        marker: ListMarker,
        indent: usize,
        text: String,
    },
    Blank,
    TruncationNotice,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedOutput {
    pub segments: Vec<Segment>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy {
    pub short_response_chars: usize,
}

impl From<&Thresholds> for FormatPolicy {
    fn from(thresholds: &Thresholds) -> Self {
        Self {
            short_response_chars: thresholds.short_response_chars,
        }
    }
}

pub fn format_response(text: &str, style: StyleMode, policy: &FormatPolicy) -> FormattedOutput {
    let (body, truncated) = match style {
        StyleMode::Short => match truncate_short(text, policy.short_response_chars) {
            Some(cut) => (Cow::Owned(cut), true),
            None => (Cow::Borrowed(text), false),
        },
        StyleMode::Normal | StyleMode::Concise => (Cow::Borrowed(text), false),
    };

    let mut segments = parse_segments(&body);
    if style == StyleMode::Concise {
        segments = concise::into_numbered_list(segments);
    }
    if truncated {
        segments.push(Segment::TruncationNotice);
    }

    FormattedOutput {
        segments,
        truncated,
    }
}
