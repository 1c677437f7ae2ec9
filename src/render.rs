//! Terminal rendering for formatted responses.

use std::io::{self, Write};
use std::sync::LazyLock;
use std::time::Duration;

use colored::{ColoredString, Colorize};
use regex::{Captures, Regex};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

use crate::format::{FormattedOutput, ListMarker, Segment};

const CODE_INDENT: &str = "    ";
const THEME_NAME: &str = "base16-ocean.dark";
const ANSI_RESET: &str = "\x1b[0m";
const TRUNCATION_NOTICE: &str = "… (truncated; run without --short for the full response)";

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern is valid"));
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("link pattern is valid")
});
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("italic pattern is valid"));

struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    fn load() -> Option<Self> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(THEME_NAME)?;
        Some(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// `None` when the language is unknown or highlighting fails part way.
    fn highlight(&self, language: &str, code: &str) -> Option<String> {
        let syntax = self.syntaxes.find_syntax_by_token(language)?;
        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut out = String::new();
        for line in LinesWithEndings::from(code) {
            let ranges = lines.highlight_line(line, &self.syntaxes).ok()?;
            out.push_str(CODE_INDENT);
            out.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        out.push_str(ANSI_RESET);
        Some(out)
    }
}

/// Renders [`FormattedOutput`] for a terminal. Never fails: whatever cannot
/// be styled is printed plain.
pub struct Renderer {
    color: bool,
    highlighter: Option<Highlighter>,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        let highlighter = if color { Highlighter::load() } else { None };
        Self { color, highlighter }
    }

    pub fn render(&self, output: &FormattedOutput) -> String {
        output
            .segments
            .iter()
            .map(|segment| self.render_segment(segment))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_segment(&self, segment: &Segment) -> String {
        match segment {
            Segment::Prose(text) => text
                .lines()
                .map(|line| self.render_inline(line))
                .collect::<Vec<_>>()
                .join("\n"),
            Segment::Heading { text, .. } => self.paint(text, |s| s.bold().underline()),
            Segment::Code { language, body } => self.render_code(language.as_deref(), body),
            Segment::ListItem {
                marker,
                indent,
                text,
            } => {
                let marker = match marker {
                    ListMarker::Numbered(number) => {
                        self.paint(&format!("{number}."), |s| s.yellow().bold())
                    }
                    ListMarker::Bullet => self.paint("•", |s| s.yellow().bold()),
                };
                format!(
                    "{}{} {}",
                    " ".repeat(*indent),
                    marker,
                    self.render_inline(text)
                )
            }
            Segment::Blank => String::new(),
            Segment::TruncationNotice => self.paint(TRUNCATION_NOTICE, |s| s.dimmed().italic()),
        }
    }

    fn render_code(&self, language: Option<&str>, body: &str) -> String {
        if let (Some(highlighter), Some(language)) = (&self.highlighter, language)
            && let Some(highlighted) = highlighter.highlight(language, body)
        {
            return highlighted;
        }
        body.lines()
            .map(|line| format!("{CODE_INDENT}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Styles inline Markdown. Inline code spans are cut out first so their
    /// contents are never treated as emphasis. Without color the markers are
    /// simply removed.
    fn render_inline(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INLINE_CODE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&self.render_emphasis(&text[last..whole.start()]));
            out.push_str(&self.paint(&caps[1], |s| s.green()));
            last = whole.end();
        }
        out.push_str(&self.render_emphasis(&text[last..]));
        out
    }

    fn render_emphasis(&self, text: &str) -> String {
        let linked = LINK.replace_all(text, |caps: &Captures| {
            format!(
                "{} ({})",
                self.paint(&caps[1], |s| s.blue().underline()),
                self.paint(&caps[2], |s| s.dimmed())
            )
        });
        let bolded = BOLD.replace_all(&linked, |caps: &Captures| {
            self.paint(&caps[1], |s| s.bold())
        });
        ITALIC
            .replace_all(&bolded, |caps: &Captures| self.paint(&caps[1], |s| s.dimmed()))
            .into_owned()
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Writes `text` one char at a time. Escape sequences are written without a
/// pause so colors do not flicker in.
pub async fn type_out(out: &mut dyn Write, text: &str, delay: Duration) -> io::Result<()> {
    let mut in_escape = false;
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
        if ch == '\x1b' {
            in_escape = true;
            continue;
        }
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        out.flush()?;
        tokio::time::sleep(delay).await;
    }
    writeln!(out)?;
    out.flush()
}
