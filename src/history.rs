//! Transcript persistence: one plain-text file per invocation.
//!
//! Files are named `YYYY-MM-DD-HH:MM:SS-<summary>.txt` and are never
//! rewritten once created. Each message body is preceded by its byte length,
//! so a transcript reads back exactly even when a response contains text
//! that looks like a header.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::model::{Message, MessageRole};

const MAGIC_LINE: &str = "# quip transcript";
const FALLBACK_SUMMARY: &str = "general-chat-log";
const SUMMARY_WORDS: usize = 3;
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub created_at: DateTime<FixedOffset>,
    pub model: String,
    pub summary: String,
    pub resumed_from: Option<PathBuf>,
    pub exchanges: Vec<Exchange>,
}

impl TranscriptRecord {
    /// Prior turns as API messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.exchanges
            .iter()
            .flat_map(|exchange| {
                [
                    Message::user(exchange.prompt.clone()),
                    Message::assistant(exchange.response.clone()),
                ]
            })
            .collect()
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        text.push_str(MAGIC_LINE);
        text.push('\n');
        text.push_str(&format!("# created: {}\n", self.created_at.to_rfc3339()));
        text.push_str(&format!("# model: {}\n", self.model));
        text.push_str(&format!("# summary: {}\n", self.summary));
        if let Some(path) = &self.resumed_from {
            text.push_str(&format!("# resumed-from: {}\n", path.display()));
        }
        text.push('\n');

        for exchange in &self.exchanges {
            push_block(&mut text, MessageRole::User, &exchange.prompt);
            push_block(&mut text, MessageRole::Assistant, &exchange.response);
        }
        text
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut rest = text
            .strip_prefix(MAGIC_LINE)
            .and_then(|rest| rest.strip_prefix('\n'))
            .ok_or_else(|| anyhow!("not a quip transcript (missing '{MAGIC_LINE}' line)"))?;

        let mut created_at = None;
        let mut model = None;
        let mut summary = None;
        let mut resumed_from = None;
        loop {
            let (line, after) = rest
                .split_once('\n')
                .ok_or_else(|| anyhow!("transcript header is not terminated"))?;
            rest = after;
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line
                .strip_prefix("# ")
                .and_then(|header| header.split_once(": "))
            else {
                bail!("malformed transcript header line '{line}'");
            };
            match key {
                "created" => {
                    created_at = Some(
                        DateTime::parse_from_rfc3339(value)
                            .with_context(|| format!("invalid created timestamp '{value}'"))?,
                    )
                }
                "model" => model = Some(value.to_string()),
                "summary" => summary = Some(value.to_string()),
                "resumed-from" => resumed_from = Some(PathBuf::from(value)),
                _ => {}
            }
        }

        let mut exchanges = Vec::new();
        while !rest.is_empty() {
            let (prompt, after_prompt) = take_block(rest, MessageRole::User)?;
            let (response, after_response) = take_block(after_prompt, MessageRole::Assistant)?;
            exchanges.push(Exchange {
                prompt: prompt.to_string(),
                response: response.to_string(),
            });
            rest = after_response;
        }

        Ok(Self {
            created_at: created_at.ok_or_else(|| anyhow!("transcript has no created header"))?,
            model: model.unwrap_or_default(),
            summary: summary.unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
            resumed_from,
            exchanges,
        })
    }
}

fn push_block(text: &mut String, role: MessageRole, body: &str) {
    text.push_str(&format!("{} [{} bytes]:\n", role.speaker(), body.len()));
    text.push_str(body);
    text.push_str("\n\n");
}

fn take_block(rest: &str, role: MessageRole) -> Result<(&str, &str)> {
    let (header, after) = rest
        .split_once('\n')
        .ok_or_else(|| anyhow!("truncated transcript block"))?;
    let len = header
        .strip_prefix(role.speaker())
        .and_then(|header| header.strip_prefix(" ["))
        .and_then(|header| header.strip_suffix(" bytes]:"))
        .and_then(|len| len.parse::<usize>().ok())
        .ok_or_else(|| {
            anyhow!(
                "expected a '{} [<n> bytes]:' header, found '{header}'",
                role.speaker()
            )
        })?;
    let body = after
        .get(..len)
        .ok_or_else(|| anyhow!("transcript block is shorter than its {len} byte header"))?;
    let remainder = after[len..]
        .strip_prefix("\n\n")
        .ok_or_else(|| anyhow!("transcript block is not followed by a blank line"))?;
    Ok((body, remainder))
}

/// Three-word, filename-safe summary of a prompt: `"What is 2+2?"` becomes
/// `what-is-2+2`.
pub fn summarize(prompt: &str) -> String {
    let words: Vec<String> = prompt
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '+')
                .map(|ch| ch.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .take(SUMMARY_WORDS)
        .collect();

    if words.is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        words.join("-")
    }
}

pub fn transcript_file_name(created_at: &DateTime<FixedOffset>, summary: &str) -> String {
    format!("{}-{}.txt", created_at.format("%Y-%m-%d-%H:%M:%S"), summary)
}

/// Writes `record` into `dir` under a fresh name and returns the path.
///
/// Names have one-second resolution; a clash with an existing file gets a
/// `-2`, `-3`, ... suffix instead of overwriting it.
pub fn write_transcript(dir: &Path, record: &TranscriptRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create history directory '{}'", dir.display()))?;

    let base = transcript_file_name(&record.created_at, &record.summary);
    let stem = base.trim_end_matches(".txt");
    let contents = record.to_text();

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            base.clone()
        } else {
            format!("{stem}-{attempt}.txt")
        };
        let path = dir.join(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to create transcript '{}'", path.display())
                });
            }
        };
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .with_context(|| format!("failed to write transcript '{}'", path.display()))?;
        return Ok(path);
    }

    bail!(
        "could not find a free transcript name for '{}' in '{}'",
        base,
        dir.display()
    )
}

pub fn read_transcript(path: &Path) -> Result<TranscriptRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read transcript '{}'", path.display()))?;
    TranscriptRecord::parse(&text)
        .with_context(|| format!("failed to parse transcript '{}'", path.display()))
}
