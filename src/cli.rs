use clap::Parser;
use std::path::PathBuf;

use crate::request::{DEFAULT_MAX_TOKENS, StyleFlags};
use crate::session::SessionSettings;

#[derive(Debug, Parser)]
#[command(name = "quip")]
#[command(version, about = "Ask Claude from the terminal and keep a transcript of the answer")]
pub struct Cli {
    /// The prompt to send to Claude
    #[arg(value_name = "PROMPT", required_unless_present = "interactive")]
    pub prompt: Vec<String>,

    /// Format the response as a numbered list
    #[arg(short, long)]
    pub concise: bool,

    /// Request a short response (one paragraph or less)
    #[arg(short, long)]
    pub short: bool,

    /// The model to use (auto-selected from the prompt when omitted)
    #[arg(long, value_name = "ID", value_parser = parse_model_override)]
    pub model: Option<String>,

    /// Maximum number of tokens in the response
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_TOKENS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_tokens: u32,

    /// Keep the conversation going after the first answer
    #[arg(short, long)]
    pub interactive: bool,

    /// Continue from a saved transcript (read only; a new transcript is written)
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Disable colors and syntax highlighting
    #[arg(long)]
    pub no_color: bool,

    /// Type the response out character by character
    #[arg(long)]
    pub animate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The prompt words joined back together, or `None` if there are none.
    pub fn prompt_text(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        }
    }

    pub fn style_flags(&self) -> StyleFlags {
        StyleFlags {
            concise: self.concise,
            short: self.short,
        }
    }

    pub fn session_settings(&self, color: bool, show_progress: bool) -> SessionSettings {
        SessionSettings {
            model_override: self.model.clone(),
            max_tokens: self.max_tokens,
            flags: self.style_flags(),
            show_progress,
            animate: self.animate,
            color,
        }
    }
}

fn parse_model_override(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("model name must not be empty".to_string());
    }
    Ok(raw.to_string())
}
