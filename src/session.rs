use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::conversation::Conversation;
use crate::format::{FormatPolicy, format_response};
use crate::history::{self, Exchange, TranscriptRecord};
use crate::model_gateway::ModelGateway;
use crate::progress::with_spinner;
use crate::render::{Renderer, type_out};
use crate::request::{RequestConfig, StyleFlags, build_request};

const RULE_WIDTH: usize = 50;
const TYPING_DELAY: Duration = Duration::from_millis(2);

/// Per-invocation settings taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub model_override: Option<String>,
    pub max_tokens: u32,
    pub flags: StyleFlags,
    pub show_progress: bool,
    pub animate: bool,
    pub color: bool,
}

pub struct Session<'a, G> {
    gateway: &'a G,
    cfg: &'a Config,
    settings: SessionSettings,
    request_config: Option<RequestConfig>,
    conversation: Conversation,
    renderer: Renderer,
}

impl<'a, G> Session<'a, G>
where
    G: ModelGateway,
{
    pub fn new(gateway: &'a G, cfg: &'a Config, settings: SessionSettings) -> Self {
        let renderer = Renderer::new(settings.color);
        Self {
            gateway,
            cfg,
            settings,
            request_config: None,
            conversation: Conversation::new(),
            renderer,
        }
    }

    pub fn resume(&mut self, path: PathBuf, prior: &TranscriptRecord) {
        info!(
            path = %path.display(),
            prior_exchanges = prior.exchanges.len(),
            "resuming from transcript"
        );
        self.conversation.resume(path, prior);
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// The request settings, fixed by the first prompt of the invocation.
    fn request_config(&mut self, prompt: &str) -> RequestConfig {
        let cfg = self.cfg;
        let settings = &self.settings;
        self.request_config
            .get_or_insert_with(|| {
                let request_config = RequestConfig::new(
                    cfg,
                    prompt,
                    settings.model_override.as_deref(),
                    settings.max_tokens,
                    settings.flags,
                );
                info!(
                    model = %request_config.model.id(&cfg.models),
                    tier = request_config.model.tier_name(),
                    style = request_config.style().as_str(),
                    max_tokens = request_config.max_tokens,
                    "selected model"
                );
                request_config
            })
            .clone()
    }

    /// Sends one prompt, prints the prompt as sent followed by the formatted
    /// answer, and records the exchange. On error nothing is printed or
    /// recorded.
    pub async fn ask(&mut self, prompt: &str, out: &mut dyn Write) -> Result<()> {
        let request_config = self.request_config(prompt);
        let request = build_request(
            self.conversation.context(),
            prompt,
            &request_config,
            self.cfg,
        );
        let model = request.model.clone();
        let sent_prompt = request
            .messages
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();

        let response = with_spinner(self.settings.show_progress, self.gateway.submit(request))
            .await
            .inspect_err(|err| {
                warn!(model = %model, kind = err.kind(), error = %err, "request failed");
            })?;

        let formatted = format_response(
            &response.content,
            request_config.style(),
            &FormatPolicy::from(&self.cfg.thresholds),
        );
        let rendered = self.renderer.render(&formatted);
        self.print_prompt(out, &sent_prompt)?;
        self.print_response(out, &model, &rendered).await?;

        self.conversation.record(Exchange {
            prompt: prompt.to_string(),
            response: response.content,
        });
        Ok(())
    }

    fn print_prompt(&self, out: &mut dyn Write, sent_prompt: &str) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let header = if self.settings.color {
            format!("{}:", "PROMPT".blue().bold())
        } else {
            "PROMPT:".to_string()
        };
        writeln!(out, "\n{rule}\n{header}\n\n{sent_prompt}").context("Failed to write prompt")
    }

    async fn print_response(&self, out: &mut dyn Write, model: &str, rendered: &str) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let header = format!("CLAUDE'S RESPONSE ({model})");
        let header = if self.settings.color {
            header.green().bold().to_string()
        } else {
            header
        };
        writeln!(out, "\n{rule}\n{header}\n").context("Failed to write response")?;
        if self.settings.animate {
            type_out(out, rendered, TYPING_DELAY)
                .await
                .context("Failed to write response")?;
        } else {
            writeln!(out, "{rendered}").context("Failed to write response")?;
        }
        writeln!(out, "{rule}").context("Failed to write response")?;
        out.flush().context("Failed to flush stdout")
    }

    fn transcript(&self) -> Option<TranscriptRecord> {
        let first = self.conversation.exchanges().first()?;
        let model = self
            .request_config
            .as_ref()
            .map(|request_config| request_config.model.id(&self.cfg.models).to_string())
            .unwrap_or_default();
        Some(TranscriptRecord {
            created_at: Local::now().fixed_offset(),
            model,
            summary: history::summarize(&first.prompt),
            resumed_from: self.conversation.resumed_from().cloned(),
            exchanges: self.conversation.exchanges().to_vec(),
        })
    }

    /// Writes the transcript, if anything was answered. Failure here never
    /// affects the exit status: it is reported once on `err_out`.
    pub fn persist(&self, out: &mut dyn Write, err_out: &mut dyn Write) -> Option<PathBuf> {
        let record = self.transcript()?;
        match history::write_transcript(&self.cfg.history_dir, &record) {
            Ok(path) => {
                info!(
                    path = %path.display(),
                    exchanges = record.exchanges.len(),
                    "saved transcript"
                );
                let _ = writeln!(out, "Transcript saved to: {}", path.display());
                Some(path)
            }
            Err(err) => {
                debug!(
                    history_dir = %self.cfg.history_dir.display(),
                    error = %format!("{err:#}"),
                    "failed to save transcript"
                );
                let label = if self.settings.color {
                    "warning:".yellow().bold().to_string()
                } else {
                    "warning:".to_string()
                };
                let _ = writeln!(err_out, "{label} transcript not saved: {err:#}");
                None
            }
        }
    }
}
