use crate::config::Config;
use crate::model::Message;
use crate::model_gateway::ModelGatewayRequest;
use crate::model_selector::{ModelChoice, select_model};

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const INSTRUCTIONS_PREFIX: &str = "\n\nAdditional instructions: ";
const CONCISE_INSTRUCTION: &str = "Please format your response as a numbered list.";
const SHORT_INSTRUCTION: &str = "Please keep your response to one paragraph or less.";

/// How the response is post-processed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleMode {
    #[default]
    Normal,
    Short,
    Concise,
}

impl StyleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Short => "short",
            Self::Concise => "concise",
        }
    }
}

/// The `-c` / `-s` switches as given on the command line.
///
/// Both may be set: each adds its instruction to the request, and concise
/// wins when picking the display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleFlags {
    pub concise: bool,
    pub short: bool,
}

impl StyleFlags {
    pub fn mode(&self) -> StyleMode {
        if self.concise {
            StyleMode::Concise
        } else if self.short {
            StyleMode::Short
        } else {
            StyleMode::Normal
        }
    }

    fn instructions(&self) -> Vec<&'static str> {
        let mut instructions = Vec::new();
        if self.concise {
            instructions.push(CONCISE_INSTRUCTION);
        }
        if self.short {
            instructions.push(SHORT_INSTRUCTION);
        }
        instructions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub model: ModelChoice,
    pub max_tokens: u32,
    pub flags: StyleFlags,
}

impl RequestConfig {
    /// Builds the per-invocation request settings, running model selection
    /// against the first prompt.
    pub fn new(
        cfg: &Config,
        first_prompt: &str,
        model_override: Option<&str>,
        max_tokens: u32,
        flags: StyleFlags,
    ) -> Self {
        let model = select_model(first_prompt, model_override, flags, &cfg.thresholds);
        Self {
            model,
            max_tokens,
            flags,
        }
    }

    pub fn style(&self) -> StyleMode {
        self.flags.mode()
    }
}

/// Appends the style instructions, if any, to the outgoing user turn.
pub fn apply_style(prompt: &str, flags: StyleFlags) -> String {
    let instructions = flags.instructions();
    if instructions.is_empty() {
        return prompt.to_string();
    }
    format!("{prompt}{INSTRUCTIONS_PREFIX}{}", instructions.join(" "))
}

/// Assembles the gateway payload. Prior turns are sent as recorded; only the
/// new prompt carries the style instructions.
pub fn build_request(
    history: &[Message],
    prompt: &str,
    request_config: &RequestConfig,
    cfg: &Config,
) -> ModelGatewayRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend_from_slice(history);
    messages.push(Message::user(apply_style(prompt, request_config.flags)));

    ModelGatewayRequest {
        model: request_config.model.id(&cfg.models).to_string(),
        max_tokens: request_config.max_tokens,
        system: cfg.system_prompt.clone(),
        messages,
    }
}
