use std::path::PathBuf;

use crate::history::{Exchange, TranscriptRecord};
use crate::model::Message;

const MAX_CONTEXT_MESSAGES: usize = 40;

/// What has been said so far in this invocation.
///
/// `context` is what gets sent with the next request (resumed turns plus new
/// ones, trimmed to a window). `exchanges` holds only this invocation's turns
/// and is what ends up in the transcript.
#[derive(Debug, Default)]
pub struct Conversation {
    context: Vec<Message>,
    exchanges: Vec<Exchange>,
    resumed_from: Option<PathBuf>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the context with a prior transcript. The prior file is only read.
    pub fn resume(&mut self, path: PathBuf, prior: &TranscriptRecord) {
        self.context = prior.messages();
        self.trim_context();
        self.resumed_from = Some(path);
    }

    pub fn context(&self) -> &[Message] {
        &self.context
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn resumed_from(&self) -> Option<&PathBuf> {
        self.resumed_from.as_ref()
    }

    pub fn record(&mut self, exchange: Exchange) {
        self.context.push(Message::user(exchange.prompt.clone()));
        self.context
            .push(Message::assistant(exchange.response.clone()));
        self.exchanges.push(exchange);
        self.trim_context();
    }

    /// Forgets the context sent to the model. Already answered exchanges
    /// still go to the transcript.
    pub fn reset(&mut self) {
        self.context.clear();
    }

    fn trim_context(&mut self) {
        if self.context.len() <= MAX_CONTEXT_MESSAGES {
            return;
        }
        // Drop whole user/assistant pairs so the context still opens with a user turn.
        let excess = self.context.len() - MAX_CONTEXT_MESSAGES;
        let drop = excess + excess % 2;
        self.context.drain(..drop);
    }
}
