use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

use crate::history::Exchange;
use crate::model_gateway::ModelGateway;
use crate::session::Session;

/// Runs an interactive conversation. A failed turn is reported and the loop
/// carries on; only I/O errors on the terminal end it early.
pub async fn run_repl<G>(
    session: &mut Session<'_, G>,
    first_prompt: Option<&str>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()>
where
    G: ModelGateway,
{
    writeln!(
        out,
        "\nConversation started. Enter 'exit' or 'quit' to end it, '/history' to list turns, \
         or '/reset' to clear the model's context."
    )
    .context("Failed to write to stdout")?;

    if let Some(prompt) = first_prompt {
        run_turn(session, prompt, out).await?;
    }

    loop {
        write!(out, "\nYou: ").context("Failed to write to stdout")?;
        out.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("Failed to read stdin")?;
        if read == 0 {
            writeln!(out).context("Failed to write to stdout")?;
            break;
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt.eq_ignore_ascii_case("exit") || prompt.eq_ignore_ascii_case("quit") {
            writeln!(out, "\nEnding conversation.").context("Failed to write to stdout")?;
            break;
        }
        if prompt.eq_ignore_ascii_case("/reset") {
            session.conversation_mut().reset();
            writeln!(out, "context cleared").context("Failed to write to stdout")?;
            continue;
        }
        if prompt.eq_ignore_ascii_case("/history") {
            print_history(out, session.conversation().exchanges())?;
            continue;
        }

        run_turn(session, prompt, out).await?;
    }

    Ok(())
}

async fn run_turn<G>(session: &mut Session<'_, G>, prompt: &str, out: &mut dyn Write) -> Result<()>
where
    G: ModelGateway,
{
    if let Err(err) = session.ask(prompt, out).await {
        debug!(error = %format!("{err:#}"), "interactive turn failed");
        writeln!(out, "error: {err:#}").context("Failed to write to stdout")?;
    }
    Ok(())
}

fn print_history(out: &mut dyn Write, exchanges: &[Exchange]) -> Result<()> {
    if exchanges.is_empty() {
        writeln!(out, "(no exchanges yet)").context("Failed to write to stdout")?;
        return Ok(());
    }

    for (idx, exchange) in exchanges.iter().enumerate() {
        writeln!(
            out,
            "[{}] You: {}\n    Claude: {}",
            idx + 1,
            first_line(&exchange.prompt),
            first_line(&exchange.response)
        )
        .context("Failed to write to stdout")?;
    }
    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
