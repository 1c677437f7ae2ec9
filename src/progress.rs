use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷", "⣿"];
const SPINNER_TEMPLATE: &str = "{msg} {spinner} {elapsed}";
const SPINNER_MESSAGE: &str = "Claude is thinking";
const TICK_INTERVAL: Duration = Duration::from_millis(100);

fn spinner() -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .map(|style| style.tick_strings(SPINNER_FRAMES))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar = ProgressBar::new_spinner();
    bar.set_style(style);
    bar.set_message(SPINNER_MESSAGE);
    bar
}

/// Awaits `fut` while animating a spinner on stderr.
///
/// The spinner is ticked from the same task, between polls of `fut`, so it
/// stops the moment the request resolves either way. Nothing is drawn when
/// `enabled` is false or stderr is not a terminal.
pub async fn with_spinner<F>(enabled: bool, fut: F) -> F::Output
where
    F: Future,
{
    if !enabled {
        return fut.await;
    }

    let bar = spinner();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(fut);

    let output = loop {
        tokio::select! {
            output = &mut fut => break output,
            _ = ticker.tick() => bar.tick(),
        }
    };
    bar.finish_and_clear();
    output
}
