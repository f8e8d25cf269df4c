use std::sync::Arc;

use clap::ArgMatches;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tether_core::{
    Backend, Backoff, CommandSpeaker, LogSink, PreferenceStore, SharedPoller, run_polling,
};

use super::{build_poller, load_config_with_warning, preferences, remember_chat, resolve_context};
use crate::terminal::TerminalSink;

/// Follow the active chat until Ctrl-C, sending each stdin line as a message.
pub(crate) async fn handle_watch_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, TerminalSink::stdout(), context)?;

    match CommandSpeaker::from_config(&config.speech) {
        Ok(speaker) => poller = poller.with_speaker(Box::new(speaker)),
        Err(e) => {
            if preferences.speech_enabled() {
                eprintln!("Warning: Speech is on but unavailable: {}", e);
            }
            warn!(event = "cli.watch.speech_unavailable", error = %e);
        }
    }

    info!(
        event = "cli.watch_started",
        url = config.backend.url(),
        context = poller.context().map(|c| c.as_str()).unwrap_or("")
    );

    let shared: SharedPoller<_, _> = Arc::new(Mutex::new(poller));
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let (summary, ()) = tokio::join!(
        run_polling(
            shared.clone(),
            Backoff::from_config(&config.polling),
            cancel.clone()
        ),
        forward_input(shared.clone(), preferences, cancel.clone()),
    );
    interrupt.abort();

    shared.lock().await.stop_speech();

    info!(
        event = "cli.watch_completed",
        cycles = summary.cycles,
        updates = summary.updates,
        failures = summary.failures
    );
    Ok(())
}

/// Send every non-empty stdin line to the active chat until cancelled.
///
/// Closed input leaves the log view running.
async fn forward_input<B, S>(
    poller: SharedPoller<B, S>,
    preferences: PreferenceStore,
    cancel: CancellationToken,
) where
    B: Backend,
    S: LogSink,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            line = lines.next_line() => line,
        };

        let text = match line {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(event = "cli.watch.input_closed");
                cancel.cancelled().await;
                return;
            }
            Err(e) => {
                warn!(event = "cli.watch.input_failed", error = %e);
                cancel.cancelled().await;
                return;
            }
        };
        if text.trim().is_empty() {
            continue;
        }

        let result = poller.lock().await.send_message(&text).await;
        match result {
            Ok(context) => remember_chat(&preferences, &context),
            Err(e) => {
                eprintln!("❌ Failed to send message: {}", e);
                warn!(event = "cli.watch.send_failed", error = %e);
            }
        }
    }
}
