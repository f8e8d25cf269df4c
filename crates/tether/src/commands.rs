use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use tracing::{error, info, warn};

use tether_core::chat::{RESTART_HEALTH_ATTEMPTS, RESTART_HEALTH_INTERVAL};
use tether_core::config::{Config, TetherConfig};
use tether_core::events;
use tether_core::{
    ChatError, HttpBackend, LogSink, LogView, Poller, PreferenceStore, RestartOutcome,
    SessionContext,
};

use crate::terminal::TerminalSink;

mod completions;
mod watch;

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
///
/// The global `--url` flag is applied on top and the result validated.
fn load_config_with_warning(
    matches: &ArgMatches,
) -> Result<TetherConfig, Box<dyn std::error::Error>> {
    let mut config = match TetherConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.tether/config.toml and ./.tether/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            TetherConfig::default()
        }
    };

    if let Some(url) = matches.get_one::<String>("url") {
        config.backend.url = Some(url.clone());
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        error!(event = "cli.config.invalid", error = %e);
        return Err(e.into());
    }

    Ok(config)
}

fn preferences() -> PreferenceStore {
    PreferenceStore::new(Config::default().preferences_path())
}

/// `--context`, falling back to the last selected chat.
fn resolve_context(matches: &ArgMatches, preferences: &PreferenceStore) -> Option<SessionContext> {
    matches
        .get_one::<String>("context")
        .map(|c| SessionContext::new(c.as_str()))
        .or_else(|| preferences.last_selected_chat().map(SessionContext::new))
}

fn build_poller<S: LogSink>(
    config: &TetherConfig,
    preferences: &PreferenceStore,
    sink: S,
    context: Option<SessionContext>,
) -> Result<Poller<HttpBackend, S>, Box<dyn std::error::Error>> {
    let backend = HttpBackend::new(&config.backend)?;
    let poller =
        Poller::new(backend, sink, config.backend.timezone()).with_preferences(preferences.clone());

    Ok(match context {
        Some(context) => poller.with_context(context),
        None => poller,
    })
}

fn remember_chat(preferences: &PreferenceStore, context: &SessionContext) {
    if let Err(e) = preferences.set_last_selected_chat(context.as_str()) {
        warn!(
            event = "cli.preferences.save_failed",
            context = %context,
            error = %e
        );
    }
}

/// Report a failed chat operation the same way for every command.
fn report_chat_error(action: &str, event: &str, e: ChatError) -> Box<dyn std::error::Error> {
    eprintln!("❌ Failed to {}: {}", action, e);
    error!(event = event, error = %e);
    events::log_app_error(&e);
    e.into()
}

pub async fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let result = match matches.subcommand() {
        Some(("watch", sub_matches)) => watch::handle_watch_command(sub_matches).await,
        Some(("send", sub_matches)) => handle_send_command(sub_matches).await,
        Some(("chats", sub_matches)) => handle_chats_command(sub_matches).await,
        Some(("new", sub_matches)) => handle_new_command(sub_matches),
        Some(("select", sub_matches)) => handle_select_command(sub_matches).await,
        Some(("reset", sub_matches)) => handle_reset_command(sub_matches).await,
        Some(("remove", sub_matches)) => handle_remove_command(sub_matches).await,
        Some(("pause", sub_matches)) => handle_pause_command(sub_matches, true).await,
        Some(("resume", sub_matches)) => handle_pause_command(sub_matches, false).await,
        Some(("nudge", sub_matches)) => handle_nudge_command(sub_matches).await,
        Some(("restart", sub_matches)) => handle_restart_command(sub_matches).await,
        Some(("save", sub_matches)) => handle_save_command(sub_matches).await,
        Some(("load", sub_matches)) => handle_load_command(sub_matches).await,
        Some(("speech", sub_matches)) => handle_speech_command(sub_matches),
        Some(("completions", sub_matches)) => completions::handle_completions_command(sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown();
    result
}

async fn handle_send_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let text = matches
        .get_many::<String>("text")
        .ok_or("Message text is required")?
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    info!(event = "cli.send_started", chars = text.chars().count());

    match poller.send_message(&text).await {
        Ok(context) => {
            remember_chat(&preferences, &context);
            println!("✅ Message sent to chat {}", context);
            info!(event = "cli.send_completed", context = %context);
            Ok(())
        }
        Err(e) => Err(report_chat_error("send message", "cli.send_failed", e)),
    }
}

async fn handle_chats_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = preferences.last_selected_chat().map(SessionContext::new);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    info!(event = "cli.chats_started", json_output = json_output);

    poller.poll().await?;
    if !poller.is_connected() {
        let message = format!("Backend unreachable at {}", config.backend.url());
        eprintln!("❌ Failed to list chats: {}", message);
        error!(event = "cli.chats_failed", url = config.backend.url());
        return Err(message.into());
    }

    let chats = poller.chats();
    if json_output {
        println!("{}", serde_json::to_string_pretty(chats)?);
    } else if chats.is_empty() {
        println!("No chats found.");
    } else {
        let active = poller.context().map(|c| c.as_str());
        for chat in chats {
            let marker = if Some(chat.id.as_str()) == active { '*' } else { ' ' };
            let name = chat.name.as_deref().unwrap_or("");
            println!("{} {}  {}", marker, chat.id, name);
        }
    }

    info!(event = "cli.chats_completed", count = chats.len());
    Ok(())
}

fn handle_new_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let mut poller = build_poller(&config, &preferences, LogView::new(), None)?;

    match poller.new_chat() {
        Ok(context) => {
            println!("✅ New chat: {}", context);
            info!(event = "cli.new_completed", context = %context);
            Ok(())
        }
        Err(e) => Err(report_chat_error("start chat", "cli.new_failed", e)),
    }
}

async fn handle_select_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let id = matches
        .get_one::<String>("id")
        .ok_or("Chat id is required")?;

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let mut poller = build_poller(&config, &preferences, TerminalSink::stdout(), None)?;

    match poller.select_chat(SessionContext::new(id.as_str())).await {
        Ok(_) => {
            if !poller.is_connected() {
                eprintln!(
                    "Warning: Backend unreachable at {}. Chat selected, log not shown.",
                    config.backend.url()
                );
            }
            info!(event = "cli.select_completed", context = %id);
            Ok(())
        }
        Err(e) => Err(report_chat_error("select chat", "cli.select_failed", e)),
    }
}

async fn handle_reset_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    match poller.reset_chat(None).await {
        Ok(context) => {
            println!("✅ Chat {} reset", context);
            info!(event = "cli.reset_completed", context = %context);
            Ok(())
        }
        Err(e) => Err(report_chat_error("reset chat", "cli.reset_failed", e)),
    }
}

async fn handle_remove_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let id = matches
        .get_one::<String>("id")
        .ok_or("Chat id is required")?;

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = preferences.last_selected_chat().map(SessionContext::new);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    // Learn the other chats so a removed active chat has somewhere to go.
    poller.poll().await?;

    match poller.remove_chat(&SessionContext::new(id.as_str())).await {
        Ok(active) => {
            println!("✅ Chat {} removed", id);
            if let Some(active) = active {
                println!("Active chat: {}", active);
            }
            info!(event = "cli.remove_completed", context = %id);
            Ok(())
        }
        Err(e) => Err(report_chat_error("remove chat", "cli.remove_failed", e)),
    }
}

async fn handle_pause_command(
    matches: &ArgMatches,
    paused: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (action, event) = if paused {
        ("pause agent", "cli.pause_failed")
    } else {
        ("resume agent", "cli.resume_failed")
    };

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    match poller.pause_agent(paused).await {
        Ok(()) => {
            if paused {
                println!("⏸️  Agent paused");
            } else {
                println!("▶️  Agent resumed");
            }
            info!(event = "cli.pause_completed", paused = paused);
            Ok(())
        }
        Err(e) => Err(report_chat_error(action, event, e)),
    }
}

async fn handle_nudge_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    match poller.nudge_agent(None).await {
        Ok(context) => {
            println!("✅ Agent of chat {} nudged", context);
            info!(event = "cli.nudge_completed", context = %context);
            Ok(())
        }
        Err(e) => Err(report_chat_error("nudge agent", "cli.nudge_failed", e)),
    }
}

async fn handle_restart_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = preferences.last_selected_chat().map(SessionContext::new);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    // Restarting needs a backend that answered a moment ago.
    poller.poll().await?;

    println!("Restarting...");
    match poller
        .restart_backend(RESTART_HEALTH_ATTEMPTS, RESTART_HEALTH_INTERVAL)
        .await
    {
        Ok(outcome) => {
            let health_checks = match outcome {
                RestartOutcome::Acknowledged => 0,
                RestartOutcome::CameBack { attempts } => attempts,
            };
            println!("✅ Restarted");
            info!(event = "cli.restart_completed", health_checks = health_checks);
            Ok(())
        }
        Err(e) => Err(report_chat_error("restart backend", "cli.restart_failed", e)),
    }
}

/// File name for an exported chat; anything that could escape `dir` is replaced.
fn chat_file_path(dir: &Path, context: &str) -> PathBuf {
    let stem: String = context
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}.json", stem))
}

async fn handle_save_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let dir = matches
        .get_one::<PathBuf>("dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let context = resolve_context(matches, &preferences);
    let mut poller = build_poller(&config, &preferences, LogView::new(), context)?;

    let export = match poller.export_chat(None).await {
        Ok(export) => export,
        Err(e) => return Err(report_chat_error("save chat", "cli.save_failed", e)),
    };

    let path = chat_file_path(&dir, &export.ctxid);
    if let Err(e) = fs::write(&path, &export.content) {
        eprintln!("❌ Failed to write '{}': {}", path.display(), e);
        error!(event = "cli.save_failed", path = %path.display(), error = %e);
        return Err(e.into());
    }

    println!("✅ Chat saved to {}", path.display());
    info!(
        event = "cli.save_completed",
        context = %export.ctxid,
        path = %path.display()
    );
    Ok(())
}

async fn handle_load_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let files: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("files")
        .ok_or("At least one chat file is required")?
        .collect();

    let mut chats = Vec::with_capacity(files.len());
    for file in &files {
        match fs::read_to_string(file) {
            Ok(content) => chats.push(content),
            Err(e) => {
                eprintln!("❌ Failed to read '{}': {}", file.display(), e);
                error!(event = "cli.load_failed", path = %file.display(), error = %e);
                return Err(e.into());
            }
        }
    }

    let config = load_config_with_warning(matches)?;
    let preferences = preferences();
    let mut poller = build_poller(&config, &preferences, LogView::new(), None)?;

    match poller.load_chats(chats).await {
        Ok(loaded) => {
            println!("✅ Loaded {} chat(s)", loaded.len());
            for context in &loaded {
                println!("  {}", context);
            }
            if let Some(active) = poller.context() {
                println!("Active chat: {}", active);
            }
            info!(event = "cli.load_completed", count = loaded.len());
            Ok(())
        }
        Err(e) => Err(report_chat_error("load chats", "cli.load_failed", e)),
    }
}

fn handle_speech_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let enabled = matches
        .get_one::<String>("state")
        .map(|s| s == "on")
        .ok_or("Speech state is required")?;

    match preferences().set_speech_enabled(enabled) {
        Ok(()) => {
            println!("Speech {}", if enabled { "on" } else { "off" });
            info!(event = "cli.speech_completed", enabled = enabled);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Failed to save speech preference: {}", e);
            error!(event = "cli.speech_failed", error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}
