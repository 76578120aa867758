//! Terminal shell for the portfolio assistant.

use clap::{Parser, Subcommand};
use folio::chat::FallbackClient;
use folio::chat::backend::HttpCompletionBackend;
use folio::chat::session::{ChatSession, SubmitOutcome};
use folio::clock::SiteClock;
use folio::markup::strip_tags;
use folio::runtime::{EventReceiver, RequestSequencer, event_channel};
use folio::scheduler::{ClockTicker, WeatherPoller};
use folio::voice::{RecognitionEvent, VoiceAction, VoiceSession};
use folio::weather::{OpenMeteoClient, WeatherSource};
use folio::{AssistantConfig, AssistantEvent, CommandInterpreter, SessionStore, SharedStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Folio: portfolio assistant in the terminal.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default).
    Chat {
        /// Do not poll the weather provider.
        #[arg(long)]
        offline: bool,
    },

    /// Submit one message and print the reply.
    Ask {
        /// Message text.
        text: Vec<String>,
    },

    /// Write the default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("folio=warn,reqwest=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AssistantConfig::default_config_path);

    match cli.command.unwrap_or(Command::Chat { offline: false }) {
        Command::InitConfig { force } => init_config(&config_path, force),
        Command::Ask { text } => {
            let config = AssistantConfig::load_or_default(&config_path)?;
            run_ask(config, &text.join(" ")).await
        }
        Command::Chat { offline } => {
            let config = AssistantConfig::load_or_default(&config_path)?;
            run_chat(config, offline).await
        }
    }
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AssistantConfig::default().save_to_file(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Everything one visit needs.
struct Shell {
    store: SharedStore,
    interpreter: Arc<CommandInterpreter>,
    chat: ChatSession,
    weather: Arc<dyn WeatherSource>,
}

fn build_shell(config: &AssistantConfig, events: folio::runtime::EventSender) -> anyhow::Result<Shell> {
    let store = SessionStore::shared(config)?;
    let weather: Arc<dyn WeatherSource> =
        Arc::new(OpenMeteoClient::new(&config.weather, config.site.place.clone()));
    let sequencer = Arc::new(RequestSequencer::new());

    let interpreter = Arc::new(
        CommandInterpreter::new(config, Arc::clone(&store))?
            .with_weather_source(Arc::clone(&weather))
            .with_events(events)
            .with_sequencer(sequencer),
    );
    let fallback = FallbackClient::new(
        Arc::new(HttpCompletionBackend::new(&config.chat)),
        Arc::clone(&store),
    );
    let chat = ChatSession::new(&config.chat, Arc::clone(&interpreter), fallback)?;

    Ok(Shell {
        store,
        interpreter,
        chat,
        weather,
    })
}

async fn run_ask(config: AssistantConfig, text: &str) -> anyhow::Result<()> {
    let (tx, mut rx) = event_channel();
    let shell = build_shell(&config, tx)?;

    print_outcome(shell.chat.submit(text).await);

    // Only a pending follow-up task still holds a sender once the shell is gone.
    drop(shell);
    let follow_up = tokio::time::timeout(Duration::from_secs(15), async {
        while let Some(event) = rx.recv().await {
            if let AssistantEvent::FollowUp { text, .. } = event {
                return Some(text);
            }
        }
        None
    })
    .await;
    if let Ok(Some(text)) = follow_up {
        println!("{}", strip_tags(&text));
    }
    Ok(())
}

async fn run_chat(config: AssistantConfig, offline: bool) -> anyhow::Result<()> {
    println!("Folio v{}", env!("CARGO_PKG_VERSION"));

    let (tx, rx) = event_channel();
    let shell = build_shell(&config, tx.clone())?;
    let mut voice = VoiceSession::new(
        Arc::clone(&shell.interpreter),
        config.site.owner_name.clone(),
        true,
    );

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    let clock = SiteClock::new(&config.clock)?;
    tokio::spawn(
        ClockTicker::new(clock, tx.clone(), cancel.child_token())
            .with_interval(Duration::from_millis(config.clock.tick_ms.max(100)))
            .run(),
    );
    if !offline {
        tokio::spawn(
            WeatherPoller::new(
                Arc::clone(&shell.weather),
                Arc::clone(&shell.store),
                tx.clone(),
                cancel.child_token(),
            )
            .with_interval(Duration::from_secs(config.weather.poll_secs.max(1)))
            .run(),
        );
    }
    drop(tx);

    let last_tick = Arc::new(Mutex::new(String::new()));
    tokio::spawn(print_events(rx, Arc::clone(&last_tick)));

    println!("\nType a message. Commands: /say <text>, /music, /ended, /state, /clock, /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest)) {
            ("/quit", _) => break,
            ("/say", rest) => {
                let action = voice.handle(RecognitionEvent::Transcript {
                    text: rest.to_owned(),
                    is_final: true,
                });
                print_voice(action);
            }
            ("/music", _) => {
                let playing = shell.store.toggle_playback();
                println!("[music] {}", if playing { "playing" } else { "paused" });
            }
            ("/ended", _) => {
                shell.store.on_track_ended();
                println!("[music] track ended");
            }
            ("/state", _) => {
                let state = shell.store.snapshot();
                println!(
                    "[state] tab={} playing={} theme={} weather={} history={}",
                    state.active_tab,
                    state.playing,
                    state.theme,
                    state.weather.widget_text(),
                    state.history.len()
                );
            }
            ("/clock", _) => {
                let tick = last_tick.lock().unwrap_or_else(PoisonError::into_inner).clone();
                println!("[clock] {tick}");
            }
            _ => print_outcome(shell.chat.submit(line).await),
        }
    }

    cancel.cancel();
    println!("Bye!");
    Ok(())
}

fn print_outcome(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Reply { text, .. } => println!("{}", strip_tags(&text)),
        SubmitOutcome::Rejected(e) => println!("(wait: {e})"),
        SubmitOutcome::Ignored | SubmitOutcome::Superseded { .. } => {}
    }
}

fn print_voice(action: VoiceAction) {
    match action {
        VoiceAction::Speak(text) => println!("(spoken) {text}"),
        VoiceAction::Status(status) => println!("(status) {status}"),
        VoiceAction::Retry { speak, .. } => println!("(spoken) {speak}"),
        VoiceAction::Idle => {}
    }
}

async fn print_events(mut rx: EventReceiver, last_tick: Arc<Mutex<String>>) {
    while let Some(event) = rx.recv().await {
        match event {
            AssistantEvent::FollowUp { text, .. } => println!("{}", strip_tags(&text)),
            AssistantEvent::TabChanged { tab } => println!("[tab] {tab}"),
            AssistantEvent::ThemeChanged { palette } => {
                println!("[theme] {palette} {}", palette.css_variables());
            }
            AssistantEvent::PlaybackChanged { playing } => {
                println!("[music] {}", if playing { "playing" } else { "paused" });
            }
            AssistantEvent::ClockTick { time, date } => {
                *last_tick.lock().unwrap_or_else(PoisonError::into_inner) = format!("{time} {date}");
            }
            AssistantEvent::WeatherUpdated { display: widget } => info!("weather widget: {widget}"),
        }
    }
}
