//! GeoGuide application binary - composition root.
//!
//! 1. Parse the command line and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the Gemini client once and inject it where needed
//! 4. Either serve the chat page and search endpoint, or chat in the terminal

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use geoguide_chat::{
    provider_from_config, render_text, ChatBackend, ChatError, ChatSession, DirectBackend,
    HttpBackend, LocationProvider, MessageView, SubmitOutcome,
};
use geoguide_core::config::GeoguideConfig;
use geoguide_core::error::Result;
use geoguide_model::{GeminiClient, GroundedSearch};

use geoguide_api::routes;
use geoguide_api::state::AppState;

use cli::{CliArgs, Command};

const QUIT_COMMANDS: [&str; 3] = ["/quit", "/exit", "/q"];

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Parse errors are reported once tracing is up.
    let config_file = args.resolve_config_path();
    let loaded = GeoguideConfig::load_optional(&config_file);
    let mut config = match &loaded {
        Ok(Some(config)) => config.clone(),
        Ok(None) | Err(_) => GeoguideConfig::default(),
    };

    // Tracing.
    let filter = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting GeoGuide v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(Some(_)) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Ok(None) => tracing::info!(
            path = %config_file.display(),
            "No config file, using defaults"
        ),
        Err(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Config not loaded, using defaults"
        ),
    }

    args.apply_overrides(&mut config)?;

    match args.command() {
        Command::Serve { .. } => serve(config).await?,
        Command::Chat { .. } => chat(config).await?,
    }
    Ok(())
}

async fn serve(config: GeoguideConfig) -> Result<()> {
    let client = GeminiClient::from_config(&config.model)?;
    tracing::info!(model = %config.model.model, "Gemini client ready");

    let addr = config.server.bind_addr();
    let state = AppState::new(config, Arc::new(client));
    tracing::info!("Chat page at http://{}/", addr);

    routes::start_server(state).await
}

fn build_backend(config: &GeoguideConfig) -> Result<Arc<dyn ChatBackend>> {
    if let Some(url) = &config.chat.server_url {
        let backend = HttpBackend::new(url);
        tracing::info!(url = %backend.url(), "Chatting through search endpoint");
        return Ok(Arc::new(backend));
    }

    let client = GeminiClient::from_config(&config.model)?;
    let search = GroundedSearch::new(Arc::new(client))
        .with_history_window(config.history.max_turns)
        .with_fallback_text(config.chat.fallback_text.clone());
    tracing::info!(model = %config.model.model, "Chatting with model directly");
    Ok(Arc::new(DirectBackend::new(Arc::new(search))))
}

async fn chat(config: GeoguideConfig) -> Result<()> {
    let backend = build_backend(&config)?;
    let locator: Arc<dyn LocationProvider> = Arc::from(provider_from_config(&config.location));
    let session = Arc::new(ChatSession::from_config(backend, locator, &config));

    let probe = session.start_location_probe();

    let mut stdout = tokio::io::stdout();
    for view in session.render()? {
        print_view(&mut stdout, &view).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let state = session.connection_state()?;
        stdout
            .write_all(format!("\n({}) > ", state.label()).as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if QUIT_COMMANDS.contains(&line.trim()) {
            break;
        }

        match session.submit(&line).await {
            Ok(SubmitOutcome::Answered(message)) | Ok(SubmitOutcome::Failed(message)) => {
                print_view(&mut stdout, &MessageView::from_message(&message)).await?;
            }
            Ok(SubmitOutcome::Busy) => {
                tracing::debug!("Still waiting for the previous answer");
            }
            Err(ChatError::EmptyMessage) => {}
            Err(e) => return Err(e.into()),
        }
    }

    probe.abort();
    tracing::info!(messages = session.len()?, "Chat session ended");
    Ok(())
}

async fn print_view(stdout: &mut tokio::io::Stdout, view: &MessageView) -> Result<()> {
    let text = format!("{}\n", render_text(view));
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
