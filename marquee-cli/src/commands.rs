//! CLI command implementations

use std::path::{Path, PathBuf};

use clap::Subcommand;
use marquee_core::engine::CompiledPlaylist;
use marquee_core::{ConfigError, MarqueeConfig, MarqueeError, PlaylistEngine, Result, ServerConfig};
use marquee_jellyfin::JellyfinClient;
use tokio::fs;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate the rule set and write the playlist artifact
    Generate {
        /// Path to the YAML rule set
        #[arg(short, long)]
        config: PathBuf,
        /// Output file: first line the playlist name, then one item id
        /// per line
        #[arg(short, long, default_value = "list.txt")]
        output: PathBuf,
        /// Viewer user id for the viewer-age predicate
        #[arg(long)]
        user: Option<String>,
    },
    /// Parse and validate the rule set without contacting the server
    Validate {
        /// Path to the YAML rule set
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            config,
            output,
            user,
        } => generate(config, output, user).await,
        Commands::Validate { config } => validate(config).await,
    }
}

async fn load_config(path: &Path) -> Result<MarqueeConfig> {
    let text = fs::read_to_string(path).await?;
    Ok(MarqueeConfig::from_yaml(&text)?)
}

/// Evaluate the rule set and persist the compiled playlist
///
/// Nothing is written until evaluation has fully succeeded; a failure
/// anywhere leaves the output file untouched.
///
/// # Errors
/// - `MarqueeError::Config` - Invalid rule set or missing server section
/// - `MarqueeError::Library` - Authentication or query failure
/// - `MarqueeError::Io` - Config unreadable or output not writable
async fn generate(config: PathBuf, output: PathBuf, user: Option<String>) -> Result<()> {
    let config = load_config(&config).await?;
    let server = config.server.clone().ok_or(ConfigError::MissingServer)?;
    let engine = PlaylistEngine::from_config(config)?;

    let client = connect(&server).await?;
    let viewer = user.or(server.user_id);
    let compiled = engine.evaluate(&client, viewer.as_deref()).await?;

    write_artifact(&output, &compiled).await?;
    println!(
        "Wrote playlist '{}' with {} items to {}",
        compiled.name,
        compiled.item_ids.len(),
        output.display()
    );

    Ok(())
}

/// Parse and validate the rule set
///
/// # Errors
/// - `MarqueeError::Config` - Invalid rule set
/// - `MarqueeError::Io` - Config unreadable
async fn validate(config: PathBuf) -> Result<()> {
    let path = config.clone();
    let config = load_config(&config).await?;
    let _ = PlaylistEngine::from_config(config)?;
    println!("{} is valid", path.display());
    Ok(())
}

async fn connect(server: &ServerConfig) -> Result<JellyfinClient> {
    let client = JellyfinClient::connect(&server.url, &server.username, &server.password).await?;
    Ok(client)
}

/// Write the two-part text artifact: playlist name, then one id per line.
async fn write_artifact(path: &Path, compiled: &CompiledPlaylist) -> Result<()> {
    let mut contents = String::with_capacity(compiled.name.len() + compiled.item_ids.len() * 33);
    contents.push_str(&compiled.name);
    contents.push('\n');
    contents.push_str(&compiled.item_ids.join("\n"));
    fs::write(path, contents).await.map_err(MarqueeError::from)
}
