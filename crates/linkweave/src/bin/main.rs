//! Linkweave CLI

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use linkweave::LinkTools;
use linkweave_core::{ConfigProfile, EngineConfig, VaultConfig, to_json_string};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Linkweave - link graph and integrity engine for Markdown vaults
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the vault directory (`~` is expanded)
    #[arg(short, long, env = "LINKWEAVE_VAULT_PATH")]
    vault: Option<String>,

    /// Configuration profile to use (development, production, large-vault)
    #[arg(short, long, default_value = "production")]
    profile: String,

    /// YAML engine configuration; overrides the profile
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Graph statistics and ambiguous references
    Stats,
    /// Notes without links in or out
    Orphans,
    /// Most connected notes
    Hubs {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Notes grouped by shared tag
    Clusters,
    /// References pointing at a note
    Backlinks {
        note: String,
        /// List the note's outgoing references instead
        #[arg(long)]
        forward: bool,
    },
    /// Broken references with repair candidates
    Broken,
    /// Repair broken references (all auto-fixable ones, or a single one)
    Fix {
        /// Note containing the reference
        #[arg(long, requires_all = ["line", "target"])]
        source: Option<String>,
        #[arg(long)]
        line: Option<usize>,
        /// Target as written in the reference
        #[arg(long)]
        target: Option<String>,
        /// Replacement note; defaults to the best-ranked candidate
        #[arg(long, requires = "source")]
        candidate: Option<String>,
    },
    /// References whose #fragment names a missing heading
    Fragments,
    /// Move notes and rewrite references: FROM TO [FROM TO ...]
    Move {
        #[arg(required = true, num_args = 2..)]
        notes: Vec<String>,
    },
    /// Rewrite references after a note was moved by other means
    Propagate { old: String, new: String },
    /// Write the active engine configuration as YAML
    InitConfig {
        /// Destination file
        #[arg(default_value = "linkweave.yaml")]
        path: PathBuf,
    },
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", to_json_string(value, "command output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let profile: ConfigProfile = args.profile.parse()?;
    let engine = match &args.config {
        Some(path) => EngineConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => profile.create_config(),
    };
    init_logging(&engine.log_level, args.log_format);

    if let Command::InitConfig { path } = &args.command {
        engine.validate()?;
        engine.save(path).await?;
        log::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let Some(vault) = args.vault else {
        bail!("No vault path provided. Pass --vault or set LINKWEAVE_VAULT_PATH");
    };
    let vault_path = PathBuf::from(shellexpand::tilde(&vault).into_owned());

    let vault_config = VaultConfig::builder("default", &vault_path)
        .engine(engine)
        .build()
        .context("Invalid vault")?;
    log::info!(
        "Linkweave v{} | vault {}",
        env!("CARGO_PKG_VERSION"),
        vault_config.path.display()
    );

    let tools = LinkTools::open(&vault_config)?;

    match args.command {
        Command::Stats => print(&tools.graph_summary().await?),
        Command::Orphans => print(&tools.orphans().await?),
        Command::Hubs { limit } => print(&tools.most_connected(limit).await?),
        Command::Clusters => print(&tools.clusters().await?),
        Command::Backlinks { note, forward } => {
            if forward {
                print(&tools.forward_links(&note).await?)
            } else {
                print(&tools.backlinks(&note).await?)
            }
        }
        Command::Broken => print(&tools.broken_links().await?),
        Command::Fix {
            source: Some(source),
            line: Some(line),
            target: Some(target),
            candidate,
        } => print(
            &tools
                .fix_link(&source, line, &target, candidate.as_deref())
                .await?,
        ),
        Command::Fix { .. } => print(&tools.fix_broken_links().await?),
        Command::Fragments => print(&tools.missing_fragments().await?),
        Command::Move { notes } => {
            if notes.len() % 2 != 0 {
                bail!("move expects FROM TO pairs, got {} paths", notes.len());
            }
            if let [from, to] = notes.as_slice() {
                print(&tools.move_note(from, to).await?)
            } else {
                let pairs: Vec<(String, String)> = notes
                    .chunks_exact(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
                    .collect();
                print(&tools.move_notes(&pairs).await?)
            }
        }
        Command::Propagate { old, new } => print(&tools.propagate_rename(&old, &new).await?),
        Command::InitConfig { .. } => Ok(()),
    }
}
