use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pairing_mailer::app::{App, mailer_for};
use pairing_mailer::config::{RuntimeConfig, SettingsField};
use pairing_mailer::logging;
use pairing_mailer::store::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "pairing-mailer", version, about = "Email each debate round's pairing to both teams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open a CSV file, replacing the previously loaded one
    Load {
        #[command(subcommand)]
        kind: LoadKind,
    },
    /// Show or change the saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Compose every round without sending anything
    Preview,
    /// Send one email per round
    Send,
}

#[derive(Debug, Subcommand)]
enum LoadKind {
    /// Team file (must have a "Team" column)
    Teams { path: PathBuf },
    /// Round file (must have "AFF" and "NEG" columns)
    Rounds { path: PathBuf },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print the current settings (API key redacted)
    Show,
    /// Set one field: sendgridKey, from, replyTo, subject, body, roundNumber, templateId
    Set {
        field: SettingsField,
        /// New value
        #[arg(required_unless_present = "file")]
        value: Option<String>,
        /// Read the value from a file (handy for the markdown body)
        #[arg(long, conflicts_with = "value")]
        file: Option<PathBuf>,
    },
    /// Reset everything, including the API key and loaded files
    Reset {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let runtime = RuntimeConfig::from_env();
    let _log_guard = logging::init(&runtime.log_dir)
        .with_context(|| format!("Could not create log directory {}", runtime.log_dir.display()))?;

    let store = JsonFileStore::new(&runtime.settings_path);
    let mut app = App::open(store).await?;

    match cli.command {
        Command::Load { kind } => match kind {
            LoadKind::Teams { path } => {
                let count = app.open_team_file(&path).await?;
                println!("{}: {count} team(s)", path.display());
            }
            LoadKind::Rounds { path } => {
                let count = app.open_round_file(&path).await?;
                println!("{}: {count} room(s)", path.display());
            }
        },

        Command::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = app.settings();
                for field in SettingsField::ALL {
                    println!("{field:>12}: {}", settings.get(field).replace('\n', "\n              "));
                }
                let file = |p: &Option<PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(none)".to_string())
                };
                println!(
                    "{:>12}: {} ({} team(s))",
                    "teamFile",
                    file(&settings.team_file),
                    settings.team_data.len()
                );
                println!(
                    "{:>12}: {} ({} room(s))",
                    "roundFile",
                    file(&settings.round_file),
                    settings.round_data.len()
                );
                if !settings.can_submit() {
                    println!("\nNot ready to send: an API key and both files are required.");
                }
            }
            SettingsAction::Set { field, value, file } => {
                let value = match (value, file) {
                    (_, Some(path)) => tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Could not read {}", path.display()))?,
                    (Some(value), None) => value,
                    (None, None) => anyhow::bail!("A value or --file is required"),
                };
                app.update(field, value).await?;
                println!("Saved {field}.");
            }
            SettingsAction::Reset { yes } => {
                if !yes {
                    println!(
                        "Should I reset everything? This includes all settings, the subject line, and your message body."
                    );
                    println!("Run again with --yes to confirm.");
                    return Ok(ExitCode::FAILURE);
                }
                app.reset().await?;
                println!("Settings reset.");
            }
        },

        Command::Preview => {
            let previews = app.preview();
            let mut failed = 0;
            for (index, preview) in previews.iter().enumerate() {
                match preview {
                    Ok(message) => {
                        let to: Vec<&str> = message.to.iter().map(String::as_str).collect();
                        println!("[{index}] {} → {}", message.subject, to.join(", "));
                    }
                    Err(e) => {
                        failed += 1;
                        println!("[{index}] ✗ {e}");
                    }
                }
            }
            println!("\n{} room(s), {failed} problem(s)", previews.len());
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Send => {
            let mailer = mailer_for(&runtime, app.settings())?;
            eprintln!(
                "Sending {} room(s) via {}...",
                app.settings().round_data.len(),
                mailer.name()
            );
            let summary = app.submit(mailer.as_ref()).await?;

            for outcome in summary.report.outcomes() {
                match &outcome.result {
                    Ok(receipt) => println!(
                        "[{}] {} vs {}: sent to {} at {} ({})",
                        outcome.index,
                        outcome.aff,
                        outcome.neg,
                        outcome.recipients,
                        receipt.accepted_at.format("%H:%M:%S"),
                        receipt.message_id.as_deref().unwrap_or("accepted")
                    ),
                    Err(e) => println!("[{}] {} vs {}: {e}", outcome.index, outcome.aff, outcome.neg),
                }
            }
            println!("\n{}", summary.banner());

            if !summary.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
