use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tidyfold::cli::{OrganizeCommand, run_cli_with_config};
use tidyfold::history::ActionId;
use tidyfold::output::OutputFormatter;

/// Sort a directory's files into category folders, with undo.
#[derive(Parser, Debug)]
#[command(name = "tidyfold", version, about)]
struct Cli {
    /// Configuration file (defaults to ./.tidyfoldrc.toml, then ~/.config/tidyfold/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move the directory's files into category folders
    Organize {
        dir: PathBuf,

        /// Show what would move without touching anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Put files from an organize run back where they were
    Undo {
        dir: PathBuf,

        /// Action to undo (defaults to the latest one not yet undone)
        #[arg(long)]
        action_id: Option<ActionId>,
    },
    /// List recorded organize runs, newest first
    History { dir: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (command, dir) = match cli.command {
        Commands::Organize { dir, dry_run } => (OrganizeCommand::Organize { dry_run }, dir),
        Commands::Undo { dir, action_id } => (
            OrganizeCommand::Undo {
                action: action_id.into(),
            },
            dir,
        ),
        Commands::History { dir } => (OrganizeCommand::History, dir),
    };

    match run_cli_with_config(command, &dir, cli.config.as_deref()) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::from(2)
        }
    }
}
