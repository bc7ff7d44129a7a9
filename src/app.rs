//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Default number of levels a WAV file is reduced to for playback.
const DEFAULT_PLAY_BUCKETS: usize = 100;

/// A terminal waveform bar-chart visualizer for live and prerecorded audio
#[derive(Parser)]
#[command(name = "wavebar")]
#[command(version)]
#[command(about = "\n\n ▁▂▄▆█▆▄▂▁  wavebar")]
#[command(
    long_about = "\n\n ▁▂▄▆█▆▄▂▁  wavebar\n\nA terminal waveform bar-chart visualizer. Records from the microphone with\nlive accumulating bars, or sweeps a progress highlight across the waveform\nof a prerecorded WAV file.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    The record option (-o) can be used without explicitly saying 'record'.\n\nEXAMPLES:\n    # Record with live visualization\n    $ wavebar\n    $ wavebar record\n\n    # Record and save the take as WAV\n    $ wavebar -o take.wav\n    $ wavebar record -o take.wav\n\n    # Visualize a prerecorded file\n    $ wavebar play take.wav\n    $ wavebar play take.wav --buckets 200\n\n    # Edit configuration file\n    $ wavebar config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavebar/wavebar.toml\n    Logs:               ~/.local/state/wavebar/wavebar.log.*"
)]
struct Cli {
    /// Save the recording to a WAV file (record default command)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record audio with real-time bar visualization (default)
    ///
    /// Bars accumulate left to right and scroll once the screen fills.
    /// Press Space to pause/resume, 'r' to clear, Escape/q to stop.
    #[command(visible_alias = "r")]
    Record {
        /// Save the recording to a WAV file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Sweep a progress highlight across a prerecorded WAV file
    ///
    /// Decodes the file into a fixed set of bars and moves the playback
    /// highlight across them over the take's duration.
    /// Press Space to pause/resume, 'r' to restart, Escape/q to stop.
    #[command(visible_alias = "p")]
    Play {
        /// Path to the WAV file to visualize
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of levels the file is reduced to before display
        #[arg(long, value_name = "N", default_value_t = DEFAULT_PLAY_BUCKETS)]
        buckets: usize,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio and visualization settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in wavebar.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   wavebar completions bash > wavebar.bash
    ///   wavebar completions zsh > _wavebar
    ///   wavebar completions fish > wavebar.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wavebar", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Record { .. }) => {
            // Default command is record
            // An explicit record option takes precedence over the top-level one
            let output = match cli.command {
                Some(Commands::Record { output }) => output,
                None => cli.output,
                _ => unreachable!(),
            };
            commands::handle_record(output).await?;
        }
        Some(Commands::Play { file, buckets }) => {
            commands::handle_play(file, buckets).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
