//! Command-line surface for the `yukki` binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tutoring chatbot with an animated avatar and spoken replies.
#[derive(Parser, Debug)]
#[command(name = "yukki", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the tutor window (default)
    Gui,

    /// Ask a single question and print the reply
    Ask {
        /// Question text
        text: String,

        /// Image to send along with the question
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Play the spoken reply
        #[arg(short, long)]
        speak: bool,

        /// Write the spoken reply to a WAV file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Wrap raw 16-bit mono PCM in a WAV container
    Wav {
        /// Raw little-endian PCM input
        input: PathBuf,

        /// Sample rate in Hz
        #[arg(short, long, default_value_t = 24_000)]
        rate: u32,

        /// Output WAV path
        #[arg(short, long)]
        out: PathBuf,
    },
}

impl Cli {
    /// Subcommand to run, falling back to the window
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Gui)
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "yukki=debug,info"
        } else {
            "yukki=info,warn"
        }
    }
}
