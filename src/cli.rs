use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stickerforge_common::{OutputFormat, StickerType};

#[derive(Parser)]
#[command(name = "stickerforge")]
#[command(author, version, about = "Sticker pack downloader and transcoder")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that required external tools are available
    CheckTools,

    /// Download sticker images (and sounds) into a raw pack directory
    Fetch {
        /// Pack identifier
        #[arg(required = true)]
        pack_id: String,

        /// Sticker type of the pack (static, animated, popup&sound, emoji, ...)
        #[arg(long = "type")]
        sticker_type: StickerType,

        /// Sticker ids to download, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Raw pack directory
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Transcode a raw pack directory into a delivery format
    Convert {
        /// Raw pack directory (static/, animation/, popup/, emoji/, sound/, overlay/, icon.png)
        #[arg(required = true)]
        raw_dir: PathBuf,

        /// Sticker type of the pack
        #[arg(long = "type")]
        sticker_type: StickerType,

        /// Output format: png, gif, webm or mp4
        #[arg(short, long, default_value = "png")]
        format: OutputFormat,

        /// Scale still stickers to 512px on the longer side
        #[arg(long)]
        scale: bool,

        /// Do not apply the default text overlay to message stickers
        #[arg(long)]
        no_overlay: bool,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Show the planned operations without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Decode obfuscated KakaoTalk animated assets
    Decrypt {
        /// Files to decode
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
