use crate::core::allocator::AllocatorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgalloc")]
#[command(about = "Create disk images and add them as drives", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command and its arguments, e.g. `alloc disk.img 10G`.
    /// Separate several commands with ':'
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// Read commands from a script, one per line ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "SCRIPT", conflicts_with = "command")]
    pub script: Option<PathBuf>,

    /// Strategy for fully allocated images
    #[arg(short = 'a', long, value_enum, default_value = "auto")]
    pub allocator: AllocatorKind,

    /// Reject sizes that overflow 64 bits instead of wrapping
    #[arg(long = "strict-sizes")]
    pub strict_sizes: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
