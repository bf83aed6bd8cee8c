use crate::{
    config::SessionConfig,
    core::{
        allocator::Allocator,
        drive::{DriveManager, DriveRegistry},
        image,
    },
    error::{CommandError, CommandResult},
    utils::{self, SizeMode},
};
use fastrace::prelude::*;
use std::{
    io::{self, BufRead},
    path::Path,
};

const ADD_USAGE: &str = "use 'add file' to add a drive";
const LAUNCH_USAGE: &str = "'launch' takes no arguments";

/// Separates commands given on one command line.
pub const COMMAND_SEPARATOR: &str = ":";

/// Sequence of commands sharing one drive registry.
pub struct Session {
    drives: DriveRegistry,
    allocator: Box<dyn Allocator>,
    sizes: SizeMode,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            drives: DriveRegistry::new(),
            allocator: config.allocator.build(),
            sizes: config.size_mode,
        }
    }

    pub fn drives(&self) -> &DriveRegistry {
        &self.drives
    }

    pub fn execute(&mut self, cmd: &str, args: &[&str]) -> CommandResult<()> {
        match cmd {
            "alloc" | "allocate" => {
                image::alloc(&mut self.drives, self.allocator.as_ref(), self.sizes, args)
            }
            "sparse" => image::sparse(&mut self.drives, self.sizes, args),
            "add" | "add-drive" => self.add(args),
            "launch" | "run" => {
                if !args.is_empty() {
                    return Err(CommandError::ArgumentCount(LAUNCH_USAGE));
                }
                Ok(self.drives.launch()?)
            }
            "list-drives" => {
                self.list_drives();
                Ok(())
            }
            "help" => {
                print_help();
                Ok(())
            }
            _ => Err(CommandError::UnknownCommand(cmd.to_string())),
        }
    }

    /// Execute one command and report failures on stderr.
    ///
    /// Returns 0 on success and -1 on failure.
    pub fn run(&mut self, cmd: &str, args: &[&str]) -> i32 {
        let span = Span::root("command", SpanContext::random());
        let _guard = span.set_local_parent();
        span.add_property(|| ("command", cmd.to_string()));

        match self.execute(cmd, args) {
            Ok(()) => 0,
            Err(err) => {
                log::debug!("{} failed ({:?})", cmd, err.kind());
                eprintln!("{err}");
                -1
            }
        }
    }

    /// Run commands in order, stopping at the first failure.
    pub fn run_all<I>(&mut self, commands: I) -> i32
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        for words in commands {
            let Some((cmd, args)) = words.split_first() else {
                continue;
            };
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            if self.run(cmd, &args) != 0 {
                return -1;
            }
        }
        0
    }

    fn add(&mut self, args: &[&str]) -> CommandResult<()> {
        let [path] = args else {
            return Err(CommandError::ArgumentCount(ADD_USAGE));
        };
        if !self.drives.is_configurable() {
            return Err(CommandError::PreconditionFailed);
        }
        Ok(self.drives.add_drive(Path::new(*path))?)
    }

    fn list_drives(&self) {
        for drive in self.drives.drives() {
            println!(
                "/dev/sd{} {} ({})",
                drive_letter(drive.index),
                drive.path.display(),
                utils::format_size(drive.size)
            );
        }
    }
}

/// Split command line words into commands at [`COMMAND_SEPARATOR`].
pub fn split_commands(words: &[String]) -> Vec<Vec<String>> {
    words
        .split(|w| w.as_str() == COMMAND_SEPARATOR)
        .filter(|cmd| !cmd.is_empty())
        .map(<[String]>::to_vec)
        .collect()
}

/// Read one command per line, skipping blank lines and `#` comments.
pub fn parse_script<R: BufRead>(reader: R) -> io::Result<Vec<Vec<String>>> {
    let mut commands = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        commands.push(trimmed.split_ascii_whitespace().map(str::to_string).collect());
    }
    Ok(commands)
}

// a, b, ..., z, aa, ab, ...
fn drive_letter(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn print_help() {
    println!(
        "
  alloc <file> <size>    Create a fully allocated image and add it as a drive
  sparse <file> <size>   Create a sparse image and add it as a drive
  add <file>             Add an existing image as a drive
  launch                 Finish drive configuration
  list-drives            Show the drives added so far
  help                   Show this help message

  <size> is <number>[k|m|g|t|p|e|s]: powers of 1024 (either case) or 512-byte
  sectors (lowercase s). A bare number counts kibibytes.
"
    );
}
