use anyhow::Result;
use clap::Parser;
use imgalloc::{cli, config::Config, logging, session::Session};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    let config = Config::from_cli(&cli)?;
    logging::init(config.log_level);

    log::debug!(
        "Starting imgalloc v{}, allocator: {:?}, sizes: {:?}",
        env!("CARGO_PKG_VERSION"),
        config.session_config.allocator,
        config.session_config.size_mode
    );

    let commands = config.input_config.load()?;
    let mut session = Session::new(&config.session_config);
    let status = session.run_all(commands);
    fastrace::flush();

    Ok(if status == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
