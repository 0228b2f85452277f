use flexi_logger::Logger;
use gridquery::cli::Cli;
use gridquery::config::Config;
use gridquery::error::GridError;
use log::{debug, error};

fn run() -> Result<(), GridError> {
    let project_dirs = Config::project_dirs()?;
    let config = Config::load_config(&project_dirs)?;

    // RUST_LOG, when set, takes precedence over the configured levels
    let _logger = Logger::try_with_env_or_str(config.logging.log_spec())
        .and_then(|logger| logger.start())
        .map_err(|e| GridError::Error(format!("Failed to start logger: {}", e)))?;

    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());
    debug!("Loaded config: {:?}", config);

    Cli::handle_command_line(&config)
}

fn main() {
    if let Err(err) = run() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
