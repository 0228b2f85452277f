use clap::{Parser, Subcommand};
use log::info;

use crate::config::Config;
use crate::customers::Customer;
use crate::database::Database;
use crate::error::GridError;
use crate::server::WebServer;
use crate::source::SqliteSource;

#[derive(Parser)]
#[command(
    name = "gridquery",
    version,
    about = "GridQuery: server-side processing for DataTables grids"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve,

    /// Replace the customers table with generated demo rows
    Seed {
        /// Number of customers to generate
        #[arg(long, default_value_t = 100)]
        count: usize,
    },
}

impl Cli {
    pub fn handle_command_line(config: &Config) -> Result<(), GridError> {
        let args = Cli::parse();

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(config),
            Command::Seed { count } => Self::seed(config, count),
        }
    }

    fn start_server(config: &Config) -> Result<(), GridError> {
        let db = Database::open(&config.database.path)?;
        let customers = SqliteSource::<Customer>::new(db.pool());

        info!(
            "Starting server on {}:{} with database {}",
            config.server.host,
            config.server.port,
            config.database.path.display()
        );

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| GridError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = WebServer::new(config.server.host.clone(), config.server.port);
            web_server
                .start(customers, config.query.max_page_length)
                .await
        })
    }

    fn seed(config: &Config, count: usize) -> Result<(), GridError> {
        let db = Database::open(&config.database.path)?;
        db.seed_customers(count)?;
        println!(
            "Seeded {} customers into {}",
            count,
            config.database.path.display()
        );
        Ok(())
    }
}
