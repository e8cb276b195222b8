use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "leadgate-core")]
#[command(about = "Leadgate Core - lead intake and payment declaration backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Validate configuration and exit
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}
