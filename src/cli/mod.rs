pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jwt-pizza-service")]
#[command(about = "JWT Pizza Service - pizza ordering API with bearer token sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PIZZA_API_PORT")]
        port: Option<u16>,

        #[arg(long, help = "Keep all data in process memory instead of Postgres")]
        in_memory: bool,
    },

    #[command(about = "Create a user holding the admin role")]
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None => commands::serve::handle(None, false).await,
        Some(Commands::Serve { port, in_memory }) => commands::serve::handle(port, in_memory).await,
        Some(Commands::CreateAdmin { name, email, password }) => {
            commands::admin::handle(name, email, password).await
        }
    }
}
