mod cli;
mod error;
mod openai_client;
mod parameters;
mod prompt_template;
mod speech;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::cli::{ChatArgs, build_session};
use crate::parameters::ModelId;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
    /// List the supported models
    Models,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let args = match cli.command {
        Some(Commands::Models) => {
            for model in ModelId::ALL {
                println!("{}", model);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Chat(args)) => args,
        // Default to chat if no subcommand is provided
        None => cli.chat,
    };

    init_tracing(args.verbose)?;
    info!("Starting OpenAI Chat CLI");

    let session = build_session(&args)?;
    let mut chat_context =
        ChatContext::new(Box::new(io::stdout()), args.input, session, args.export_dir);
    chat_context.run().await
}
