//! TecnoBot CLI — chat with the Instituto 13 de Julio knowledge base.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tecnobot_agent::Agent;
use tecnobot_core::TecnobotConfig;
use tecnobot_knowledge::KnowledgeEngine;

#[derive(Parser)]
#[command(name = "tecnobot", version, about = "Asistente virtual del Instituto 13 de Julio")]
struct Cli {
    /// Path to an alternative config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session (default).
    Chat {
        /// Wait for complete answers instead of streaming tokens.
        #[arg(long)]
        no_stream: bool,
    },
    /// Ask a single question and exit.
    Ask { question: String },
    /// Run a retrieval query and print the selected context, without calling the model.
    Search { query: String },
    /// List models available from the configured provider.
    Models,
    /// Write the default configuration to ~/.tecnobot/config.toml.
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tecnobot=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => TecnobotConfig::load_from(path)?,
        None => TecnobotConfig::load()?,
    };

    match cli.command.unwrap_or(Command::Chat { no_stream: false }) {
        Command::Chat { no_stream } => run_chat(config, !no_stream).await,
        Command::Ask { question } => run_ask(config, &question).await,
        Command::Search { query } => run_search(config, &query).await,
        Command::Models => run_models(config).await,
        Command::Init => {
            let config = TecnobotConfig::default();
            config.save()?;
            println!(
                "Configuración escrita en {}",
                TecnobotConfig::default_path().display()
            );
            Ok(())
        }
    }
}

async fn run_chat(config: TecnobotConfig, stream: bool) -> Result<()> {
    let mut agent = Agent::new(config).await?;
    println!("TecnoBot> {}", tecnobot_agent::GREETING);
    println!("(escribe 'salir' para terminar)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all("tú> ".as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("salir") || question.eq_ignore_ascii_case("exit") {
            break;
        }

        if stream {
            stdout.write_all(b"TecnoBot> ").await?;
            stdout.flush().await?;
            agent
                .process_stream(question, |fragment| {
                    print!("{fragment}");
                    use std::io::Write;
                    let _ = std::io::stdout().flush();
                })
                .await?;
            println!("\n");
        } else {
            let answer = agent.process(question).await?;
            println!("TecnoBot> {answer}\n");
        }
    }

    println!("¡Hasta luego!");
    Ok(())
}

async fn run_ask(config: TecnobotConfig, question: &str) -> Result<()> {
    let mut agent = Agent::new(config).await?;
    let answer = agent.process(question).await?;
    println!("{answer}");
    Ok(())
}

async fn run_search(config: TecnobotConfig, query: &str) -> Result<()> {
    let engine = Arc::new(KnowledgeEngine::load(&config.knowledge.path)?);
    let retriever = tecnobot_agent::build_retriever(&config, &engine).await?;
    let result = retriever.search(query).await?;

    println!(
        "[{}] matched={}\n{}",
        retriever.name(),
        result.matched,
        result.context
    );
    Ok(())
}

async fn run_models(config: TecnobotConfig) -> Result<()> {
    let provider = tecnobot_providers::create_provider(&config)?;
    let models = provider.list_models().await?;

    println!("Modelos disponibles ({}):", provider.name());
    for model in models {
        println!("  {} — {} (ctx {})", model.id, model.name, model.context_length);
    }
    Ok(())
}
