use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cresta_agents::ChatAgent;
use cresta_core::{resolve, ChatInput, ChatReply};
use cresta_narrator::Narrator;
use cresta_observability::{init_tracing, AppMetrics};
use cresta_storage::{PortfolioImport, SqliteWarehouse};

type Agent = ChatAgent<SqliteWarehouse, Narrator>;

#[derive(Debug, Parser)]
#[command(name = "cresta")]
#[command(about = "Cresta commercial real estate assistant CLI")]
struct Cli {
    #[arg(long, env = "CRESTA_DATABASE_URL", default_value = "sqlite://cresta.db")]
    database_url: String,

    #[arg(long, env = "CRESTA_NARRATIVE_TIMEOUT_MS", default_value_t = 8_000)]
    narrative_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat,
    Ask { message: String },
    Explain { message: String },
    Import { file: PathBuf },
    Cities,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("cresta_cli");
    let cli = Cli::parse();
    let narrative_timeout = Duration::from_millis(cli.narrative_timeout_ms);

    match cli.command {
        Command::Explain { message } => {
            println!("{}", serde_json::to_string_pretty(&resolve(&message))?);
        }
        Command::Import { file } => {
            let warehouse = connect(&cli.database_url).await?;
            let (properties, leases) = import_file(&warehouse, &file).await?;
            println!("imported {properties} properties and {leases} leases");
        }
        Command::Chat => {
            let agent = build_agent(&cli.database_url, narrative_timeout).await?;
            run_chat(agent).await?;
        }
        Command::Ask { message } => {
            let agent = build_agent(&cli.database_url, narrative_timeout).await?;
            let reply = agent.handle_chat(ChatInput { message }).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Cities => {
            let agent = build_agent(&cli.database_url, narrative_timeout).await?;
            let cities = agent.list_cities().await?;
            println!("{}", serde_json::to_string_pretty(&cities)?);
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<SqliteWarehouse> {
    SqliteWarehouse::connect(database_url, 1)
        .await
        .with_context(|| format!("failed opening warehouse {}", database_url))
}

async fn build_agent(database_url: &str, narrative_timeout: Duration) -> Result<Agent> {
    let warehouse = connect(database_url).await?;
    let narrator = Narrator::from_env().context("failed to build text generation client")?;
    Ok(
        ChatAgent::new(Arc::new(warehouse), Arc::new(narrator), AppMetrics::shared())
            .with_narrative_timeout(narrative_timeout),
    )
}

async fn import_file(warehouse: &SqliteWarehouse, file: &Path) -> Result<(u64, u64)> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed reading {}", file.display()))?;
    let bundle: PortfolioImport = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", file.display()))?;
    warehouse.import(&bundle).await
}

async fn run_chat(agent: Agent) -> Result<()> {
    println!("Cresta chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent
            .handle_chat(ChatInput {
                message: message.to_string(),
            })
            .await?;
        print_reply(&reply);
    }

    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!("\n{}\n", reply.text);

    if let Some(suggestions) = reply.suggestions.as_ref().filter(|values| !values.is_empty()) {
        println!("Suggestions:");
        for suggestion in suggestions {
            println!("- {suggestion}");
        }
        println!();
    }

    for row in &reply.rows {
        let fields = row
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{key}: {text}"),
                None => format!("{key}: {value}"),
            })
            .collect::<Vec<_>>();
        println!("  {}", fields.join(" | "));
    }
    if !reply.rows.is_empty() {
        println!();
    }
}
