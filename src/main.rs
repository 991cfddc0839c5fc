//! # docs-qa CLI Application
//!
//! This module implements the command-line interface for docs-qa, giving
//! access to the question-answering pipeline and its content cache through a
//! set of subcommands.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `ask`: Answer a single question
//!   - `chat`: Line-based conversation that keeps prior turns
//!   - `crawl`: Discard the cache and crawl the site again
//!   - `search`: Show how pages rank for a query, without the answering service
//!   - `cache`: Inspect or clear the content cache
//!
//! Only `ask` and `chat` need an API key; the other commands work offline from
//! the answering service.

mod telemetry;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use docs_qa::config::{Config, Provider};
use docs_qa::crawler::ContentSource;
use docs_qa::model::{Client, RateLimitedCompletionModel};
use docs_qa::search::{ContextAssembler, RelevanceScorer};
use docs_qa::{Conversation, DocsAssistant};
use indicatif::{ProgressBar, ProgressStyle};
use rig::providers::{anthropic, gemini};
use telemetry::OtelGuard;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::instrument;

/// Config file picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "docs-qa.toml";

/// Directory chat sessions log into
const CHAT_LOG_DIR: &str = ".docs-qa";

#[derive(Parser)]
#[command(author, version, about = "Answer questions about a documentation website", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Answering service provider, overriding the config file
    #[arg(short, long, global = true, value_enum)]
    provider: Option<Provider>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer one question
    Ask(AskArgs),

    /// Start an interactive conversation
    Chat,

    /// Crawl the site again and refresh the cache
    Crawl,

    /// Rank cached pages against a query
    Search(SearchArgs),

    /// Inspect or clear the content cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Args, Debug)]
struct AskArgs {
    /// The question to answer
    #[arg(required = true)]
    question: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    query: String,

    /// Limit results
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show the age and size of the cached content
    Status,

    /// Delete the cached content
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Chat logs to a file so log lines don't interleave with the conversation
    let _otel: Option<OtelGuard> = if matches!(cli.command, Some(Commands::Chat)) {
        telemetry::init_file_logging(Path::new(CHAT_LOG_DIR))?;
        None
    } else {
        telemetry::init_tracing_subscriber()
    };

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }

    match cli.command {
        Some(Commands::Ask(args)) => {
            let assistant = build_assistant(&config)?;
            println!("{}", assistant.answer(&args.question).await);
        }
        Some(Commands::Chat) => {
            let assistant = build_assistant(&config)?;
            chat_command(&assistant).await?;
        }
        Some(Commands::Crawl) => {
            crawl_command(&config).await?;
        }
        Some(Commands::Search(args)) => {
            search_command(&config, args).await?;
        }
        Some(Commands::Cache(command)) => {
            cache_command(&config, command).await?;
        }
        None => {
            let _ = Cli::parse_from(["docs-qa", "--help"]);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Ok(Config::load(default_path)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Build the assistant for the configured provider
fn build_assistant(config: &Config) -> anyhow::Result<AnyAssistant> {
    let assistant = match config.provider {
        Provider::Anthropic => AnyAssistant::Anthropic(DocsAssistant::new(
            config,
            Client::new_anthropic_from_env(&config.answer.model)?,
        )?),
        Provider::Gemini => AnyAssistant::Gemini(DocsAssistant::new(
            config,
            Client::new_gemini_from_env(&config.answer.model)?,
        )?),
    };
    Ok(assistant)
}

type AnthropicModel = RateLimitedCompletionModel<anthropic::completion::CompletionModel>;
type GeminiModel = RateLimitedCompletionModel<gemini::completion::CompletionModel>;

/// An assistant bound to whichever provider the config names
enum AnyAssistant {
    Anthropic(DocsAssistant<AnthropicModel>),
    Gemini(DocsAssistant<GeminiModel>),
}

impl AnyAssistant {
    async fn answer(&self, question: &str) -> String {
        match self {
            AnyAssistant::Anthropic(assistant) => assistant.answer(question).await,
            AnyAssistant::Gemini(assistant) => assistant.answer(question).await,
        }
    }

    async fn answer_turn(&self, conversation: Conversation, question: &str) -> (Conversation, String) {
        match self {
            AnyAssistant::Anthropic(assistant) => assistant.answer_turn(conversation, question).await,
            AnyAssistant::Gemini(assistant) => assistant.answer_turn(conversation, question).await,
        }
    }
}

async fn chat_command(assistant: &AnyAssistant) -> anyhow::Result<()> {
    println!("Ask a question about the documentation. Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = Conversation::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let (next, reply) = assistant.answer_turn(conversation, question).await;
        conversation = next;
        println!("\n{}\n", reply);
    }

    Ok(())
}

#[instrument(skip(config))]
async fn crawl_command(config: &Config) -> anyhow::Result<()> {
    let source = ContentSource::new(config.crawler.clone(), config.cache.clone())?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Crawling {}...", config.crawler.base_url));

    let report = source.refresh().await;
    spinner.finish_and_clear();

    let failed = report.failed_urls().len();
    let too_short = report.too_short_urls().len();
    let content = report.into_content_set();
    println!(
        "Crawled {} pages with {} characters",
        content.len(),
        content.total_chars()
    );
    if failed > 0 || too_short > 0 {
        println!(
            "Skipped {} pages that failed to fetch and {} below the minimum length",
            failed, too_short
        );
    }

    Ok(())
}

#[instrument(skip(config))]
async fn search_command(config: &Config, args: SearchArgs) -> anyhow::Result<()> {
    let source = ContentSource::new(config.crawler.clone(), config.cache.clone())?;
    let assembler = ContextAssembler::new(
        RelevanceScorer::new(config.scoring.clone()),
        config.context.clone(),
    );

    let content = source.load().await;
    let results: Vec<_> = assembler
        .rank(&args.query, &content)
        .into_iter()
        .filter(|candidate| candidate.score > 0.0)
        .take(args.limit)
        .collect();

    match args.format.as_str() {
        "json" => {
            let json_response = serde_json::json!({
                "query": args.query,
                "pages": content.len(),
                "results": results.iter().map(|r| {
                    serde_json::json!({
                        "title": r.record.title,
                        "url": r.url,
                        "score": r.score,
                    })
                }).collect::<Vec<_>>()
            });
            println!("{}", serde_json::to_string_pretty(&json_response)?);
        }
        _ => {
            println!("Found {} matching pages out of {}", results.len(), content.len());
            for (i, result) in results.iter().enumerate() {
                println!("{}. {} ({:.2})", i + 1, result.record.title, result.score);
                println!("   URL: {}", result.url);
            }
        }
    }

    Ok(())
}

#[instrument(skip(config))]
async fn cache_command(config: &Config, command: CacheCommands) -> anyhow::Result<()> {
    let source = ContentSource::new(config.crawler.clone(), config.cache.clone())?;
    let cache = source.cache();

    match command {
        CacheCommands::Status => match cache.read_entry().await? {
            Some(entry) => {
                let age = entry.age_at(Utc::now());
                let fresh = age
                    .to_std()
                    .map(|age| age < config.cache.ttl())
                    .unwrap_or(true);
                println!("Cache: {}", cache.path().display());
                println!("Site: {}", entry.base_url);
                println!(
                    "Pages: {} ({} characters)",
                    entry.pages.len(),
                    entry.pages.total_chars()
                );
                println!(
                    "Written: {} ({} minutes ago, {})",
                    entry.written_at.to_rfc3339(),
                    age.num_minutes(),
                    if fresh { "fresh" } else { "stale" }
                );
            }
            None => println!("No cache at {}", cache.path().display()),
        },
        CacheCommands::Clear => {
            cache.invalidate().await?;
            println!("Cleared cache at {}", cache.path().display());
        }
    }

    Ok(())
}
