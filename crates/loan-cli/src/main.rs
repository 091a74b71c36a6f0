//! loan-assist - simulated loan sales conversations

mod config;
mod console;
mod utils;

use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast;

use loan_agent::config::DEFAULT_MAX_TURNS;
use loan_agent::nodes::SyntheticUserNode;
use loan_agent::persona::{DEFAULT_PERSONA_ID, PERSONAS, find_persona};
use loan_agent::{
    Collaborators, ConversationGraph, ConversationOutcome, ConversationState, GraphConfig,
    GraphEvent, Node, NodeId, Speaker, StaticCreditBureau,
};
use loan_ai::providers::LlmProvider;
use loan_ai::providers::openai::OpenAIProvider;
use loan_ai::search::TavilyClient;
use loan_ai::{ChatCompleter, Provider};

/// loan-assist - multi-agent loan sales assistant
#[derive(Parser, Debug)]
#[command(name = "loan-assist")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Synthetic customer persona id (see --list-personas)
    #[arg(short, long)]
    persona: Option<u64>,

    /// Model to use (default: llama-3.1-8b-instant)
    #[arg(short, long)]
    model: Option<String>,

    /// Provider (groq, openai, openrouter, ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Conversation turn budget
    #[arg(long)]
    max_turns: Option<u32>,

    /// Who writes search queries (router, search-node)
    #[arg(long)]
    query_source: Option<String>,

    /// Play the customer yourself instead of a persona
    #[arg(short, long)]
    interactive: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List built-in personas
    #[arg(long)]
    list_personas: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("loan_agent=debug,loan_ai=debug,loan_cli=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing(args.verbose);

    // Initialize config and exit
    if args.init_config {
        let path = config::Config::init().context("Error creating config")?;
        println!("Config file created at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    if args.list_personas {
        for persona in &PERSONAS {
            let summary = persona
                .profile
                .lines()
                .find(|l| l.starts_with("- Looking for:"))
                .unwrap_or_default()
                .trim_start_matches("- ");
            println!(
                "{}: {} ({})",
                persona.user_id,
                persona.name,
                utils::truncate_chars(summary, 70)
            );
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let provider = Provider::parse(
        &args
            .provider
            .or(cfg.provider.clone())
            .unwrap_or_else(|| "groq".to_string()),
    );
    let model_id = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| loan_ai::models::DEFAULT_MODEL_ID.to_string());
    let model = loan_ai::models::resolve(provider, &model_id);

    let llm_provider: Arc<dyn LlmProvider> = match cfg.get_api_key(provider) {
        Some(key) => Arc::new(OpenAIProvider::new(key)),
        None => match provider.api_key_env_var() {
            None => Arc::new(OpenAIProvider::without_auth()),
            Some(var) => anyhow::bail!(
                "No API key for {}. Set {}, or add it to {}",
                provider.name(),
                var,
                config::Config::config_path().display()
            ),
        },
    };
    let search_key = cfg.get_search_api_key().with_context(|| {
        format!(
            "No Tavily API key. Set TAVILY_API_KEY, or add it to {}",
            config::Config::config_path().display()
        )
    })?;

    let query_source = match args.query_source.as_deref() {
        Some(s) => utils::parse_query_source(s)
            .with_context(|| format!("Unknown query source '{}'", s))?,
        None => cfg.query_source.unwrap_or_default(),
    };
    let graph_config = GraphConfig {
        max_turns: args.max_turns.or(cfg.max_turns).unwrap_or(DEFAULT_MAX_TURNS),
        search: cfg.search.clone().unwrap_or_default(),
        query_source,
        ..GraphConfig::default()
    };

    let llm = Arc::new(ChatCompleter::new(llm_provider, model));
    let collaborators = Collaborators {
        llm: llm.clone(),
        search: Arc::new(TavilyClient::new(search_key)),
        credit: Arc::new(StaticCreditBureau::from_personas()),
    };

    let user: Arc<dyn Node> = if args.interactive {
        Arc::new(console::ConsoleUserNode::new())
    } else {
        let persona_id = args.persona.or(cfg.persona).unwrap_or(DEFAULT_PERSONA_ID);
        let persona = find_persona(persona_id)
            .with_context(|| format!("Unknown persona {}, see --list-personas", persona_id))?;
        eprintln!("Simulating {} (persona {})", persona.name, persona.user_id);
        Arc::new(SyntheticUserNode::new(llm.clone(), persona))
    };

    eprintln!(
        "loan-assist ({} via {}, {} turns)",
        llm.model().id,
        provider.name(),
        graph_config.max_turns
    );
    eprintln!();

    let graph = ConversationGraph::loan_sales(&collaborators, user, &graph_config)?;
    let printer = tokio::spawn(print_events(graph.subscribe(), args.interactive));

    let result = graph.run(ConversationState::new()).await;
    drop(graph);
    let _ = printer.await;

    let outcome = result?;
    print_summary(&outcome);
    Ok(())
}

/// Print utterances as the graph appends them
async fn print_events(mut receiver: broadcast::Receiver<GraphEvent>, interactive: bool) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match &event {
            GraphEvent::Utterance { speaker, text } => match speaker {
                // The person typing already sees their own line
                Speaker::User if interactive => {}
                Speaker::Assistant => println!("\nLoan Assistant: {}", text),
                Speaker::User => println!("\nCustomer: {}", text),
                Speaker::System => println!("\n[{}]", text),
            },
            GraphEvent::NodeEnd { node, next } if *node == NodeId::Router => {
                tracing::debug!(%next, "router decision");
            }
            GraphEvent::Error { node, message } => {
                eprintln!("\nError in {}: {}", node, message);
            }
            _ => {}
        }

        if event.is_terminal() {
            break;
        }
    }
}

fn print_summary(outcome: &ConversationOutcome) {
    let state = &outcome.state;
    println!();
    println!(
        "[Conversation ended after {} turns, {} steps | credit check: {}]",
        state.turn_count(),
        outcome.steps.len(),
        if state.credit_checked() { "done" } else { "not run" }
    );
    if !state.profile.is_empty() {
        println!("Profile:\n{}", state.profile.to_json_pretty());
    }
}
