use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use corso_capabilities::CapabilityRegistry;
use corso_core::config::AppConfig;
use corso_core::types::{CallerId, ConversationId};
use corso_flows::{load_dir, FlowEngine, FlowRegistry, InvocationRequest};

#[derive(Parser)]
#[command(name = "corso", version, about = "Flow-driven step interpreter for assistant decision logic")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "corso.toml")]
    config: PathBuf,

    /// Directory of flow definitions (overrides config)
    #[arg(long)]
    flows: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a message through the matching flow and print the response
    Run {
        /// The triggering message
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
        /// Explicit flow id (skips keyword matching)
        #[arg(long)]
        flow: Option<String>,
        /// Caller identity
        #[arg(long)]
        caller: Option<String>,
        /// Conversation id (generated if not provided)
        #[arg(long)]
        conversation: Option<String>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List loaded flows with validation warnings
    Flows,
    /// Show effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("corso=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        info!(path = %cli.config.display(), "No config file, using defaults");
        AppConfig::default()
    };

    let flows_dir = cli
        .flows
        .clone()
        .or_else(|| config.flows.dir.clone())
        .unwrap_or_else(|| PathBuf::from("flows"));

    match cli.command {
        Commands::Run {
            message,
            flow,
            caller,
            conversation,
            json,
        } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                anyhow::bail!("empty message; pass the text to run after the subcommand");
            }

            let flows = load_flows(&flows_dir)?;
            let capabilities = Arc::new(CapabilityRegistry::with_builtins());
            let engine =
                FlowEngine::new(flows, capabilities).with_max_steps(config.engine.max_steps);

            let caller = caller
                .or_else(|| config.engine.default_caller.clone())
                .unwrap_or_else(|| "cli".to_string());
            let mut request = InvocationRequest::new(message, CallerId::from_str(&caller));
            if let Some(flow_id) = flow {
                request = request.with_flow(flow_id);
            }
            if let Some(id) = conversation {
                request = request.with_conversation(ConversationId::from_str(&id));
            }

            let reply = engine.handle(request).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else if reply.success {
                match reply.response {
                    Some(response) => println!("{}", response),
                    None => println!("(flow completed with no response step)"),
                }
            } else {
                anyhow::bail!(reply.error.unwrap_or_else(|| "run failed".to_string()));
            }
        }

        Commands::Flows => {
            let flows = load_flows(&flows_dir)?;
            if flows.is_empty() {
                println!("No flows loaded from {}", flows_dir.display());
                return Ok(());
            }
            for flow in flows.iter() {
                println!("{:<24} {} — {}", flow.id, flow.name, flow.description);
                let dangling = flow.validate();
                if !dangling.is_empty() {
                    warn!(flow_id = %flow.id, ?dangling, "Flow references missing steps");
                    println!("  ! dangling step references: {}", dangling.join(", "));
                }
            }
        }

        Commands::Config => {
            println!("flows dir: {}", flows_dir.display());
            println!("max steps: {}", config.engine.max_steps);
            println!(
                "default caller: {}",
                config.engine.default_caller.as_deref().unwrap_or("cli")
            );
            let capabilities = CapabilityRegistry::with_builtins();
            let mut names = capabilities.list();
            names.sort();
            println!("capabilities: {}", names.join(", "));
        }
    }

    Ok(())
}

fn load_flows(dir: &Path) -> anyhow::Result<FlowRegistry> {
    load_dir(dir).with_context(|| format!("loading flows from {}", dir.display()))
}
