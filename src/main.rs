use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stepgraph_core::config::AppConfig;
use stepgraph_core::context::State;
use stepgraph_engine::GraphExecutor;
use stepgraph_workflows::{builtin_registry, code_review_graph};

#[derive(Parser)]
#[command(name = "stepgraph", version, about = "Graph step executor with an HTTP gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "stepgraph.toml", env = "STEPGRAPH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the code-review workflow locally and print the result
    Run {
        /// Source code to review
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,
        /// Read the source code from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Starting quality score
        #[arg(long)]
        quality: Option<i64>,
    },
    /// List registered steps and routers
    Nodes,
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "stepgraph", &mut std::io::stdout());
        return Ok(());
    }

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .init();

    let registry = Arc::new(builtin_registry(&config.workflows));

    match cli.command {
        Commands::Serve { bind } => {
            let mut gateway_config = config.gateway.clone();
            if let Some(bind) = bind {
                gateway_config.bind = bind;
            }
            info!(bind = %gateway_config.bind, "Starting gateway");
            let server = stepgraph_gateway::GatewayServer::new(gateway_config, registry);

            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_clone = cancel.clone();

            // Graceful shutdown on Ctrl-C
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            server.run(cancel).await?;
        }
        Commands::Run {
            code,
            file,
            quality,
        } => {
            let code = match (code, file) {
                (Some(code), _) => code,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("either --code or --file is required"),
            };

            let mut initial = State::new();
            initial.insert("code".to_string(), code.into());
            if let Some(q) = quality {
                initial.insert("quality_score".to_string(), q.into());
            }

            let executor = GraphExecutor::new(code_review_graph(&registry)?);
            let result = executor.run(initial).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Nodes => {
            println!("Steps:");
            for name in registry.step_names() {
                println!("  {name}");
            }
            println!("Routers:");
            for name in registry.router_names() {
                println!("  {name}");
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
