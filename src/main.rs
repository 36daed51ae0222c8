use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use planwell::chat;
use planwell::config::{PlannerConfig, Provider};
use planwell::constants;
use planwell::planner::SessionFactory;
use planwell::web_server::{self, AppState};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    planner: PlannerArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand.
#[derive(clap::Args, Debug)]
struct PlannerArgs {
    #[arg(long, global = true, env = "PLANWELL_PROVIDER", value_enum, default_value_t = Provider::Gemini)]
    provider: Provider,
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true, help = "Credential for the Gemini API.")]
    api_key: Option<String>,
    #[arg(long, global = true, env = "PLANWELL_MODEL", help = "Model name; defaults per provider.")]
    model: Option<String>,
    #[arg(long, global = true, env = "PLANWELL_COMPLETION_URL", help = "Base URL of the completion service.")]
    completion_url: Option<String>,
    #[arg(long, global = true, env = "PLANWELL_SEARCH_URL", help = "Search page queried for extra resources.")]
    search_url: Option<String>,
    #[arg(long, global = true, env = "PLANWELL_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,
    #[arg(long, global = true, env = "PLANWELL_RESEARCH", default_value_t = true, action = clap::ArgAction::Set)]
    research: bool,
    #[arg(long, global = true, env = "PLANWELL_PERSONALIZE", help = "Append a tip matching the detected learning style.")]
    personalize: bool,
    #[arg(long, global = true, env = "PLANWELL_RECORD_FAILURES", default_value_t = true, action = clap::ArgAction::Set)]
    record_failures: bool,
}

impl PlannerArgs {
    fn into_config(self) -> PlannerConfig {
        let mut config = PlannerConfig::new(self.provider);
        config.api_key = self.api_key;
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(url) = self.completion_url {
            config.completion_url = url;
        }
        if let Some(url) = self.search_url {
            config.search_url = url;
        }
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.research = self.research;
        config.personalize = self.personalize;
        config.record_failures = self.record_failures;
        config
    }
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the Planwell web UI.
    Serve {
        #[arg(long, default_value_t = 8501, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Directory holding index.html.")]
        templates: Option<String>,
        #[arg(long = "static", help = "Directory served under /static.")]
        static_dir: Option<String>,
    },
    /// Plan goals interactively in the terminal.
    Chat,
    /// Plan each goal in turn and print a progress report.
    Plan {
        #[arg(required = true, help = "One or more goals, planned in order.")]
        goals: Vec<String>,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (GEMINI_API_KEY lives there)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,planwell=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Planwell starting with command: {:?}", cli.command);

    let config = cli.planner.into_config();

    match cli.command {
        Commands::Serve {
            port,
            templates,
            static_dir,
        } => {
            let planner = SessionFactory::from_config(&config);
            if let Err(e) = &planner {
                error!("Planner unavailable, serving error page: {}", e);
            }
            let templates = templates.unwrap_or_else(|| constants::TEMPLATES_DIR.clone());
            let static_dir = static_dir.unwrap_or_else(|| constants::STATIC_DIR.clone());
            let state = AppState::new(templates, planner);

            let server = web_server::start_web_server(port, state, static_dir);
            tokio::pin!(server);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                }
                res = &mut server => {
                    res.context("Web server failed")?;
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            let factory = SessionFactory::from_config(&config).context("Cannot start chat")?;
            let mut session = factory.new_session();
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            chat::run_chat(&mut session, stdin, &mut stdout)
                .await
                .context("Chat session failed")?;
        }
        Commands::Plan { goals } => {
            let factory = SessionFactory::from_config(&config).context("Cannot create plans")?;
            let mut session = factory.new_session();
            let mut stdout = tokio::io::stdout();
            chat::run_batch(&mut session, &goals, &mut stdout).await?;
        }
    }

    Ok(())
}
