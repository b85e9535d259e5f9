//! Agent Portal CLI - terminal front end for the Agent Portal API.
//!
//! # Usage
//!
//! ```bash
//! # Create a customer account, then log in
//! ap-cli register -u carol -e carol@example.com --password s3cret
//! AGENT_PORTAL_PASSWORD=s3cret ap-cli login -u carol
//!
//! # Chat with an assigned agent
//! ap-cli agents list
//! ap-cli chat send 3f1c... "How many leave days do I have?"
//!
//! # Admin: create an agent and a staff account
//! ap-cli agents create -n "HR Helper" -d "Answers HR questions" -t send_email -a <user-id>
//! ap-cli users create -u dave -r employee --password temp123
//! ```
//!
//! # Commands
//!
//! - `register`, `login`, `logout`, `whoami` - session management
//! - `open` - check whether a portal route would render for this session
//! - `users`, `profile` - account management
//! - `agents`, `tools` - agent management
//! - `chat` - conversations with an agent
//! - `letter`, `email` - letter generation and outgoing email

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_portal_client::{ClientConfig, PortalClient};

mod commands;
mod error;
mod output;

use error::CliError;

#[derive(Parser)]
#[command(name = "ap-cli")]
#[command(author, version, about = "Agent Portal command-line client")]
struct Cli {
    /// API base URL (overrides `AGENT_PORTAL_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides `AGENT_PORTAL_SESSION_FILE`)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a customer account
    Register {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(long, env = "AGENT_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the session
    Login {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(long, env = "AGENT_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the current session
    Whoami,
    /// Check where navigating to a portal route would land
    Open {
        /// Route path, e.g. `/create-agent` or `/chat/<agent-id>`
        path: String,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: commands::users::UsersAction,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: commands::users::ProfileAction,
    },
    /// Manage agents
    Agents {
        #[command(subcommand)]
        action: commands::agents::AgentsAction,
    },
    /// List the tools agents can use
    Tools,
    /// Talk to an agent
    Chat {
        #[command(subcommand)]
        action: commands::chat::ChatAction,
    },
    /// Generate a letter from a template
    Letter(commands::letters::LetterArgs),
    /// Send an email
    Email(commands::letters::EmailArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        output::error(&e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    // Quiet by default; RUST_LOG raises verbosity.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url)?;
    }
    if let Some(session_file) = &cli.session_file {
        config = config.with_session_file(session_file);
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let client = PortalClient::new(config)?;

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => commands::session::register(&client, &username, &email, password).await,
        Commands::Login { username, password } => {
            commands::session::login(&client, &username, password).await
        }
        Commands::Logout => commands::session::logout(&client),
        Commands::Whoami => {
            commands::session::whoami(&client);
            Ok(())
        }
        Commands::Open { path } => commands::session::open(&client, &path),
        Commands::Users { action } => commands::users::run_users(&client, action).await,
        Commands::Profile { action } => commands::users::run_profile(&client, action).await,
        Commands::Agents { action } => commands::agents::run(&client, action).await,
        Commands::Tools => commands::agents::tools(&client).await,
        Commands::Chat { action } => commands::chat::run(&client, action).await,
        Commands::Letter(args) => commands::letters::letter(&client, args).await,
        Commands::Email(args) => commands::letters::email(&client, args).await,
    }
}
