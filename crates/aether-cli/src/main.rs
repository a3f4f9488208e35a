mod tui;

use std::io::{BufRead, IsTerminal};

use aether_core::api::HttpBackend;
use aether_core::auth::LOGIN_FAILED_ALERT;
use aether_core::config::AetherConfig;
use aether_core::files::{PickedFile, LOGIN_TO_UPLOAD, ONLY_PDF, UPLOAD_FAILED};
use aether_core::model::*;
use aether_core::storage::create_storage;
use aether_core::workspace::Workspace;
use anyhow::{bail, Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted by `login` when `--token` is not given.
const TOKEN_ENV: &str = "AETHER_ID_TOKEN";

#[derive(Parser)]
#[command(name = "aether", about = "Aether: chat with your PDFs", version)]
enum Cli {
    /// Log in with an identity token issued by the identity provider
    Login {
        /// ID token (falls back to $AETHER_ID_TOKEN, then stdin)
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the signed-in user and the active session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List your uploaded files
    Files {
        /// Output raw JSON instead of table
        #[arg(long)]
        json: bool,
    },
    /// Upload a PDF
    Upload {
        /// Path to the PDF file
        path: String,
    },
    /// Scope retrieval to these files (replaces the current selection)
    Select {
        /// Filenames as shown by `aether files`
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// List your chat sessions
    Sessions {
        /// Output raw JSON instead of table
        #[arg(long)]
        json: bool,
    },
    /// Make a past session the active one
    Resume {
        /// Session ID
        id: String,
    },
    /// Start a new chat (the session is created on the first question)
    New,
    /// Print the active session's transcript
    Show {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask a question in the active session
    Ask {
        /// Question text
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Interactive terminal UI
    Tui,
    /// Show configuration and client state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal; only log there when asked to.
    let quiet_tui = matches!(cli, Cli::Tui) && std::env::var_os("RUST_LOG").is_none();
    if !quiet_tui {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .compact()
            .init();
    }

    let config = AetherConfig::load(Some(&std::env::current_dir()?))
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config: failed to load, using defaults");
            AetherConfig::default_config()
        });

    run(cli, &config).await
}

async fn run(cli: Cli, config: &AetherConfig) -> Result<()> {
    match cli {
        Cli::Login { token } => {
            let (mut ws, backend) = open(config)?;
            cmd_login(&mut ws, &backend, token).await
        }
        Cli::Logout => {
            let (mut ws, _) = open(config)?;
            cmd_logout(&mut ws)
        }
        Cli::Whoami { json } => {
            let (ws, _) = open(config)?;
            cmd_whoami(&ws, json)
        }
        Cli::Files { json } => {
            let (mut ws, backend) = open(config)?;
            cmd_files(&mut ws, &backend, json).await
        }
        Cli::Upload { path } => {
            let (mut ws, backend) = open(config)?;
            cmd_upload(&mut ws, &backend, &path).await
        }
        Cli::Select { filenames } => {
            let (mut ws, backend) = open(config)?;
            cmd_select(&mut ws, &backend, filenames).await
        }
        Cli::Sessions { json } => {
            let (mut ws, backend) = open(config)?;
            cmd_sessions(&mut ws, &backend, json).await
        }
        Cli::Resume { id } => {
            let (mut ws, backend) = open(config)?;
            cmd_resume(&mut ws, &backend, &id).await
        }
        Cli::New => {
            let (mut ws, _) = open(config)?;
            cmd_new(&mut ws)
        }
        Cli::Show { json } => {
            let (mut ws, backend) = open(config)?;
            cmd_show(&mut ws, &backend, json).await
        }
        Cli::Ask { question } => {
            let (mut ws, backend) = open(config)?;
            cmd_ask(&mut ws, &backend, &question.join(" ")).await
        }
        Cli::Tui => tui::run_tui(config).await,
        Cli::Status => {
            let (ws, _) = open(config)?;
            cmd_status(&ws, config)
        }
    }
}

/// Load client state and build the HTTP backend.
fn open(config: &AetherConfig) -> Result<(Workspace, HttpBackend)> {
    let storage = create_storage(config).context("failed to open client storage")?;
    let ws = Workspace::load(storage, config).context("failed to load client state")?;
    let backend =
        HttpBackend::from_config(&config.api).context("failed to create HTTP client")?;
    tracing::debug!(
        backend = backend.base_url(),
        storage = %ws.storage().describe(),
        logged_in = ws.user().is_some(),
        "cli: workspace opened"
    );
    Ok((ws, backend))
}

fn require_user(ws: &Workspace) -> Result<&User> {
    ws.user()
        .context("not logged in (run `aether login` first)")
}

// ---------------------------------------------------------------------------
// login / logout / whoami
// ---------------------------------------------------------------------------

async fn cmd_login(ws: &mut Workspace, backend: &HttpBackend, token: Option<String>) -> Result<()> {
    let credential = match token.or_else(|| std::env::var(TOKEN_ENV).ok()) {
        Some(t) => t,
        None => read_token_from_stdin()?,
    };

    match ws.login(backend, &credential).await {
        Ok(user) => {
            println!(
                "{} {} <{}>",
                "Logged in as".green(),
                user.display_name().bold(),
                user.email.cyan()
            );
            println!(
                "  {} files, {} sessions",
                ws.files.files().len().to_string().cyan(),
                ws.history.sessions().len().to_string().cyan()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", LOGIN_FAILED_ALERT.red().bold());
            if e.is_unauthorized() {
                eprintln!(
                    "  {}",
                    "The backend rejected the ID token; get a fresh one and retry.".dimmed()
                );
            }
            Err(e).context("login failed")
        }
    }
}

fn read_token_from_stdin() -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Paste ID token: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("failed to read token from stdin")?;
    Ok(line.trim().to_string())
}

fn cmd_logout(ws: &mut Workspace) -> Result<()> {
    if ws.user().is_none() {
        println!("{}", "Not logged in.".dimmed());
        return Ok(());
    }
    ws.logout().context("failed to clear client state")?;
    println!("{}", "Logged out.".green());
    Ok(())
}

fn cmd_whoami(ws: &Workspace, json: bool) -> Result<()> {
    let Some(user) = ws.user() else {
        if json {
            println!("null");
        } else {
            println!("{}", "Not logged in.".dimmed());
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }

    println!("{}", user.display_name().bold());
    println!("  {}    {}", "Email:".dimmed(), user.email.cyan());
    if !user.picture.is_empty() {
        println!("  {}  {}", "Picture:".dimmed(), user.picture);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// files / upload / select
// ---------------------------------------------------------------------------

async fn cmd_files(ws: &mut Workspace, backend: &HttpBackend, json: bool) -> Result<()> {
    require_user(ws)?;
    ws.refresh_files(backend)
        .await
        .context("failed to list files")?;
    let files = ws.files.files();

    if json {
        println!("{}", serde_json::to_string_pretty(files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files uploaded yet.".dimmed());
        return Ok(());
    }

    println!(
        "{:<40} {:>10} {}",
        "Filename".dimmed(),
        "Size".dimmed(),
        "URL".dimmed()
    );
    for f in files {
        let size = if f.size > 0 {
            f.size_label()
        } else {
            "-".to_string()
        };
        println!("{:<40} {:>10} {}", f.filename.cyan(), size, f.url.dimmed());
    }
    Ok(())
}

async fn cmd_upload(ws: &mut Workspace, backend: &HttpBackend, path: &str) -> Result<()> {
    let picked = PickedFile::open(path).with_context(|| format!("failed to read {path}"))?;
    let filename = picked.filename.clone();
    let status = ws.upload(backend, picked).await.unwrap_or_default();

    if [LOGIN_TO_UPLOAD, ONLY_PDF, UPLOAD_FAILED].contains(&status.as_str()) {
        bail!("{status}");
    }
    println!("{} {}", status.green(), filename.dimmed());
    Ok(())
}

async fn cmd_select(ws: &mut Workspace, backend: &HttpBackend, filenames: Vec<String>) -> Result<()> {
    require_user(ws)?;
    ws.select_files(backend, filenames).await;
    println!("{}", "Selected:".bold());
    for f in ws.files.selected() {
        println!("  {} {}", "✓".green(), f);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// sessions / resume / new
// ---------------------------------------------------------------------------

async fn cmd_sessions(ws: &mut Workspace, backend: &HttpBackend, json: bool) -> Result<()> {
    require_user(ws)?;
    ws.refresh_sessions(backend)
        .await
        .context("failed to list sessions")?;
    let sessions = ws.history.sessions();

    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", "No chat sessions yet.".dimmed());
        return Ok(());
    }

    let active = ws.session().map(|s| s.id.as_str());
    println!("  {:<26} {}", "ID".dimmed(), "Title".dimmed());
    for s in sessions {
        let marker = if Some(s.id.as_str()) == active {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {:<26} {}", marker, s.id.cyan(), s.title);
    }
    Ok(())
}

async fn cmd_resume(ws: &mut Workspace, backend: &HttpBackend, id: &str) -> Result<()> {
    require_user(ws)?;
    ws.refresh_sessions(backend)
        .await
        .context("failed to list sessions")?;
    let summary = ws
        .history
        .sessions()
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .with_context(|| format!("no session with id {id}"))?;

    ws.select_session(summary.clone())
        .context("failed to persist active session")?;
    println!("{} {}", "Resumed".green(), summary.title.bold());
    Ok(())
}

fn cmd_new(ws: &mut Workspace) -> Result<()> {
    ws.new_chat().context("failed to clear active session")?;
    println!(
        "{}",
        "New chat: the session is created with your first question.".green()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// show / ask
// ---------------------------------------------------------------------------

async fn cmd_show(ws: &mut Workspace, backend: &HttpBackend, json: bool) -> Result<()> {
    require_user(ws)?;
    let Some(load) = ws.chat.reload() else {
        if json {
            println!("[]");
        } else {
            println!("{}", "No active session.".dimmed());
        }
        return Ok(());
    };
    let messages = load
        .execute(backend)
        .await
        .context("failed to load transcript")?;
    ws.chat.finish_load(load.epoch, Ok(messages));

    if json {
        println!("{}", serde_json::to_string_pretty(ws.chat.messages())?);
        return Ok(());
    }

    if let Some(s) = ws.session() {
        println!("{}", s.title.bold());
        println!();
    }
    for m in ws.chat.messages() {
        print_message(m);
    }
    Ok(())
}

async fn cmd_ask(ws: &mut Workspace, backend: &HttpBackend, question: &str) -> Result<()> {
    require_user(ws)?;
    if question.trim().is_empty() {
        bail!("question cannot be empty");
    }
    let before = ws.session().map(|s| s.id.clone());
    ws.send(backend, question).await?;

    if let Some(s) = ws.session() {
        if before.as_deref() != Some(s.id.as_str()) {
            println!(
                "{} {} ({})",
                "Started session".dimmed(),
                s.title.bold(),
                s.id.cyan()
            );
        }
    }
    if let Some(answer) = ws.chat.messages().last() {
        print_message(answer);
        if answer.text == ERROR_REPLY {
            bail!("the backend did not answer");
        }
    }
    Ok(())
}

fn print_message(m: &Message) {
    match m.role {
        Role::User => println!("{} {}", "you:".cyan().bold(), m.text),
        Role::Ai => println!("{} {}", " ai:".magenta().bold(), m.text),
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn cmd_status(ws: &Workspace, config: &AetherConfig) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    println!("{}", format!("{} Status v{version}", ws.brand()).bold());
    println!("  {}   {}", "Backend:".dimmed(), config.api.base_url);
    match config.api.timeout_secs {
        Some(secs) => println!("  {}   {secs}s", "Timeout:".dimmed()),
        None => println!("  {}   {}", "Timeout:".dimmed(), "none".dimmed()),
    }
    println!(
        "  {}   {} ({})",
        "Storage:".dimmed(),
        config.storage.backend.cyan(),
        ws.storage().describe()
    );
    match ws.user() {
        Some(u) => println!("  {}      {} <{}>", "User:".dimmed(), u.display_name(), u.email.cyan()),
        None => println!("  {}      {}", "User:".dimmed(), "not logged in".yellow()),
    }
    match ws.session() {
        Some(s) => println!("  {}   {} ({})", "Session:".dimmed(), s.title, s.id.cyan()),
        None => println!("  {}   {}", "Session:".dimmed(), "none".dimmed()),
    }
    if ws.files.legacy_listing() {
        println!("  {}     {}", "Files:".dimmed(), "legacy listing (/files)".yellow());
    }

    let mut check = config.clone();
    let warnings = check.validate();
    if !warnings.is_empty() {
        println!();
        for w in warnings {
            println!("  {} {}", "warning:".yellow(), w);
        }
    }
    Ok(())
}
