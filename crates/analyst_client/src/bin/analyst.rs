//! analyst: command-line client for the Auto Analyst backend.
//! Reads config, logs in (tokens are never kept between runs), runs one
//! command and prints what the page would have shown.

use analyst_client::client::{QUERY_FAILED, REGISTER_FAILED, UPLOAD_FAILED};
use analyst_client::{config, logging, ApiClient, Config, Credentials, Session, UploadFile};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "analyst", version, about = "Auto Analyst command-line client")]
struct Cli {
    /// Config file; must exist when given. Defaults to ~/.auto-analyst/config.yaml.
    #[arg(long, global = true, env = config::CONFIG_ENV)]
    config: Option<PathBuf>,
    #[arg(long, global = true, env = "ANALYST_USERNAME", default_value = "")]
    username: String,
    #[arg(
        long,
        global = true,
        env = "ANALYST_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    password: String,
    /// Key of a previously uploaded file, sent along with `query`.
    #[arg(long, global = true)]
    file_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and report the outcome.
    Login,
    /// Create an account. No login happens first.
    Register,
    /// Upload FILE, or an empty form when none is given.
    Upload { file: Option<PathBuf> },
    /// Submit a query. Without TEXT the first stdin line is used.
    Query { text: Vec<String> },
    /// Print every result record, one per line.
    Results,
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config, String> {
    // --config <path> or ANALYST_CONFIG: the file must exist.
    if let Some(path) = explicit {
        return config::load(&path)
            .map_err(|e| format!("failed to load config from {}: {}", path.display(), e));
    }
    // Default path (~/.auto-analyst/config.yaml), optional.
    match config::default_config_path() {
        Some(path) => config::load_or_default(&path)
            .map_err(|e| format!("failed to load config from {}: {}", path.display(), e)),
        None => Ok(Config::default()),
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let cfg = load_config(cli.config.clone()).unwrap_or_else(|e| fail(e));
    logging::init(&cfg);

    let credentials = Credentials::new(cli.username.clone(), cli.password.clone());

    let query = match &cli.command {
        Command::Query { text } if text.join(" ").trim().is_empty() => {
            // Read query from stdin (first line).
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).unwrap_or(0);
            Some(line.trim().to_string())
        }
        Command::Query { text } => Some(text.join(" ")),
        _ => None,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("failed to create runtime: {}", e)));

    let code = rt.block_on(async {
        let client = ApiClient::from_config(&cfg).unwrap_or_else(|e| fail(e));
        tracing::info!(base_url = client.base_url(), "using backend");

        let stdout = io::stdout();
        let mut out = stdout.lock();

        if let Command::Register = cli.command {
            let reply = client.register(&credentials).await.unwrap_or_else(|e| fail(e));
            let _ = writeln!(out, "{}", reply.display_text(REGISTER_FAILED));
            return if reply.is_success() { 0 } else { 1 };
        }

        let mut session = Session::new();
        let outcome = client
            .login(&mut session, &credentials)
            .await
            .unwrap_or_else(|e| fail(e));
        if !outcome.is_authenticated() || matches!(cli.command, Command::Login) {
            let _ = writeln!(out, "{}", outcome.display_text());
            return if outcome.is_authenticated() { 0 } else { 1 };
        }

        match &cli.command {
            Command::Upload { file } => {
                let file = match file {
                    Some(p) => Some(UploadFile::read(p).await.unwrap_or_else(|e| fail(e))),
                    None => None,
                };
                let reply = client
                    .upload_file(&session, file)
                    .await
                    .unwrap_or_else(|e| fail(e));
                let _ = writeln!(out, "{}", reply.display_text(UPLOAD_FAILED));
                if let Some(key) = &reply.body.file_key {
                    let _ = writeln!(out, "file_key: {}", key);
                }
                if reply.is_success() { 0 } else { 1 }
            }
            Command::Query { .. } => {
                let text = query.as_deref().unwrap_or_default();
                let reply = client
                    .submit_query(&session, text, cli.file_key.as_deref())
                    .await
                    .unwrap_or_else(|e| fail(e));
                let _ = writeln!(out, "{}", reply.display_text(QUERY_FAILED));
                if let Some(key) = &reply.body.result_key {
                    let _ = writeln!(out, "result_key: {}", key);
                }
                if reply.is_success() { 0 } else { 1 }
            }
            Command::Results => {
                let records = client.fetch_results(&session).await.unwrap_or_else(|e| fail(e));
                for record in &records {
                    let _ = writeln!(out, "{}", analyst_client::render_record(record));
                }
                0
            }
            Command::Login | Command::Register => 0,
        }
    });

    process::exit(code);
}
