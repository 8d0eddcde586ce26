use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod config;
mod fetch;
mod models;
mod pipeline;
mod report;
mod session;
mod skills;
mod timeline;
mod xp;

use config::ApiArgs;
use fetch::ApiClient;
use models::ProfileSummary;
use session::Session;

#[derive(Parser)]
#[command(name = "profile-dashboard")]
#[command(about = "Learning-platform profile dashboard: XP, progress over time and skills", long_about = None)]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AuthArgs {
    /// Username or email for sign-in
    #[arg(long, env = "PROFILE_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "PROFILE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Use an existing bearer token instead of signing in
    #[arg(long, env = "PROFILE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, fetch the profile and print the summary
    Show {
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Write a markdown report
    Report {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the summary as JSON or the daily XP series as CSV
    Export {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        #[arg(long)]
        out: PathBuf,
    },
    /// Summarize a saved profile JSON file without contacting the API
    Summarize {
        #[arg(long)]
        profile: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { auth } => {
            let mut session = open_session(cli.api, auth).await?;
            let (name, summary) = current_view(&session)?;
            print!("{}", report::render_summary(name, summary));
            session.logout();
        }
        Commands::Report { auth, out } => {
            let mut session = open_session(cli.api, auth).await?;
            let (_, summary) = current_view(&session)?;
            std::fs::write(&out, report::build_report(summary))
                .with_context(|| format!("failed to write {}", out.display()))?;
            session.logout();
            println!("Report written to {}.", out.display());
        }
        Commands::Export { auth, format, out } => {
            let mut session = open_session(cli.api, auth).await?;
            let (_, summary) = current_view(&session)?;
            export(summary, format, &out)?;
            session.logout();
            println!("Exported to {}.", out.display());
        }
        Commands::Summarize { profile } => {
            let raw = std::fs::read_to_string(&profile)
                .with_context(|| format!("failed to read {}", profile.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("profile file is not valid JSON")?;
            let profile = fetch::profile_from_json(&value)?;
            let summary = pipeline::summarize(&profile);
            print!("{}", report::render_summary(&summary.login, &summary));
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_session(api: ApiArgs, auth: AuthArgs) -> anyhow::Result<Session> {
    let config = api.into_config()?;
    let client = ApiClient::new(&config)?;
    let mut session = Session::init();

    let (token, display_name) = match auth.token {
        Some(token) => (token, String::new()),
        None => {
            let username = auth
                .username
                .context("PROFILE_USERNAME or --username is required without a token")?;
            let password = auth
                .password
                .context("PROFILE_PASSWORD or --password is required without a token")?;
            let token = client
                .sign_in(&username, &password)
                .await
                .context("Invalid login credentials")?;
            (token, username)
        }
    };
    session.sign_in(token, display_name);

    pipeline::refresh(&mut session, &client)
        .await
        .context("Failed to fetch user data.")?;
    Ok(session)
}

fn current_view(session: &Session) -> anyhow::Result<(&str, &ProfileSummary)> {
    let summary = session.view().context("no profile loaded")?;
    Ok((session.display_name().unwrap_or(&summary.login), summary))
}

fn export(summary: &ProfileSummary, format: ExportFormat, out: &Path) -> anyhow::Result<()> {
    match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(summary)?;
            std::fs::write(out, json)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        ExportFormat::Csv => {
            let file = std::fs::File::create(out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_buckets_csv(&summary.xp_over_time.buckets, file)?;
        }
    }
    Ok(())
}
