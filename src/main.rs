use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scrumy_client::config::Config;
use scrumy_client::report;
use scrumy_client::scrumy::http::format_scrumy_error;
use scrumy_client::{Fetched, ScrumyClient, ScrumyError, Selector};
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for Scrumy
#[derive(Parser, Debug)]
#[command(name = "scrumy", version, about, long_about = None)]
struct Args {
    /// Scrumy project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Project password
    #[arg(long, global = true)]
    password: Option<String>,

    /// YAML file with `project` and `password` keys
    #[arg(short, long, global = true)]
    credentials: Option<PathBuf>,

    /// API root (defaults to https://scrumy.com/api)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Remember project and base URL for later runs
    #[arg(long, global = true)]
    remember: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the project
    Project,
    /// List sprints
    Sprints,
    /// Show a sprint by id, or the current sprint
    Sprint {
        #[arg(default_value = "current")]
        selector: String,
    },
    /// List stories of a sprint
    Stories { sprint: String },
    /// List tasks of a story
    Tasks { story: String },
    /// List scrumers
    Scrumers,
    /// Show a scrumer by name
    Scrumer { name: String },
    /// List snapshots of a sprint (default: current sprint)
    Snapshots {
        #[arg(default_value = "current")]
        selector: String,
    },
    /// Print the regression steps of the current sprint as TSV
    Report {
        /// Omit the header row
        #[arg(long)]
        no_header: bool,
    },
    /// Fetch any resource by name, e.g. `get stories 12`
    Get {
        resource: String,
        selector: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("scrumy started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("scrumy").join("scrumy.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".scrumy").join("scrumy.log");
    }
    PathBuf::from("scrumy.log")
}

/// Build the effective configuration (CLI > env > credentials file > saved config)
fn load_config(args: &Args) -> Result<Config> {
    let cli = Config {
        project: args.project.clone(),
        password: args.password.clone(),
        base_url: args.base_url.clone(),
    };
    let file = match &args.credentials {
        Some(path) => Config::load_credentials_file(path)?,
        None => Config::default(),
    };

    Ok(Config::layered([cli, Config::from_env(), file, Config::load()]))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = load_config(&args)?;
    let project = config.effective_project()?;
    let password = config.effective_password()?;
    let base_url = config.effective_base_url()?;

    tracing::info!("Using project: {}, base URL: {}", project, base_url);

    if args.remember {
        let mut saved = Config::load();
        saved.base_url = Some(base_url.clone());
        saved.set_project(&project)?;
    }

    let client = ScrumyClient::builder(&project, &password)
        .base_url(&base_url)
        .build()?;
    tracing::debug!("Client ready for {}", client.base_url());

    if let Err(e) = run(&client, args.command).await {
        tracing::error!("{:#}", e);
        let message = match e.downcast_ref::<ScrumyError>() {
            Some(err) => format_scrumy_error(err),
            None => format!("{:#}", e),
        };
        eprintln!("scrumy: {}", message);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(client: &ScrumyClient, command: Command) -> Result<()> {
    let fetched = match command {
        Command::Project => client.dispatch("scrumy", &Selector::All).await?,
        Command::Sprints => client.dispatch("sprints", &Selector::All).await?,
        Command::Sprint { selector } => {
            client
                .dispatch("sprint", &Selector::parse(&selector))
                .await?
        }
        Command::Stories { sprint } => client.dispatch("stories", &sprint.into()).await?,
        Command::Tasks { story } => client.dispatch("tasks", &story.into()).await?,
        Command::Scrumers => client.dispatch("scrumers", &Selector::All).await?,
        Command::Scrumer { name } => client.dispatch("scrumer", &name.into()).await?,
        Command::Snapshots { selector } => {
            Fetched::Many(client.snapshots(&Selector::parse(&selector)).await?)
        }
        Command::Report { no_header } => {
            let rows = report::regression_steps(client, !no_header).await?;
            report::write_tsv(&rows, io::stdout().lock()).context("Failed to write report")?;
            return Ok(());
        }
        Command::Get { resource, selector } => {
            let selector = selector.as_deref().map(Selector::parse).unwrap_or_default();
            client.dispatch(&resource, &selector).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&fetched)?);
    Ok(())
}
