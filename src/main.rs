//! canvas-sync: GoCanvas submission retrieval and reshaping
//!
//! Lists submissions for a date range, saves each one raw, and writes a
//! form-structured document alongside it using the submission's form
//! definition. Also exposes the individual list/get operations and an
//! offline transform of saved files.

mod api;
mod commands;
mod config;
mod harvest;
mod model;
mod output;
mod transform;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::CanvasClient;
use config::{ApiConfig, ConfigError, ConfigOrigin, ConfigOverrides};

#[derive(Parser)]
#[command(name = "canvas-sync")]
#[command(about = "Retrieve GoCanvas submissions and reshape them by form structure")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "CANVAS_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_parser = config::parse_log_level)]
    log_level: Option<String>,

    /// Username for Basic auth
    #[arg(short, long, global = true, env = "CANVAS_USERNAME")]
    username: Option<String>,

    /// Password for Basic auth
    #[arg(short, long, global = true, env = "CANVAS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// OAuth bearer token, preferred over username/password
    #[arg(long, global = true, env = "CANVAS_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve submissions with full details and transform them
    Harvest {
        /// Number of days to look back
        #[arg(short, long, default_value_t = 7, value_parser = days_parser())]
        days: i64,

        /// Form ID to filter by and to transform with
        #[arg(long)]
        form_id: Option<u64>,

        /// Output directory
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List forms
    ListForms {
        /// Filter by status (published, draft, ...)
        #[arg(long)]
        status: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Retrieve one form definition
    GetForm {
        #[arg(long)]
        form_id: u64,

        #[arg(long, default_value = "published")]
        status: String,

        #[arg(long)]
        version: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List submissions without fetching their details
    ListSubmissions {
        /// Number of days to look back
        #[arg(short, long, conflicts_with = "start_date", value_parser = days_parser())]
        days: Option<i64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        #[arg(short, long)]
        form_id: Option<u64>,

        /// Page to fetch with --no-all-pages
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = api::MAX_PER_PAGE)]
        per_page: u32,

        /// Fetch only the requested page
        #[arg(long)]
        no_all_pages: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Transform a saved submission using a saved form definition
    Transform {
        /// Form definition JSON file
        #[arg(long)]
        form: PathBuf,

        /// Submission JSON file
        #[arg(long)]
        submission: PathBuf,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Look-back windows longer than a century are rejected
const MAX_DAYS: i64 = 36_500;

fn days_parser() -> clap::builder::RangedI64ValueParser<i64> {
    clap::value_parser!(i64).range(0..=MAX_DAYS)
}

/// Where a listing goes
#[derive(Args)]
struct OutputArgs {
    /// Output file
    #[arg(short, long, conflicts_with = "output_to_screen")]
    output: Option<PathBuf>,

    /// Print JSON to stdout instead of writing a file
    #[arg(long)]
    output_to_screen: bool,
}

impl From<&OutputArgs> for commands::Destination {
    fn from(args: &OutputArgs) -> Self {
        if args.output_to_screen {
            commands::Destination::Screen
        } else {
            commands::Destination::File(args.output.clone())
        }
    }
}

/// Build the service client from resolved configuration
fn connect(config: &ApiConfig) -> Result<CanvasClient> {
    let credentials = config.credentials()?;
    Ok(CanvasClient::new(config.base_url.as_deref(), credentials)?)
}

fn init_tracing(level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("canvas_sync={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = ApiConfig::load(cli.config_file.as_deref());
    let file_level = loaded
        .as_ref()
        .ok()
        .and_then(|(config, _)| config.log_level.as_deref())
        .and_then(|level| config::parse_log_level(level).ok());
    let level = cli
        .log_level
        .clone()
        .or(file_level)
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&level, cli.log_file.as_ref())?;

    let config = match loaded {
        Ok((config, origin)) => {
            match origin {
                ConfigOrigin::File(path) => debug!("Loaded config from {}", path.display()),
                ConfigOrigin::CreatedDefault(path) => {
                    info!("Created default config file at {}", path.display())
                }
                ConfigOrigin::Defaults => warn!("No config file available, using defaults"),
            }
            config
        }
        Err(e @ ConfigError::Invalid { .. }) => {
            warn!("{e}; using defaults");
            ApiConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    let command_form_id = match &cli.command {
        Command::Harvest { form_id, .. } => *form_id,
        _ => None,
    };
    let config = config.with_overrides(ConfigOverrides {
        username: cli.username,
        password: cli.password,
        bearer_token: cli.bearer_token,
        form_id: command_form_id,
    });

    let per_page = config.per_page.unwrap_or(api::MAX_PER_PAGE);

    match &cli.command {
        Command::Transform {
            form,
            submission,
            output,
        } => {
            commands::transform_files(form, submission, output.as_deref())?;
        }
        Command::Harvest { days, output, .. } => {
            let client = connect(&config)?;
            commands::harvest(&client, &config, *days, output.as_deref(), per_page).await?;
        }
        Command::ListForms { status, output } => {
            let client = connect(&config)?;
            commands::list_forms(&client, status.clone(), per_page, output.into()).await?;
        }
        Command::GetForm {
            form_id,
            status,
            version,
            output,
        } => {
            let client = connect(&config)?;
            let lookup = api::FormLookup {
                status: Some(status.clone()),
                version: version.clone(),
            };
            commands::get_form(&client, *form_id, &lookup, output.into()).await?;
        }
        Command::ListSubmissions {
            days,
            start_date,
            end_date,
            form_id,
            page,
            per_page,
            no_all_pages,
            output,
        } => {
            let client = connect(&config)?;
            let filter = commands::submission_filter(
                *days,
                start_date.clone(),
                end_date.clone(),
                form_id.or(config.form_id),
                chrono::Local::now().date_naive(),
            )?;
            let pages = if *no_all_pages {
                commands::PageSelection::Single(*page)
            } else {
                commands::PageSelection::All
            };
            commands::list_submissions(&client, &filter, pages, *per_page, output.into()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_harvest_defaults() {
        let cli = Cli::try_parse_from(["canvas-sync", "harvest"]).unwrap();
        match cli.command {
            Command::Harvest { days, form_id, output } => {
                assert_eq!(days, 7);
                assert!(form_id.is_none());
                assert!(output.is_none());
            }
            _ => panic!("expected harvest"),
        }
    }

    #[test]
    fn test_days_is_bounded() {
        assert!(Cli::try_parse_from(["canvas-sync", "harvest", "-d", "36500"]).is_ok());
        assert!(Cli::try_parse_from(["canvas-sync", "harvest", "-d", "200000000"]).is_err());
        assert!(Cli::try_parse_from(["canvas-sync", "harvest", "--days=-1"]).is_err());
        assert!(
            Cli::try_parse_from(["canvas-sync", "list-submissions", "--days", "99999999"]).is_err()
        );
    }

    #[test]
    fn test_log_level_names() {
        let cli =
            Cli::try_parse_from(["canvas-sync", "--log-level", "WARNING", "harvest"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
        assert!(Cli::try_parse_from(["canvas-sync", "--log-level", "loud", "harvest"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "canvas-sync",
            "get-form",
            "--form-id",
            "12",
            "--bearer-token",
            "tok",
            "--output-to-screen",
        ])
        .unwrap();
        assert_eq!(cli.bearer_token.as_deref(), Some("tok"));
        assert!(matches!(cli.command, Command::GetForm { form_id: 12, .. }));
    }
}
