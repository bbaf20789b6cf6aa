//! # glab-tools CLI Interface
//!
//! This module implements the command-line surface of glab-tools: argument parsing,
//! tracing setup and the async [`run`] entrypoint shared by `main` and integration tests.
//!
//! All mapping, schema and dev environment logic lives in [`glab_tools_core`]; this
//! module only wires configuration and concrete clients into it.
//!
//! ## Commands
//! - `schema <INDEX>`: write the flattened CSV schema of an index mapping.
//! - `dev-env --create|--update`: fork/clone or rebase the GrimoireLab repositories.
//!
//! [`run`] never exits the process; failures come back as `anyhow::Error` and `main`
//! turns them into a non-zero exit status.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glab_tools_core::dev_env::{check_token, create, update, CommandGit, DevEnvSettings};
use glab_tools_core::flatten::PrefixMode;
use glab_tools_core::mapping::{ElasticsearchSource, StaticFileSource};
use glab_tools_core::schema::{generate_schema, SchemaJob};
use std::path::PathBuf;
use tracing::Level;

use crate::github::GitHubClient;
use crate::load_config::load_config;

#[derive(Parser, Debug)]
#[clap(
    name = "glab-tools",
    version,
    about = "GrimoireLab developer utilities: index schema generation and dev environment setup"
)]
pub struct Cli {
    /// Set debug mode for logging
    #[clap(short, long, global = true)]
    pub debug: bool,

    /// Optional YAML config file (elasticsearch and dev_env sections)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the schema template (CSV) of an index
    Schema {
        /// Index name
        index_name: String,

        /// Schema file
        #[clap(short, long, default_value = "schema.csv")]
        file: PathBuf,

        /// Where the mapping comes from
        #[clap(long, value_enum, default_value_t = MappingSourceKind::Live)]
        source: MappingSourceKind,

        /// Mapping dump file, used with `--source dump` (default: <INDEX_NAME>.json)
        #[clap(long)]
        dump: Option<PathBuf>,

        /// Keep every ancestor in field names instead of only the immediate parent
        #[clap(long)]
        full_path: bool,
    },
    /// Set up or update the GrimoireLab development environment
    DevEnv {
        /// GitHub API token (falls back to GITHUB_TOKEN)
        #[clap(short, long)]
        token: Option<String>,

        /// Folder of the dev env
        #[clap(short, long)]
        source: Option<PathBuf>,

        /// Create the repositories: fork, clone and set the upstream remote
        #[clap(short, long, conflicts_with = "update")]
        create: bool,

        /// Update the forks by rebasing onto upstream
        #[clap(short, long)]
        update: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MappingSourceKind {
    /// Query the cluster configured under `elasticsearch`
    Live,
    /// Read a JSON dump of the mapping
    Dump,
}

/// Install the global fmt subscriber: INFO by default, DEBUG (with targets) in debug mode.
pub fn init_tracing(debug: bool) {
    let builder = tracing_subscriber::fmt();
    let result = if debug {
        builder.with_max_level(Level::DEBUG).with_target(true).try_init()
    } else {
        builder.with_max_level(Level::INFO).with_target(false).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {e}");
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("start");
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Schema {
            index_name,
            file,
            source,
            dump,
            full_path,
        } => {
            let mut job = SchemaJob::new(index_name.as_str(), file);
            if full_path {
                job.prefix_mode = PrefixMode::FullPath;
            }

            let report = match source {
                MappingSourceKind::Live => {
                    let es = ElasticsearchSource::new(&config.settings.elasticsearch)?;
                    generate_schema(&es, &job).await?
                }
                MappingSourceKind::Dump => {
                    let path = dump.unwrap_or_else(|| PathBuf::from(format!("{index_name}.json")));
                    let dump_source =
                        StaticFileSource::new(path, config.settings.elasticsearch.doc_type.as_str());
                    generate_schema(&dump_source, &job).await?
                }
            };
            tracing::info!(
                command = "schema",
                index = %report.index,
                rows = report.rows,
                skipped = report.skipped,
                path = %report.destination.display(),
                "Schema file generated"
            );
            Ok(())
        }
        Commands::DevEnv {
            token,
            source,
            create: do_create,
            update: do_update,
        } => {
            let token = token
                .or(config.github_token)
                .context("a GitHub token is required, pass --token or set GITHUB_TOKEN")?;

            let mut dev_env = config.settings.dev_env;
            if let Some(source) = source {
                dev_env.source_dir = source;
            }
            let settings = DevEnvSettings::from_config(&dev_env)?;
            let host = GitHubClient::new(&dev_env.github_api_url, token)?;
            check_token(&host).await?;

            let git = CommandGit::new();
            let report = if do_create {
                create(&host, &git, &settings).await?
            } else if do_update {
                update(&git, &settings)?
            } else {
                bail!("select any method, --create or --update");
            };
            tracing::info!(command = "dev-env", ?report, "Dev environment ready");
            Ok(())
        }
    }
}
