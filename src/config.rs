use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::inspect::schema::DateFilter;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub output_file: String, // name offered for downloads and `generate --save`
    pub default_term_column: String,
    pub default_start: NaiveDate,
    pub default_end: NaiveDate,
}

impl GeneratorConfig {
    /// Filter settings a new session starts with (disabled).
    pub fn default_date_filter(&self) -> DateFilter {
        DateFilter {
            enabled: false,
            column: self.default_term_column.clone(),
            start: self.default_start,
            end: self.default_end,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub web: WebConfig,
    pub generator: GeneratorConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web form and JSON API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate an inspection query from TSV column specs
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Fully qualified table, e.g. project.dataset.table
    #[arg(short, long)]
    pub table: String,

    /// TSV file with `name<TAB>type` lines (stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Restrict every SELECT to a date range
    #[arg(long)]
    pub date_filter: bool,

    /// Column used by the date filter
    #[arg(long, requires = "date_filter")]
    pub date_column: Option<String>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long, requires = "date_filter")]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long, requires = "date_filter")]
    pub end: Option<NaiveDate>,

    /// Write the query to this file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Write the query to the configured default file name
    #[arg(long)]
    pub save: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder();

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/bq-inspect/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Command::Serve { host, port } = &args.command {
            if let Some(host) = host {
                config.web.host = host.clone();
            }
            if let Some(port) = port {
                config.web.port = *port;
            }
        }

        Ok(config)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_file: "bq_inspection_query.sql".to_string(),
            default_term_column: "impression_date".to_string(),
            default_start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default(),
            default_end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap_or_default(),
        }
    }
}
