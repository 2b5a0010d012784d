use crate::config::toml_config::ReportsConfig;
use crate::domain::model::GenerationRequest;
use crate::utils::error::{ReportError, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "prospectx")]
#[command(about = "Parse ProspectX scouting reports and drive report generation")]
pub struct CliConfig {
    /// Path to a TOML configuration file (defaults to ./prospectx.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long, env = "PROSPECTX_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the ProspectX API
    #[arg(long, env = "PROSPECTX_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Override polling.interval_ms
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Override polling.max_consecutive_errors
    #[arg(long, global = true)]
    pub max_poll_errors: Option<u32>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split report text into sections and extract its grade
    Parse {
        /// Report text file; reads stdin when omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Generate a report and wait until it completes or fails
    Generate(GenerateArgs),

    /// Show the generation status of a report
    Status { report_id: String },

    /// Fetch a report and print its sections
    Show {
        report_id: String,

        #[arg(long)]
        json: bool,
    },

    /// List the configured player and team report types
    ReportTypes,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub report_type: String,

    #[arg(long, conflicts_with = "team_name", required_unless_present = "team_name")]
    pub player_id: Option<String>,

    #[arg(long)]
    pub team_name: Option<String>,

    /// Extra generation options as a JSON object, e.g. '{"last_n_games": 10}'
    #[arg(long, value_parser = parse_scope)]
    pub scope: Option<serde_json::Value>,

    /// Print the finished report as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn to_request(&self) -> Result<GenerationRequest> {
        let request = match (&self.player_id, &self.team_name) {
            (Some(player_id), None) => GenerationRequest::for_player(&self.report_type, player_id),
            (None, Some(team_name)) => GenerationRequest::for_team(&self.report_type, team_name),
            _ => {
                return Err(ReportError::InvalidRequestError {
                    message: "Pass exactly one of --player-id or --team-name".to_string(),
                })
            }
        };
        Ok(match &self.scope {
            Some(scope) => request.with_scope(scope.clone()),
            None => request,
        })
    }
}

fn parse_scope(raw: &str) -> std::result::Result<serde_json::Value, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("scope must be a JSON object".to_string())
    }
}

impl CliConfig {
    /// Loads the file configuration and applies command-line overrides.
    pub fn resolve_config(&self) -> Result<ReportsConfig> {
        let mut config = ReportsConfig::load(self.config.as_deref())?;

        if let Some(api_url) = &self.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.polling.interval_ms = interval;
        }
        if let Some(max) = self.max_poll_errors {
            config.polling.max_consecutive_errors = Some(max);
        }

        tracing::debug!(base_url = %config.api.base_url, "configuration resolved");
        Ok(config)
    }
}
