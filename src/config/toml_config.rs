use crate::core::presentation::{humanize_key, SectionLabels};
use crate::core::sections::{SectionParser, DEFAULT_MIN_HEADING_LEN, DEFAULT_SECTION_LABELS};
use crate::domain::model::{GenerationRequest, ReportSubject, SubjectKind};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "prospectx.toml";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

const DEFAULT_PLAYER_REPORT_TYPES: &[(&str, &str)] = &[
    ("pro_skater", "Pro/Amateur Skater Report"),
    ("unified_prospect", "Unified Prospect Report"),
    ("goalie", "Goalie Report"),
    ("development_roadmap", "Development Roadmap"),
    ("season_progress", "Season Progress Report"),
    ("trade_target", "Trade Target Report"),
    ("draft_comparative", "Draft Comparative Report"),
    ("agent_pack", "Agent Pack"),
    ("family_card", "Family Card"),
];

const DEFAULT_TEAM_REPORT_TYPES: &[(&str, &str)] = &[
    ("game_decision", "Game Decision Report"),
    ("season_intelligence", "Season Intelligence Report"),
    ("operations", "Operations Report"),
    ("team_identity", "Team Identity Report"),
    ("opponent_gameplan", "Opponent Game Plan"),
    ("line_chemistry", "Line Chemistry Report"),
    ("st_optimization", "Special Teams Optimization"),
    ("playoff_series", "Playoff Series Prep"),
    ("goalie_tandem", "Goalie Tandem Analysis"),
    ("practice_plan", "Practice Plan"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub sections: SectionsConfig,
    pub report_types: ReportTypesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Unset means retry until the job settles.
    pub max_consecutive_errors: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_consecutive_errors: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    pub known_labels: Vec<String>,
    pub min_heading_len: usize,
    pub display_names: HashMap<String, String>,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            known_labels: DEFAULT_SECTION_LABELS
                .iter()
                .map(|(key, _)| key.to_string())
                .collect(),
            min_heading_len: DEFAULT_MIN_HEADING_LEN,
            display_names: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportTypesConfig {
    pub player: Vec<String>,
    pub team: Vec<String>,
    pub display_names: HashMap<String, String>,
}

impl Default for ReportTypesConfig {
    fn default() -> Self {
        Self {
            player: DEFAULT_PLAYER_REPORT_TYPES.iter().map(|(t, _)| t.to_string()).collect(),
            team: DEFAULT_TEAM_REPORT_TYPES.iter().map(|(t, _)| t.to_string()).collect(),
            display_names: HashMap::new(),
        }
    }
}

impl ReportsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Explicit path, else `prospectx.toml` in the working directory, else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Replaces `${VAR}` with the variable's value; unset variables become empty.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| {
                    tracing::debug!("environment variable {} is not set", var_name);
                    String::new()
                })
            })
            .into_owned()
    }

    pub fn section_parser(&self) -> SectionParser {
        SectionParser::new(self.sections.known_labels.iter().cloned())
            .with_min_heading_len(self.sections.min_heading_len)
    }

    pub fn section_labels(&self) -> SectionLabels {
        let mut names: HashMap<String, String> = DEFAULT_SECTION_LABELS
            .iter()
            .map(|(key, name)| (key.to_string(), name.to_string()))
            .collect();
        names.extend(self.sections.display_names.clone());
        SectionLabels::new(names)
    }

    pub fn report_type_catalog(&self) -> ReportTypeCatalog {
        let mut display_names: HashMap<String, String> = DEFAULT_PLAYER_REPORT_TYPES
            .iter()
            .chain(DEFAULT_TEAM_REPORT_TYPES)
            .map(|(t, name)| (t.to_string(), name.to_string()))
            .collect();
        display_names.extend(self.report_types.display_names.clone());

        ReportTypeCatalog {
            player: self.report_types.player.iter().cloned().collect(),
            team: self.report_types.team.iter().cloned().collect(),
            display_names,
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validation::validate_positive_number("polling.interval_ms", self.polling.interval_ms, 1)?;

        if let Some(max) = self.polling.max_consecutive_errors {
            validation::validate_positive_number("polling.max_consecutive_errors", max.into(), 1)?;
        }

        validation::validate_range("sections.min_heading_len", self.sections.min_heading_len, 1, 64)?;
        for label in &self.sections.known_labels {
            validation::validate_section_key("sections.known_labels", label)?;
        }
        for key in self.sections.display_names.keys() {
            validation::validate_section_key("sections.display_names", key)?;
        }

        for report_type in self.report_types.player.iter().chain(&self.report_types.team) {
            validation::validate_non_empty_string("report_types", report_type)?;
        }
        let player: HashSet<&String> = self.report_types.player.iter().collect();
        if let Some(both) = self.report_types.team.iter().find(|t| player.contains(t)) {
            return Err(ReportError::ConfigValidationError {
                field: "report_types".to_string(),
                message: format!("'{}' is listed as both a player and a team report type", both),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for ReportsConfig {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn api_token(&self) -> Option<&str> {
        self.api.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    fn max_consecutive_poll_errors(&self) -> Option<u32> {
        self.polling.max_consecutive_errors
    }
}

impl Validate for ReportsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Classifies report types as player or team reports.
#[derive(Debug, Clone, Default)]
pub struct ReportTypeCatalog {
    player: HashSet<String>,
    team: HashSet<String>,
    display_names: HashMap<String, String>,
}

impl ReportTypeCatalog {
    pub fn classify(&self, report_type: &str) -> Option<SubjectKind> {
        if self.player.contains(report_type) {
            Some(SubjectKind::Player)
        } else if self.team.contains(report_type) {
            Some(SubjectKind::Team)
        } else {
            None
        }
    }

    pub fn display_name(&self, report_type: &str) -> String {
        self.display_names
            .get(report_type)
            .cloned()
            .unwrap_or_else(|| humanize_key(report_type))
    }

    /// Sorted report types of one kind.
    pub fn report_types(&self, kind: SubjectKind) -> Vec<&str> {
        let set = match kind {
            SubjectKind::Player => &self.player,
            SubjectKind::Team => &self.team,
        };
        let mut types: Vec<&str> = set.iter().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// A request needs a known report type and exactly the subject that type is written about.
    pub fn validate_request(&self, request: &GenerationRequest) -> Result<()> {
        if request.report_type.trim().is_empty() {
            return Err(invalid_request("Select a report type".to_string()));
        }

        let expected = self.classify(&request.report_type).ok_or_else(|| {
            invalid_request(format!("Unknown report type '{}'", request.report_type))
        })?;

        let subject = match &request.subject {
            ReportSubject::Player(id) | ReportSubject::Team(id) => id,
        };
        if subject.trim().is_empty() {
            return Err(invalid_request(format!(
                "A {} is required for {}",
                expected,
                self.display_name(&request.report_type)
            )));
        }

        if request.subject.kind() != expected {
            return Err(invalid_request(format!(
                "{} is a {} report; pass a {} instead of a {}",
                self.display_name(&request.report_type),
                expected,
                expected,
                request.subject.kind()
            )));
        }

        if let Some(scope) = &request.data_scope {
            if !scope.is_object() {
                return Err(invalid_request("data_scope must be a JSON object".to_string()));
            }
        }

        Ok(())
    }
}

fn invalid_request(message: String) -> ReportError {
    ReportError::InvalidRequestError { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReportsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_consecutive_poll_errors(), None);
        assert!(config.api_token().is_none());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let toml_content = r#"
[api]
base_url = "https://api.prospectx.app"

[polling]
max_consecutive_errors = 15

[sections]
known_labels = ["PP", "PK", "STRENGTHS"]

[sections.display_names]
PP = "Power Play Units"
"#;

        let config = ReportsConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_base_url(), "https://api.prospectx.app");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.max_consecutive_poll_errors(), Some(15));
        assert!(config.section_parser().is_known("PK"));
        assert!(!config.section_parser().is_known("BOTTOM_LINE"));
        assert_eq!(config.section_labels().label("PP"), "Power Play Units");
        assert_eq!(config.section_labels().label("BOTTOM_LINE"), "Bottom Line");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PROSPECTX_TEST_TOKEN", "secret-token");

        let toml_content = r#"
[api]
token = "${PROSPECTX_TEST_TOKEN}"
"#;
        let config = ReportsConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_token(), Some("secret-token"));

        std::env::remove_var("PROSPECTX_TEST_TOKEN");
    }

    #[test]
    fn test_unset_env_var_means_no_token() {
        let toml_content = r#"
[api]
token = "${PROSPECTX_TEST_UNSET_VARIABLE}"
"#;
        let config = ReportsConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_token(), None);
    }

    #[test]
    fn test_config_validation() {
        let bad_url = ReportsConfig::from_toml_str("[api]\nbase_url = \"invalid-url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let bad_label = ReportsConfig::from_toml_str("[sections]\nknown_labels = [\"Strengths\"]\n").unwrap();
        assert!(bad_label.validate().is_err());

        let zero_interval = ReportsConfig::from_toml_str("[polling]\ninterval_ms = 0\n").unwrap();
        assert!(zero_interval.validate().is_err());

        let overlap = ReportsConfig::from_toml_str(
            "[report_types]\nplayer = [\"goalie\"]\nteam = [\"goalie\"]\n",
        )
        .unwrap();
        assert!(matches!(
            overlap.validate(),
            Err(ReportError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ReportsConfig::from_toml_str("[api\nbase_url = 1").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[polling]\ninterval_ms = 500\n")
            .unwrap();

        let config = ReportsConfig::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_catalog_classifies_and_validates() {
        let catalog = ReportsConfig::default().report_type_catalog();

        assert_eq!(catalog.classify("pro_skater"), Some(SubjectKind::Player));
        assert_eq!(catalog.classify("opponent_gameplan"), Some(SubjectKind::Team));
        assert_eq!(catalog.classify("horoscope"), None);
        assert_eq!(catalog.display_name("goalie"), "Goalie Report");
        assert_eq!(catalog.display_name("bench_notes"), "Bench Notes");

        assert!(catalog
            .validate_request(&GenerationRequest::for_player("pro_skater", "p-1"))
            .is_ok());
        assert!(catalog
            .validate_request(&GenerationRequest::for_team("pro_skater", "Sarnia Sting"))
            .is_err());
        assert!(catalog
            .validate_request(&GenerationRequest::for_team("opponent_gameplan", "  "))
            .is_err());
        assert!(catalog
            .validate_request(&GenerationRequest::for_player("", "p-1"))
            .is_err());
        assert!(catalog
            .validate_request(
                &GenerationRequest::for_player("goalie", "p-1").with_scope(serde_json::json!([1, 2]))
            )
            .is_err());
    }

    #[test]
    fn test_catalog_lists_types_sorted() {
        let config = ReportsConfig::from_toml_str(
            "[report_types]\nplayer = [\"b_type\", \"a_type\"]\nteam = []\n",
        )
        .unwrap();
        let catalog = config.report_type_catalog();

        assert_eq!(catalog.report_types(SubjectKind::Player), vec!["a_type", "b_type"]);
        assert!(catalog.report_types(SubjectKind::Team).is_empty());
    }
}
