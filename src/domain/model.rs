use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named slice of generated report text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub content: String,
}

impl Section {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }
}

/// Letter grade assigned in a scouting report. `NotRated` renders as `NR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    D,
    NotRated,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::NotRated => "NR",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    /// Case-insensitive. `D+` and `D-` fold into `D`, the only D grade on the scale.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Ok(Grade::APlus),
            "A" => Ok(Grade::A),
            "A-" => Ok(Grade::AMinus),
            "B+" => Ok(Grade::BPlus),
            "B" => Ok(Grade::B),
            "B-" => Ok(Grade::BMinus),
            "C+" => Ok(Grade::CPlus),
            "C" => Ok(Grade::C),
            "C-" => Ok(Grade::CMinus),
            "D" | "D+" | "D-" => Ok(Grade::D),
            "NR" => Ok(Grade::NotRated),
            other => Err(format!("unknown grade '{}'", other)),
        }
    }
}

impl Serialize for Grade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which kind of subject a report type is written about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Player,
    Team,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Player => f.write_str("player"),
            SubjectKind::Team => f.write_str("team"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSubject {
    Player(String),
    Team(String),
}

impl ReportSubject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            ReportSubject::Player(_) => SubjectKind::Player,
            ReportSubject::Team(_) => SubjectKind::Team,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub report_type: String,
    pub subject: ReportSubject,
    pub data_scope: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn for_player(report_type: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            subject: ReportSubject::Player(player_id.into()),
            data_scope: None,
        }
    }

    pub fn for_team(report_type: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            subject: ReportSubject::Team(team_name.into()),
            data_scope: None,
        }
    }

    pub fn with_scope(mut self, data_scope: serde_json::Value) -> Self {
        self.data_scope = Some(data_scope);
        self
    }

    /// Wire body for `POST /reports/generate`.
    pub fn to_body(&self) -> GenerateBody<'_> {
        let (player_id, team_name) = match &self.subject {
            ReportSubject::Player(id) => (Some(id.as_str()), None),
            ReportSubject::Team(name) => (None, Some(name.as_str())),
        };
        GenerateBody {
            report_type: &self.report_type,
            player_id,
            team_name,
            data_scope: self.data_scope.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateBody<'a> {
    pub report_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_scope: Option<&'a serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// Server-side generation job as returned by the submission call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub report_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body of `GET /reports/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Report resource from `GET /reports/{id}`. Only the fields this crate reads are modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_parsing_is_case_insensitive() {
        assert_eq!("b+".parse::<Grade>(), Ok(Grade::BPlus));
        assert_eq!("nr".parse::<Grade>(), Ok(Grade::NotRated));
        assert_eq!("D-".parse::<Grade>(), Ok(Grade::D));
        assert!("E".parse::<Grade>().is_err());
        assert_eq!(Grade::NotRated.to_string(), "NR");
    }

    #[test]
    fn test_generate_body_carries_one_subject() {
        let request = GenerationRequest::for_team("opponent_gameplan", "Chatham Maroons")
            .with_scope(serde_json::json!({"last_n_games": 10}));
        let body = serde_json::to_value(request.to_body()).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "report_type": "opponent_gameplan",
                "team_name": "Chatham Maroons",
                "data_scope": {"last_n_games": 10}
            })
        );
    }

    #[test]
    fn test_status_payload_without_error_message() {
        let parsed: JobStatusResponse = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(parsed.status, JobStatus::Processing);
        assert!(parsed.error_message.is_none());
        assert!(!parsed.status.is_terminal());
    }

    #[test]
    fn test_report_resource_with_timestamp() {
        let report: Report = serde_json::from_value(serde_json::json!({
            "id": "r-1",
            "status": "complete",
            "output_text": "EXECUTIVE_SUMMARY\nSolid two-way center.",
            "quality_score": 84.5,
            "created_at": "2026-02-11T18:30:00Z"
        }))
        .unwrap();

        assert_eq!(report.quality_score, Some(84.5));
        assert!(report.created_at.is_some());
        assert!(report.title.is_none());
    }
}
