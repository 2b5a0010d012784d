use anyhow::Result;
use prospectx_reports::core::ConfigProvider;
use prospectx_reports::domain::model::SubjectKind;
use prospectx_reports::utils::validation::Validate;
use prospectx_reports::{GenerationRequest, PollOptions, ReportError, ReportsConfig, Section};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const FULL_CONFIG: &str = r#"
[api]
base_url = "https://api.prospectx.app"
timeout_seconds = 45

[polling]
interval_ms = 1500
max_consecutive_errors = 20

[sections]
known_labels = ["IQ", "GAP", "STRENGTHS"]
min_heading_len = 5

[sections.display_names]
IQ = "Hockey IQ"

[report_types]
player = ["pro_skater", "goalie"]
team = ["opponent_gameplan"]

[report_types.display_names]
opponent_gameplan = "Opponent Game Plan"
"#;

fn write_config(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_full_config_drives_the_core() -> Result<()> {
    let file = write_config(FULL_CONFIG)?;
    let config = ReportsConfig::from_file(file.path())?;
    config.validate()?;

    assert_eq!(config.request_timeout(), Duration::from_secs(45));
    assert_eq!(
        PollOptions::from_config(&config),
        PollOptions {
            interval: Duration::from_millis(1500),
            max_consecutive_errors: Some(20),
        }
    );

    // min_heading_len = 5 rejects NOTE, the known set still admits IQ.
    let sections = config
        .section_parser()
        .parse("IQ\nProcesses fast.\nNOTE\nsee video\nTHREATS\nNone.");
    assert_eq!(
        sections,
        vec![
            Section::new("IQ", "Processes fast.\nNOTE\nsee video"),
            Section::new("THREATS", "None."),
        ]
    );
    assert_eq!(config.section_labels().label("IQ"), "Hockey IQ");

    let catalog = config.report_type_catalog();
    assert_eq!(catalog.classify("goalie"), Some(SubjectKind::Player));
    assert_eq!(catalog.classify("line_chemistry"), None);
    assert_eq!(catalog.display_name("opponent_gameplan"), "Opponent Game Plan");
    Ok(())
}

#[test]
fn test_request_validation_errors_are_input_errors() {
    let catalog = ReportsConfig::default().report_type_catalog();

    let err = catalog
        .validate_request(&GenerationRequest::for_player("opponent_gameplan", "p-1"))
        .unwrap_err();

    assert!(matches!(err, ReportError::InvalidRequestError { .. }));
    assert!(err.to_string().contains("team"));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = ReportsConfig::from_file("/nonexistent/prospectx.toml").unwrap_err();
    assert!(matches!(err, ReportError::IoError(_)));
}

#[test]
fn test_empty_file_uses_defaults() -> Result<()> {
    let file = write_config("")?;
    let config = ReportsConfig::from_file(file.path())?;

    assert_eq!(config.poll_interval(), Duration::from_secs(2));
    assert!(config.section_parser().is_known("EXECUTIVE_SUMMARY"));
    assert!(config.validate().is_ok());
    Ok(())
}
