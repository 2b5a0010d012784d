pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpReportService;
pub use config::{ReportTypeCatalog, ReportsConfig};
pub use core::generation::{
    DisplayState, GenerationFailure, GenerationState, PollOptions, ReportGenerator,
};
pub use core::grade::extract_grade;
pub use core::presentation::{grade_color_bucket, quality_bucket, GradeTier, QualityBucket};
pub use core::sections::{parse_sections, SectionParser};
pub use core::view::ReportView;
pub use domain::model::{GenerationRequest, Grade, Section};
pub use utils::error::{ReportError, Result};
