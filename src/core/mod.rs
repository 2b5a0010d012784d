pub mod generation;
pub mod grade;
pub mod presentation;
pub mod sections;
pub mod view;

pub use crate::domain::model::{
    GenerationJob, GenerationRequest, Grade, JobStatus, JobStatusResponse, Report, ReportSubject,
    Section, SubjectKind,
};
pub use crate::domain::ports::{ConfigProvider, ReportService, SubmitError};
pub use crate::utils::error::Result;
