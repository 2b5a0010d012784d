use crate::core::grade::extract_grade;
use crate::core::presentation::{quality_bucket, GradeTier, QualityBucket, SectionLabels};
use crate::core::sections::SectionParser;
use crate::domain::model::{Grade, Report};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub key: String,
    pub label: String,
    pub content: String,
}

/// Everything the report viewer renders for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub grade: Option<Grade>,
    pub grade_tier: GradeTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityBucket>,
    pub sections: Vec<SectionView>,
}

impl ReportView {
    pub fn from_text(text: &str, parser: &SectionParser, labels: &SectionLabels) -> Self {
        let grade = extract_grade(text);
        let sections = parser
            .parse(text)
            .into_iter()
            .map(|section| SectionView {
                label: labels.label(&section.key),
                key: section.key,
                content: section.content,
            })
            .collect();

        Self {
            report_id: None,
            title: None,
            grade,
            grade_tier: grade.map(|g| g.tier()).unwrap_or(GradeTier::Unknown),
            quality_score: None,
            quality: None,
            sections,
        }
    }

    pub fn from_report(report: &Report, parser: &SectionParser, labels: &SectionLabels) -> Self {
        let mut view = Self::from_text(report.output_text.as_deref().unwrap_or_default(), parser, labels);
        view.report_id = Some(report.id.clone());
        view.title = report.title.clone();
        view.quality_score = report.quality_score;
        view.quality = report.quality_score.map(quality_bucket);
        view
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if let Some(title) = &self.title {
            let _ = writeln!(out, "{}\n", title);
        }
        match self.grade {
            Some(grade) => {
                let _ = writeln!(out, "Grade: {} ({:?})", grade, self.grade_tier);
            }
            None => {
                let _ = writeln!(out, "Grade: not found");
            }
        }
        if let (Some(score), Some(bucket)) = (self.quality_score, self.quality) {
            let _ = writeln!(out, "Quality: {:.0}/100 ({:?})", score, bucket);
        }

        for section in &self.sections {
            let _ = writeln!(out, "\n== {} ==", section.label);
            if !section.content.is_empty() {
                let _ = writeln!(out, "{}", section.content);
            }
        }
        out
    }
}
