//! Display buckets for grades, quality scores and section names.

use crate::domain::model::Grade;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeTier {
    ATier,
    BTier,
    CTier,
    DTier,
    Unknown,
}

impl GradeTier {
    pub fn color(&self) -> &'static str {
        match self {
            GradeTier::ATier => "#16a34a",
            GradeTier::BTier => "#0d9488",
            GradeTier::CTier => "#ea580c",
            GradeTier::DTier => "#dc2626",
            GradeTier::Unknown => "#6b7280",
        }
    }
}

/// Buckets a grade string by its first character.
pub fn grade_color_bucket(grade: &str) -> GradeTier {
    match grade.chars().next() {
        Some('A') => GradeTier::ATier,
        Some('B') => GradeTier::BTier,
        Some('C') => GradeTier::CTier,
        Some('D') => GradeTier::DTier,
        _ => GradeTier::Unknown,
    }
}

impl Grade {
    pub fn tier(&self) -> GradeTier {
        grade_color_bucket(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBucket {
    High,
    Medium,
    Low,
}

impl QualityBucket {
    pub fn color(&self) -> &'static str {
        match self {
            QualityBucket::High => "#16a34a",
            QualityBucket::Medium => "#ca8a04",
            QualityBucket::Low => "#dc2626",
        }
    }
}

/// Scores are 0-100. NaN lands in `Low`.
pub fn quality_bucket(score: f64) -> QualityBucket {
    if score >= 80.0 {
        QualityBucket::High
    } else if score >= 60.0 {
        QualityBucket::Medium
    } else {
        QualityBucket::Low
    }
}

/// Display names for section keys, falling back to a title-cased key.
#[derive(Debug, Clone, Default)]
pub struct SectionLabels {
    names: HashMap<String, String>,
}

impl SectionLabels {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn label(&self, key: &str) -> String {
        self.names
            .get(key)
            .cloned()
            .unwrap_or_else(|| humanize_key(key))
    }
}

/// `DEVELOPMENT_AREAS` -> `Development Areas`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
