//! Best-effort letter-grade detection in generated report text.

use crate::domain::model::Grade;
use once_cell::sync::Lazy;
use regex::Regex;

// The token may not run into further letters, digits or signs, so
// "Rating: Average" is not read as an A.
const TOKEN: &str = r"([A-D][+-]?|NR)(?:[^A-Za-z0-9+\-]|$)";

static GRADE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Grade: B+ / Overall_Grade = a- / Prospect Grade: **C**
        format!(
            r"(?i)(?:overall[_ ]?grade|grade|prospect[_ ]?grade|rating)\s*[:=]\s*[*_]*\s*{}",
            TOKEN
        ),
        // **Overall Grade**: B
        format!(
            r"(?i)\*\*\s*(?:overall[_ ]?|prospect[_ ]?)?(?:grade|rating)\s*\*\*\s*[:=]\s*[*_]*\s*{}",
            TOKEN
        ),
        // Grade B+
        format!(r"\bGrade\s+{}", TOKEN),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("grade patterns are valid regexes"))
    .collect()
});

/// Returns the first grade found, trying each phrasing in priority order.
pub fn extract_grade(text: &str) -> Option<Grade> {
    let token = GRADE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))?
        .as_str();

    token.parse().ok()
}
