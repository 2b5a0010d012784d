//! Splits generated report text into ordered, named sections.
//!
//! A heading is a line holding a single upper-case token such as
//! `STRENGTHS`, optionally written as a markdown heading (`## STRENGTHS`)
//! or followed by a colon or dash (`BOTTOM_LINE:`). Tokens shorter than the
//! minimum heading length only count when they are recognized labels, so
//! abbreviations like `OHL` on their own line stay in the body.

use crate::domain::model::Section;
use std::collections::HashSet;

pub const FALLBACK_SECTION_KEY: &str = "REPORT";
pub const DEFAULT_MIN_HEADING_LEN: usize = 4;

/// Section labels the report generator emits, with their display names.
pub const DEFAULT_SECTION_LABELS: &[(&str, &str)] = &[
    ("EXECUTIVE_SUMMARY", "Executive Summary"),
    ("KEY_NUMBERS", "Key Numbers"),
    ("STRENGTHS", "Strengths"),
    ("DEVELOPMENT_AREAS", "Development Areas"),
    ("DEVELOPMENT_PRIORITIES", "Development Priorities"),
    ("ADVANCEMENT_TRIGGERS", "Advancement Triggers"),
    ("ROLE_FIT", "Role Fit"),
    ("OPPONENT_CONTEXT", "Opponent Context"),
    ("NOTABLE_PERFORMANCES", "Notable Performances"),
    ("PROJECTION", "Projection"),
    ("SYSTEM_FIT", "System Fit"),
    ("TACTICAL_ANALYSIS", "Tactical Analysis"),
    ("LINE_DEPLOYMENT", "Line Deployment"),
    ("SPECIAL_TEAMS", "Special Teams"),
    ("PP", "Power Play"),
    ("PK", "Penalty Kill"),
    ("GAME_PLAN", "Game Plan"),
    ("KEYS_TO_WIN", "Keys to Win"),
    ("MENTAL_GAME", "Mental Game"),
    ("BOTTOM_LINE", "Bottom Line"),
];

#[derive(Debug, Clone)]
pub struct SectionParser {
    known: HashSet<String>,
    min_heading_len: usize,
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION_LABELS.iter().map(|(key, _)| *key))
    }
}

impl SectionParser {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
            min_heading_len: DEFAULT_MIN_HEADING_LEN,
        }
    }

    pub fn with_min_heading_len(mut self, min_heading_len: usize) -> Self {
        self.min_heading_len = min_heading_len;
        self
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.known.contains(key)
    }

    /// Returns the section key if `line` is an accepted heading.
    pub fn heading_key<'a>(&self, line: &'a str) -> Option<&'a str> {
        let token = heading_token(line)?;
        if self.is_known(token) || token.len() >= self.min_heading_len {
            Some(token)
        } else {
            None
        }
    }

    pub fn parse(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut open: Option<(&str, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(key) = self.heading_key(line) {
                if let Some((prev_key, body)) = open.take() {
                    sections.push(close_section(prev_key, &body));
                }
                open = Some((key, Vec::new()));
            } else if let Some((_, body)) = open.as_mut() {
                body.push(line);
            }
            // Text ahead of the first heading is dropped.
        }

        if let Some((key, body)) = open {
            sections.push(close_section(key, &body));
        }

        if sections.is_empty() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                sections.push(Section::new(FALLBACK_SECTION_KEY, trimmed));
            }
        }

        tracing::trace!(count = sections.len(), "parsed report sections");
        sections
    }
}

/// Parses with the built-in label set.
pub fn parse_sections(text: &str) -> Vec<Section> {
    SectionParser::default().parse(text)
}

fn close_section(key: &str, body: &[&str]) -> Section {
    Section::new(key, body.join("\n").trim())
}

/// Extracts the heading-shaped token of a line, ignoring the known-label rule.
fn heading_token(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let without_hashes = trimmed.trim_start_matches('#');
    if trimmed.len() - without_hashes.len() > 3 {
        return None;
    }

    let token = without_hashes
        .trim_start()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '—' | '-'));

    let mut chars = token.chars();
    let well_formed = matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    well_formed.then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_token_shapes() {
        assert_eq!(heading_token("STRENGTHS"), Some("STRENGTHS"));
        assert_eq!(heading_token("  ## BOTTOM_LINE:  "), Some("BOTTOM_LINE"));
        assert_eq!(heading_token("#KEY_NUMBERS —"), Some("KEY_NUMBERS"));
        assert_eq!(heading_token("ROLE_FIT -"), Some("ROLE_FIT"));
        assert_eq!(heading_token("TOP6"), Some("TOP6"));
        assert_eq!(heading_token("#### STRENGTHS"), None);
        assert_eq!(heading_token("Strengths"), None);
        assert_eq!(heading_token("STRENGTHS and more"), None);
        assert_eq!(heading_token("9_LIVES"), None);
        assert_eq!(heading_token(""), None);
    }

    #[test]
    fn test_short_tokens_need_known_label() {
        let parser = SectionParser::default();
        assert_eq!(parser.heading_key("PP:"), Some("PP"));
        assert_eq!(parser.heading_key("OHL"), None);
        assert_eq!(parser.heading_key("NOTES"), Some("NOTES"));
    }

    #[test]
    fn test_threshold_is_tunable() {
        let parser = SectionParser::new(Vec::<String>::new()).with_min_heading_len(6);
        assert_eq!(parser.heading_key("NOTES"), None);
        assert_eq!(parser.heading_key("SUMMARY"), Some("SUMMARY"));
    }

    #[test]
    fn test_parse_splits_in_order() {
        let text = "EXECUTIVE_SUMMARY\nHigh-motor winger.\n\nSTRENGTHS:\n- Skating\n- Compete\n\n## BOTTOM_LINE\nDraft in round two.\n";
        let sections = parse_sections(text);

        assert_eq!(
            sections,
            vec![
                Section::new("EXECUTIVE_SUMMARY", "High-motor winger."),
                Section::new("STRENGTHS", "- Skating\n- Compete"),
                Section::new("BOTTOM_LINE", "Draft in round two."),
            ]
        );
    }

    #[test]
    fn test_intro_before_first_heading_is_dropped() {
        let sections = parse_sections("Prepared for the GM.\n\nSTRENGTHS\nHands.");
        assert_eq!(sections, vec![Section::new("STRENGTHS", "Hands.")]);
    }

    #[test]
    fn test_body_keeps_inner_blank_lines_and_short_caps() {
        let sections = parse_sections("ROLE_FIT\nPlayed in the OHL.\n\nOHL\n\nProjects as a 3C.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "Played in the OHL.\n\nOHL\n\nProjects as a 3C.");
    }

    #[test]
    fn test_heading_without_body_yields_empty_section() {
        let sections = parse_sections("STRENGTHS\nPROJECTION\nTop-four defenseman.");
        assert_eq!(sections[0], Section::new("STRENGTHS", ""));
        assert_eq!(sections[1], Section::new("PROJECTION", "Top-four defenseman."));
    }

    #[test]
    fn test_fallback_and_empty_input() {
        assert!(parse_sections("").is_empty());
        assert!(parse_sections("  \n\t\n").is_empty());
        assert_eq!(
            parse_sections("\n  Just a paragraph of notes.  \n"),
            vec![Section::new(FALLBACK_SECTION_KEY, "Just a paragraph of notes.")]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let sections = parse_sections("STRENGTHS\r\nVision\r\nPROJECTION\r\nMiddle six");
        assert_eq!(sections[0].content, "Vision");
        assert_eq!(sections[1].content, "Middle six");
    }
}
