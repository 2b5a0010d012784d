use prospectx_reports::core::sections::FALLBACK_SECTION_KEY;
use prospectx_reports::{parse_sections, Section, SectionParser};

const PRO_SKATER_REPORT: &str = "\
Prepared for the Erie Otters scouting staff.

EXECUTIVE_SUMMARY
Undersized but relentless winger with elite edges.
Overall Grade: B+

KEY_NUMBERS:
- 31 GP, 14 G, 22 A
- 58% CF at 5v5

## STRENGTHS
Skating. Puck protection below the dots.

DEVELOPMENT_AREAS —
Defensive-zone reads.

PP
Flank on PP1, one-timer threat.

BOTTOM_LINE
Worth a mid-round pick.
";

#[test]
fn test_full_report_is_split_in_source_order() {
    let sections = parse_sections(PRO_SKATER_REPORT);
    let keys: Vec<&str> = sections.iter().map(|s| s.key.as_str()).collect();

    assert_eq!(
        keys,
        vec![
            "EXECUTIVE_SUMMARY",
            "KEY_NUMBERS",
            "STRENGTHS",
            "DEVELOPMENT_AREAS",
            "PP",
            "BOTTOM_LINE"
        ]
    );
    assert_eq!(
        sections[0].content,
        "Undersized but relentless winger with elite edges.\nOverall Grade: B+"
    );
    assert_eq!(sections[1].content, "- 31 GP, 14 G, 22 A\n- 58% CF at 5v5");
    assert!(sections.iter().all(|s| !s.content.starts_with('\n') && !s.content.ends_with('\n')));
}

#[test]
fn test_heading_free_text_falls_back_to_report_section() {
    let inputs = [
        "Just one line.",
        "\n\nTwo paragraphs.\n\nOf plain notes with an OHL mention.\n\n",
        "   indented text   ",
        "Lowercase heading\nstrengths\nnot a heading",
    ];

    for input in inputs {
        let sections = parse_sections(input);
        assert_eq!(
            sections,
            vec![Section::new(FALLBACK_SECTION_KEY, input.trim())],
            "input: {:?}",
            input
        );
    }
}

#[test]
fn test_empty_input_yields_no_sections() {
    assert!(parse_sections("").is_empty());
    assert!(parse_sections("\n\n   \n").is_empty());
}

#[test]
fn test_sections_reconstruct_the_source() {
    let source = "SCOUTING_NOTES\nFirst line.\n\nSecond line.\nPROJECTION\nNHL depth forward.\nTEAM_FIT\nFits a forecheck-heavy system.";
    let sections = parse_sections(source);
    assert_eq!(sections.len(), 3);

    let rebuilt = sections
        .iter()
        .map(|s| format!("{}\n{}", s.key, s.content))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(rebuilt, source);
}

#[test]
fn test_custom_headings_are_accepted_when_long_enough() {
    let sections = parse_sections("MOTOR\nNever stops.\nIQ\nReads plays early.\nHANDS\nSoft.");

    // IQ is too short and not a recognized label, so it stays in MOTOR's body.
    assert_eq!(
        sections,
        vec![
            Section::new("MOTOR", "Never stops.\nIQ\nReads plays early."),
            Section::new("HANDS", "Soft."),
        ]
    );
}

#[test]
fn test_externally_supplied_labels() {
    let parser = SectionParser::new(["IQ", "GAP"]);
    let sections = parser.parse("IQ\nReads plays early.\nGAP:\nTight gaps off the rush.");

    assert_eq!(
        sections,
        vec![
            Section::new("IQ", "Reads plays early."),
            Section::new("GAP", "Tight gaps off the rush."),
        ]
    );
}

#[test]
fn test_malformed_input_never_panics() {
    let odd_inputs = [
        "####",
        "# \n## \n### :",
        "—\n-\n:",
        "A\u{0301}BCD\nß\n\u{1F3D2} HOCKEY",
        "\r\n\r\n",
        "STRENGTHS\u{0000}",
    ];
    for input in odd_inputs {
        let sections = parse_sections(input);
        if !input.trim().is_empty() {
            assert!(!sections.is_empty(), "input: {:?}", input);
        }
    }
}
