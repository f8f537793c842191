//! Structural section detection for semi-structured abstracts

use regex::Regex;
use std::sync::OnceLock;

pub const BACKGROUND: &str = "Background";
pub const OBJECTIVE: &str = "Objective";
pub const METHODS: &str = "Methods";
pub const RESULTS: &str = "Results";
pub const CONCLUSIONS: &str = "Conclusions";
/// Name used when no structural heading is found
pub const UNSTRUCTURED: &str = "Unstructured";

/// Heading variants (lowercase, single-spaced) and their canonical section
const SECTION_SYNONYMS: &[(&str, &str)] = &[
    ("background", BACKGROUND),
    ("background and aims", BACKGROUND),
    ("background and objectives", BACKGROUND),
    ("background and purpose", BACKGROUND),
    ("introduction", BACKGROUND),
    ("context", BACKGROUND),
    ("rationale", BACKGROUND),
    ("importance", BACKGROUND),
    ("objective", OBJECTIVE),
    ("objectives", OBJECTIVE),
    ("aim", OBJECTIVE),
    ("aims", OBJECTIVE),
    ("aims and objectives", OBJECTIVE),
    ("purpose", OBJECTIVE),
    ("goal", OBJECTIVE),
    ("goals", OBJECTIVE),
    ("study objective", OBJECTIVE),
    ("methods", METHODS),
    ("method", METHODS),
    ("methodology", METHODS),
    ("materials and methods", METHODS),
    ("methods and materials", METHODS),
    ("patients and methods", METHODS),
    ("subjects and methods", METHODS),
    ("design", METHODS),
    ("study design", METHODS),
    ("design, setting, and participants", METHODS),
    ("design, setting and participants", METHODS),
    ("setting", METHODS),
    ("settings", METHODS),
    ("participants", METHODS),
    ("patients", METHODS),
    ("interventions", METHODS),
    ("intervention", METHODS),
    ("measurements", METHODS),
    ("main outcome measures", METHODS),
    ("main outcomes and measures", METHODS),
    ("data sources", METHODS),
    ("study selection", METHODS),
    ("data extraction", METHODS),
    ("results", RESULTS),
    ("result", RESULTS),
    ("main results", RESULTS),
    ("findings", RESULTS),
    ("conclusions", CONCLUSIONS),
    ("conclusion", CONCLUSIONS),
    ("conclusions and relevance", CONCLUSIONS),
    ("interpretation", CONCLUSIONS),
    ("implications", CONCLUSIONS),
    ("discussion", CONCLUSIONS),
];

/// A detected region of an abstract with its heading stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub content: String,
}

impl Section {
    pub fn new(name: &'static str, content: impl Into<String>) -> Self {
        Self {
            name,
            content: content.into(),
        }
    }

    pub fn is_unstructured(&self) -> bool {
        self.name == UNSTRUCTURED
    }
}

/// Map a heading to its canonical section name
///
/// Case-insensitive, tolerant of surrounding blanks and a trailing colon.
pub fn canonical_section(heading: &str) -> Option<&'static str> {
    let key = heading
        .trim()
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    SECTION_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, canonical)| *canonical)
}

fn heading_regex() -> Option<&'static Regex> {
    static HEADING_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    HEADING_REGEX
        .get_or_init(|| {
            let mut synonyms: Vec<&str> = SECTION_SYNONYMS.iter().map(|(s, _)| *s).collect();
            // Longest first so "materials and methods" wins over "methods"
            synonyms.sort_by_key(|s| std::cmp::Reverse(s.len()));
            let alternation = synonyms
                .iter()
                .map(|s| regex::escape(s).replace(' ', r"[ \t]+"))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"(?i)({alternation})[ \t]*(:|\n|\z)")).ok()
        })
        .as_ref()
}

/// A heading occurrence: canonical name and byte span of the heading token
struct Heading {
    name: &'static str,
    start: usize,
    end: usize,
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(|c: char| matches!(c, '.' | '!' | '?'))
}

/// Whether the heading spanning `start..end` sits where a heading can
///
/// Colon headings may open the text, a line, or follow sentence-final
/// punctuation. Bare headings must sit alone on their own line, after a
/// finished sentence or a blank line and before a line that opens a new
/// sentence, so a hard-wrapped word like "Patients" stays in its sentence.
fn is_heading_position(text: &str, start: usize, end: usize, has_colon: bool) -> bool {
    let before = &text[..start];
    let line_start = before.is_empty() || before.ends_with('\n');
    if has_colon {
        return line_start || (before.ends_with(char::is_whitespace) && ends_sentence(before));
    }
    if !line_start {
        return false;
    }

    let after_sentence = before.trim().is_empty() || before.ends_with("\n\n") || ends_sentence(before);
    let opens_line = text[end..]
        .trim_start_matches([' ', '\t'])
        .chars()
        .next()
        .is_none_or(|c| c.is_uppercase() || c.is_ascii_digit() || matches!(c, '(' | '[' | '"'));
    after_sentence && opens_line
}

fn find_headings(text: &str) -> Vec<Heading> {
    let Some(re) = heading_regex() else {
        return Vec::new();
    };

    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let token = caps.get(1)?;
            let has_colon = caps.get(2).is_some_and(|m| m.as_str() == ":");
            if !is_heading_position(text, whole.start(), whole.end(), has_colon) {
                return None;
            }
            Some(Heading {
                name: canonical_section(token.as_str())?,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Split abstract text into named sections
///
/// Content between two headings belongs to the first. Text preceding the
/// first heading is kept as a leading [`UNSTRUCTURED`] section, sections
/// whose content is empty are dropped, and repeated headings stay separate.
/// Without any heading the result is a single [`UNSTRUCTURED`] section, as
/// it is for empty text.
pub fn detect_sections(text: &str) -> Vec<Section> {
    let headings = find_headings(text);
    if headings.is_empty() {
        return vec![Section::new(UNSTRUCTURED, text.trim())];
    }

    let mut sections = Vec::with_capacity(headings.len().saturating_add(1));
    let preamble = text[..headings[0].start].trim();
    if !preamble.is_empty() {
        sections.push(Section::new(UNSTRUCTURED, preamble));
    }

    for (i, heading) in headings.iter().enumerate() {
        let content_end = headings.get(i.saturating_add(1)).map_or(text.len(), |next| next.start);
        let content = text[heading.end..content_end].trim();
        if !content.is_empty() {
            sections.push(Section::new(heading.name, content));
        }
    }

    if sections.is_empty() {
        return vec![Section::new(UNSTRUCTURED, "")];
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_canonical_synonyms() {
        assert_eq!(canonical_section("Setting"), Some(METHODS));
        assert_eq!(canonical_section("PARTICIPANTS:"), Some(METHODS));
        assert_eq!(canonical_section("Findings"), Some(RESULTS));
        assert_eq!(canonical_section("Interpretation"), Some(CONCLUSIONS));
        assert_eq!(canonical_section("Materials  and Methods"), Some(METHODS));
        assert_eq!(canonical_section("Summary"), None);
    }

    #[test]
    fn test_inline_structured_abstract() {
        let text = "Background: Hypertension is common. Methods: We enrolled 200 adults. \
                    Results: Blood pressure fell. Conclusions: The drug works.";
        let sections = detect_sections(text);

        assert_eq!(names(&sections), vec![BACKGROUND, METHODS, RESULTS, CONCLUSIONS]);
        assert_eq!(sections[0].content, "Hypertension is common.");
        assert_eq!(sections[2].content, "Blood pressure fell.");
    }

    #[test]
    fn test_line_headings_without_colon() {
        let text = "OBJECTIVE\nTo test aspirin.\nRESULTS\nEvents fell by 25%.";
        let sections = detect_sections(text);

        assert_eq!(names(&sections), vec![OBJECTIVE, RESULTS]);
        assert_eq!(sections[1].content, "Events fell by 25%.");
    }

    #[test]
    fn test_longest_synonym_wins() {
        let sections = detect_sections("MATERIALS AND METHODS: Mice were dosed. FINDINGS: None died.");
        assert_eq!(names(&sections), vec![METHODS, RESULTS]);
        assert_eq!(sections[0].content, "Mice were dosed.");
    }

    #[test]
    fn test_mid_sentence_words_are_not_headings() {
        let text = "We describe the study design: a cohort of patients: all adults. The results were mixed.";
        let sections = detect_sections(text);
        assert_eq!(sections, vec![Section::new(UNSTRUCTURED, text)]);
    }

    #[test]
    fn test_no_headings_is_unstructured() {
        let sections = detect_sections("Very short abstract.");
        assert_eq!(sections, vec![Section::new(UNSTRUCTURED, "Very short abstract.")]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(detect_sections(""), vec![Section::new(UNSTRUCTURED, "")]);
    }

    #[test]
    fn test_preamble_is_kept() {
        let sections = detect_sections("A randomized trial.\nResults: Mortality fell.");
        assert_eq!(names(&sections), vec![UNSTRUCTURED, RESULTS]);
        assert_eq!(sections[0].content, "A randomized trial.");
    }

    #[test]
    fn test_duplicate_headings_stay_separate() {
        let sections = detect_sections("Results: First cohort improved. Results: Second cohort did not.");
        assert_eq!(names(&sections), vec![RESULTS, RESULTS]);
        assert_eq!(sections[1].content, "Second cohort did not.");
    }

    #[test]
    fn test_empty_sections_are_dropped() {
        let sections = detect_sections("Background:\nMethods: Survey of 40 clinics.");
        assert_eq!(names(&sections), vec![METHODS]);

        let only_headings = detect_sections("Results:\nConclusions:");
        assert_eq!(only_headings, vec![Section::new(UNSTRUCTURED, "")]);
    }

    #[test]
    fn test_wrapped_words_are_not_bare_headings() {
        let text = "The protocol was approved.\nPatients\nwere enrolled at 3 sites.";
        assert_eq!(detect_sections(text), vec![Section::new(UNSTRUCTURED, text)]);

        let text = "We then measured the\nResults\nof every assay.";
        assert_eq!(detect_sections(text), vec![Section::new(UNSTRUCTURED, text)]);
    }

    #[test]
    fn test_bare_heading_after_blank_line() {
        let sections = detect_sections("Intro paragraph without a stop\n\nMETHODS\nWe enrolled 40 adults.");
        assert_eq!(names(&sections), vec![UNSTRUCTURED, METHODS]);
        assert_eq!(sections[1].content, "We enrolled 40 adults.");
    }
}
