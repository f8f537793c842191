//! Sentence splitting that respects biomedical notation
//!
//! Boundaries are found by scanning rather than with a single regex: the
//! protected cases (abbreviations, initials) need look-behind that the
//! `regex` crate does not offer.

/// Abbreviations (lowercase, without the final period) that never end a sentence
///
/// Unit words that also end sentences ("30 min.", "was no.") are left out.
const ABBREVIATIONS: &[&str] = &[
    "vs", "al", "e.g", "i.e", "eg", "ie", "etc", "fig", "figs", "ref", "refs", "approx", "ca",
    "cf", "dr", "mr", "mrs", "prof", "nos", "vol", "pp", "resp", "incl", "jr", "sr",
];

/// Lowercase words that commonly precede an author's initial
const NAME_PRECEDERS: &[&str] = &["by", "and", "with", "from", "of"];

const fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

const fn is_closing(c: char) -> bool {
    matches!(c, ')' | ']' | '"' | '\'' | '\u{201d}' | '\u{2019}')
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase() || matches!(c, '(' | '[' | '"' | '\u{201c}')
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | '[' | '"' | '\u{201c}')
}

/// Whether `word` (without its final period) is one or more initials
fn is_initials(word: &str) -> bool {
    !word.is_empty()
        && word.split('.').all(|part| {
            let mut chars = part.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
        })
}

/// Whether a period right after `segment` closes an abbreviation or an initial
///
/// `following` is the text after the period and its whitespace. A lone
/// capital ("C.") counts as an initial only between name-like words, so
/// "hepatitis C. Treatment" still splits.
fn is_protected(segment: &str, following: &str) -> bool {
    let mut words = segment.rsplit(is_word_break);
    let word = words.next().unwrap_or_default();
    if word.is_empty() {
        return false;
    }

    if ABBREVIATIONS.contains(&word.to_lowercase().as_str()) {
        return true;
    }
    if !is_initials(word) {
        return false;
    }
    // Chained initials: "J.R."
    if word.contains('.') {
        return true;
    }

    let next_is_name = following
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() && c.is_uppercase());
    let previous = words.find(|w| !w.is_empty()).map(|w| w.trim_end_matches(','));
    let after_name = previous.is_none_or(|prev| {
        prev.chars().next().is_some_and(char::is_uppercase)
            || NAME_PRECEDERS.contains(&prev.to_lowercase().as_str())
    });
    next_is_name && after_name
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let sentence = candidate.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

/// Split text into sentences
///
/// A sentence ends at `.`, `!` or `?` (with any closing quotes or brackets)
/// followed by whitespace and an uppercase letter or opening bracket, or at
/// the end of the text. A blank line always ends a sentence. Periods inside
/// numbers, after known abbreviations and after initials are not boundaries.
///
/// Returned sentences are trimmed slices of `text`; only the whitespace
/// between them is left out.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let offset = |i: usize| chars.get(i).map_or(text.len(), |(pos, _)| *pos);

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while let Some(&(pos, c)) = chars.get(i) {
        if c.is_whitespace() {
            let mut k = i;
            while chars.get(k).is_some_and(|(_, ch)| ch.is_whitespace()) {
                k += 1;
            }
            if text[pos..offset(k)].matches('\n').count() >= 2 {
                push_trimmed(&mut sentences, &text[start..pos]);
                start = offset(k);
            }
            i = k;
            continue;
        }

        if !is_terminal(c) {
            i += 1;
            continue;
        }

        let mut j = i;
        while chars.get(j).is_some_and(|(_, ch)| is_terminal(*ch)) {
            j += 1;
        }
        while chars.get(j).is_some_and(|(_, ch)| is_closing(*ch)) {
            j += 1;
        }
        let mut k = j;
        while chars.get(k).is_some_and(|(_, ch)| ch.is_whitespace()) {
            k += 1;
        }

        let Some(&(next_pos, next)) = chars.get(k) else {
            break;
        };
        if k == j {
            // "1.5", "e.g.,", "p<.05": no whitespace, no boundary
            i = j;
            continue;
        }

        let term_end = offset(j);
        let paragraph_break = text[term_end..next_pos].matches('\n').count() >= 2;
        let protected = c == '.' && is_protected(&text[start..pos], &text[next_pos..]);
        if paragraph_break || (opens_sentence(next) && !protected) {
            push_trimmed(&mut sentences, &text[start..term_end]);
            start = next_pos;
        }
        i = k;
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn test_numeric_expression_stays_whole() {
        let text = "The result was 1.5 mg/kg vs. 2.3 mg/kg (p=0.05).";
        assert_eq!(split_sentences(text), vec![text]);
    }

    #[test]
    fn test_basic_boundaries() {
        let sentences = split_sentences("Aspirin helps. Does it? Yes! It does.");
        assert_eq!(sentences, vec!["Aspirin helps.", "Does it?", "Yes!", "It does."]);
    }

    #[test]
    fn test_abbreviations_and_initials() {
        let text = "As shown by Smith et al. Results were robust. \
                    Drugs, e.g. Statins, were excluded. J. R. Doe and A.B. Lee wrote it.";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "As shown by Smith et al. Results were robust.",
                "Drugs, e.g. Statins, were excluded.",
                "J. R. Doe and A.B. Lee wrote it."
            ]
        );
    }

    #[test]
    fn test_parenthetical_qualifier_opens_new_sentence() {
        let sentences = split_sentences("Risk fell by 25%. (95% CI 0.68-0.82, p<0.001).");
        assert_eq!(sentences, vec!["Risk fell by 25%.", "(95% CI 0.68-0.82, p<0.001)."]);
    }

    #[test]
    fn test_closing_quotes_stay_with_sentence() {
        let sentences = split_sentences("Patients said \"it helped.\" Others disagreed.");
        assert_eq!(sentences, vec!["Patients said \"it helped.\"", "Others disagreed."]);
    }

    #[test]
    fn test_lowercase_continuation_is_not_a_boundary() {
        let text = "Doses were 5 mg. daily for two weeks.";
        assert_eq!(split_sentences(text), vec![text]);
    }

    #[test]
    fn test_blank_line_is_hard_boundary() {
        let sentences = split_sentences("Trial registration NCT01234567\n\nfunded by NIH");
        assert_eq!(sentences, vec!["Trial registration NCT01234567", "funded by NIH"]);
    }

    #[test]
    fn test_sentences_are_lossless_slices() {
        let text = "First claim holds. Second claim (n=40) too.\nThird follows.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 3);

        let joined: String = sentences.concat();
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let joined_compact: String = joined.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(joined_compact, compact);
    }

    #[test]
    fn test_unit_words_and_lone_capitals_end_sentences() {
        assert_eq!(
            split_sentences("Follow-up was 30 min. Patients improved."),
            vec!["Follow-up was 30 min.", "Patients improved."]
        );
        assert_eq!(
            split_sentences("The answer was no. We stopped."),
            vec!["The answer was no.", "We stopped."]
        );
        assert_eq!(
            split_sentences("Patients with hepatitis C. Treatment was effective."),
            vec!["Patients with hepatitis C.", "Treatment was effective."]
        );
    }

    #[test]
    fn test_initials_before_names_are_kept() {
        let text = "Data were collected by J. Smith and reviewed. Dr. M. Jones agreed.";
        assert_eq!(
            split_sentences(text),
            vec!["Data were collected by J. Smith and reviewed.", "Dr. M. Jones agreed."]
        );
    }
}
