//! Rule-based candidate confidence. Every point of a score traces back to
//! one of the rules in `score_title`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::Candidate;

const BASE_SCORE: u32 = 70;
const ALL_WORDS_BONUS: u32 = 15;
const PARTIAL_WORDS_MAX_BONUS: f64 = 10.0;
const EXACT_PHRASE_BONUS: u32 = 10;
const TOP_RESULT_BONUS: u32 = 5;
const MAX_SCORE: u32 = 100;

/// Display bands. High starts at 85, medium at 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=u8::MAX => ConfidenceLevel::High,
            70..=84 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Query words that carry meaning: longer than two characters.
pub fn significant_words(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|w| w.chars().count() > 2)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Scores a title against the query it was found for.
///
/// Base 70; +15 if every significant query word is in the title, otherwise a
/// proportional bonus up to 10 when at least half are; +10 if the whole query
/// appears verbatim; +5 for the top accepted result; clamped to 100.
pub fn score_title(title: &str, query: &str, is_top: bool) -> u8 {
    let mut score = BASE_SCORE;

    let words = significant_words(query);
    let title_words: HashSet<String> = tokenize(title).into_iter().collect();
    if !words.is_empty() {
        let matched = words.iter().filter(|w| title_words.contains(*w)).count();
        let fraction = matched as f64 / words.len() as f64;
        if matched == words.len() {
            score += ALL_WORDS_BONUS;
        } else if fraction >= 0.5 {
            score += (fraction * PARTIAL_WORDS_MAX_BONUS).round() as u32;
        }
    }

    let phrase = tokenize(query).join(" ");
    let padded_title = format!(" {} ", tokenize(title).join(" "));
    if !phrase.is_empty() && padded_title.contains(&format!(" {} ", phrase)) {
        score += EXACT_PHRASE_BONUS;
    }

    if is_top {
        score += TOP_RESULT_BONUS;
    }

    score.min(MAX_SCORE) as u8
}

pub fn score(candidate: &Candidate, query: &str, is_top: bool) -> u8 {
    score_title(&candidate.title, query, is_top)
}

/// Scores candidates in place; the first one is the top accepted result.
pub fn score_candidates(candidates: &mut [Candidate], query: &str) {
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.confidence_score = score(candidate, query, index == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_with_phrase_clamps_to_100() {
        assert_eq!(score_title("Logitech Wireless Mouse M185", "wireless mouse", true), 100);
    }

    #[test]
    fn test_rule_breakdown() {
        // all words, no phrase, not top
        assert_eq!(score_title("Mouse, Wireless, Black", "wireless mouse", false), 85);
        // all words and phrase, not top
        assert_eq!(score_title("Logitech Wireless Mouse", "wireless mouse", false), 95);
        // half the words
        assert_eq!(score_title("Wireless Keyboard", "wireless mouse", false), 75);
        // two of three words: round(0.667 * 10) = 7
        assert_eq!(score_title("Ergonomic Vertical Mouse", "ergonomic wireless mouse", false), 77);
        // below half
        assert_eq!(score_title("USB Hub", "ergonomic wireless mouse", false), 70);
        assert_eq!(score_title("USB Hub", "ergonomic wireless mouse", true), 75);
    }

    #[test]
    fn test_short_words_are_ignored() {
        assert_eq!(significant_words("a 4k tv for me"), vec!["for".to_string()]);
        assert_eq!(significant_words("Mouse mouse MOUSE"), vec!["mouse".to_string()]);
    }

    #[test]
    fn test_deterministic() {
        let first = score_title("Logitech Pebble M350", "logitech pebble mouse", true);
        for _ in 0..10 {
            assert_eq!(score_title("Logitech Pebble M350", "logitech pebble mouse", true), first);
        }
    }

    #[test]
    fn test_exact_phrase_scores_strictly_higher_than_partial() {
        let exact = score_title("Anker USB Hub Adapter", "usb hub adapter", false);
        let partial = score_title("Anker USB Adapter", "usb hub adapter", false);
        assert!(exact > partial, "{} should beat {}", exact, partial);
    }

    #[test]
    fn test_phrase_must_align_on_word_boundaries() {
        // "mouse" appears only inside "mousepad"
        assert_eq!(score_title("Gaming Mousepad XL", "mouse", false), 70);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(84), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(69), ConfidenceLevel::Low);
    }

    #[test]
    fn test_score_candidates_marks_first_as_top() {
        let mut candidates = vec![
            Candidate {
                title: "Logitech Wireless Mouse".to_string(),
                product_id: "B004YAVF8I".to_string(),
                price: None,
                image_url: None,
                confidence_score: 0,
            },
            Candidate {
                title: "Logitech Wireless Mouse".to_string(),
                product_id: "B07FKMDJQZ".to_string(),
                price: None,
                image_url: None,
                confidence_score: 0,
            },
        ];
        score_candidates(&mut candidates, "wireless mouse");
        assert_eq!(candidates[0].confidence_score, 100);
        assert_eq!(candidates[1].confidence_score, 95);
    }
}
