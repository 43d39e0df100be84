use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::models::SearchContext;

pub const MAX_QUERY_WORDS: usize = 8;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[(][^\])]*[\])]").unwrap());

/// Words common in link captions that say nothing about the product
const FILLER_WORDS: &[&str] = &[
    "a", "an", "and", "the", "for", "with", "this", "that", "these", "my", "our", "your", "you", "i",
    "me", "we", "it", "is", "are", "in", "on", "of", "to", "at", "by", "here", "link", "links",
    "buy", "get", "grab", "check", "out", "amazon", "affiliate", "use", "used", "using", "video",
    "watch", "click", "below", "above", "shop", "deal", "price", "current", "latest", "new",
];

fn clean(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, " ");
    let without_brackets = BRACKETED.replace_all(&without_urls, " ");

    let mut seen = HashSet::new();
    without_brackets
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-'))
        .filter(|w| w.chars().count() >= 2)
        .filter(|w| !FILLER_WORDS.contains(&w.to_lowercase().as_str()))
        .filter(|w| seen.insert(w.to_lowercase()))
        .take(MAX_QUERY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn continues_url(c: char) -> bool {
    c.is_alphanumeric() || "/-_?=&%#~+".contains(c)
}

/// Position of `url` in `line` as a whole link, so `https://amzn.to/ab`
/// does not match inside `https://amzn.to/abc`.
fn find_link(line: &str, url: &str) -> Option<usize> {
    line.match_indices(url).map(|(pos, _)| pos).find(|&pos| {
        let before = line[..pos].chars().next_back();
        let after = line[pos + url.len()..].chars().next();
        !before.is_some_and(continues_url) && !after.is_some_and(continues_url)
    })
}

/// Picks the caption of the broken link: the text before the link on its
/// own line, else the nearest non-blank line above when that line is not
/// itself a link.
fn caption_for(excerpt: &str, original_url: &str) -> Option<String> {
    let url = original_url.trim();
    if url.is_empty() {
        return None;
    }
    let lines: Vec<&str> = excerpt.lines().collect();
    let (index, pos) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| find_link(line, url).map(|pos| (i, pos)))?;

    let same_line = &lines[index][..pos];
    if !clean(same_line).is_empty() {
        return Some(same_line.to_string());
    }

    let above = lines[..index].iter().rev().find(|line| !line.trim().is_empty())?;
    if URL_PATTERN.is_match(above) {
        return None;
    }
    Some(above.to_string())
}

/// Builds the marketplace query for a broken link from where it appeared.
///
/// The dead URL carries no recoverable product meaning, so only the video
/// context is used: the link's caption, then the whole excerpt, then the
/// video title.
pub fn derive_search_query(context: &SearchContext, original_url: &str) -> Option<String> {
    let caption = caption_for(&context.video_description_excerpt, original_url);
    let sources = [
        caption.as_deref().unwrap_or_default(),
        context.video_description_excerpt.as_str(),
        context.video_title.as_str(),
    ];

    sources
        .iter()
        .map(|source| clean(source))
        .find(|query| !query.is_empty())
}
