//! Named extraction strategies for listing fields.
//!
//! Each field has a prioritized list. When marketplace markup drifts, fixes
//! are made here by adding or reordering a strategy.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// One way of pulling a field out of a listing's markup
#[derive(Debug, Clone)]
pub struct RegexStrategy {
    pub name: &'static str,
    pattern: Regex,
    render: fn(&Captures) -> Option<String>,
}

impl RegexStrategy {
    pub fn new(name: &'static str, pattern: &str, render: fn(&Captures) -> Option<String>) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            render,
        }
    }

    /// Strategy whose value is the first capture group.
    pub fn first_group(name: &'static str, pattern: &str) -> Self {
        Self::new(name, pattern, |caps| caps.get(1).map(|m| m.as_str().to_string()))
    }

    pub fn extract(&self, window: &str) -> Option<String> {
        self.pattern
            .captures(window)
            .and_then(|caps| (self.render)(&caps))
            .map(|value| clean_text(&value))
            .filter(|value| !value.is_empty())
    }
}

/// Runs strategies in order and returns the first accepted value with the
/// strategy that produced it. A rejected value counts as a miss.
pub fn first_match<'a>(
    strategies: &'a [RegexStrategy],
    window: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<(&'a str, String)> {
    strategies.iter().find_map(|strategy| {
        strategy
            .extract(window)
            .filter(|value| accept(value))
            .map(|value| (strategy.name, value))
    })
}

pub static TITLE_STRATEGIES: Lazy<Vec<RegexStrategy>> = Lazy::new(|| {
    vec![
        RegexStrategy::first_group("h2_aria_label", r#"<h2[^>]*\baria-label="([^"]+)""#),
        RegexStrategy::first_group(
            "text_normal_span",
            r#"<span class="a-size-(?:medium|base-plus|base)[^"]*\ba-text-normal"[^>]*>([^<]+)</span>"#,
        ),
        RegexStrategy::first_group("h2_span", r#"<h2[^>]*>\s*(?:<a[^>]*>\s*)?<span[^>]*>([^<]+)</span>"#),
        RegexStrategy::first_group("image_alt", r#"<img[^>]*\bclass="s-image"[^>]*\balt="([^"]+)""#),
    ]
});

pub static PRICE_STRATEGIES: Lazy<Vec<RegexStrategy>> = Lazy::new(|| {
    vec![
        RegexStrategy::first_group("offscreen", r#"<span class="a-offscreen">([^<]+)</span>"#),
        RegexStrategy::new(
            "whole_fraction",
            r#"<span class="a-price-symbol">([^<]*)</span><span class="a-price-whole">([\d.,]+?)(?:<span class="a-price-decimal">[.,]</span>)?</span><span class="a-price-fraction">(\d+)</span>"#,
            |caps| Some(format!("{}{}.{}", &caps[1], &caps[2], &caps[3])),
        ),
        RegexStrategy::first_group("color_price", r#"<span class="a-color-price">\s*([^<]+?)\s*</span>"#),
    ]
});

pub static IMAGE_STRATEGIES: Lazy<Vec<RegexStrategy>> = Lazy::new(|| {
    vec![
        RegexStrategy::first_group("s_image_src", r#"<img[^>]*\bclass="s-image"[^>]*\bsrc="([^"]+)""#),
        RegexStrategy::first_group("src_then_s_image", r#"<img[^>]*\bsrc="([^"]+)"[^>]*\bclass="s-image""#),
        RegexStrategy::first_group("media_host", r#"(https://m\.media-amazon\.com/images/I/[^"\s]+)"#),
    ]
});

/// Decodes the common HTML entities and collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

    let decoded = NUMERIC_ENTITY.replace_all(raw, |caps: &Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    let decoded = decoded
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
