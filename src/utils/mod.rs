pub mod logger;

pub use logger::init_logger;

/// Reads a link list: one URL per line, blank lines and `#` comments skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let text = "# gear links\nhttps://amzn.to/abc\n\n  https://www.amazon.com/dp/B004YAVF8I  \n#https://skip.me\n";
        assert_eq!(
            parse_url_list(text),
            vec!["https://amzn.to/abc".to_string(), "https://www.amazon.com/dp/B004YAVF8I".to_string()]
        );
    }
}
