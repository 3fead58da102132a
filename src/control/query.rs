//! Request target parsing: path plus percent-decoded query pairs.

use percent_encoding::percent_decode_str;

/// Split `/show?file=x` into `("/show", "file=x")`.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split('#').next().unwrap_or(url);
    url.split_once('?').unwrap_or((url, ""))
}

/// Decoded `key=value` pairs, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode(key), decode(value))
            })
            .collect();
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every line number under `key`, from repeated keys or comma lists.
    /// Entries that are not positive integers are dropped.
    pub fn lines(&self, key: &str) -> Vec<usize> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .filter_map(|part| part.trim().parse::<usize>().ok())
            .filter(|&line| line > 0)
            .collect()
    }
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    percent_decode_str(&raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        assert_eq!(split_url("/show?file=a"), ("/show", "file=a"));
        assert_eq!(split_url("/scan"), ("/scan", ""));
        assert_eq!(split_url("/scan#top"), ("/scan", ""));
    }

    #[test]
    fn test_decoded_values() {
        let query = Query::parse("file=src%2Fcomponents%2FCard.tsx%3A12&name=My+Card");
        assert_eq!(query.get("file"), Some("src/components/Card.tsx:12"));
        assert_eq!(query.get("name"), Some("My Card"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_lines_merge_lists_and_repeats() {
        let query = Query::parse("lines=3%2C7&lines=12&lines=x&lines=0");
        assert_eq!(query.lines("lines"), [3, 7, 12]);
        assert!(Query::parse("").lines("lines").is_empty());
    }
}
