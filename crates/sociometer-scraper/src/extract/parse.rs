//! Numeric and timestamp parsing for scraped text.
//!
//! Counts on social pages are abbreviated (`"1.2K"`, `"3M"`), grouped
//! (`"1,200"`, `"1 200"`) or plain (`"500"`). All of these are normalized to
//! integers with exact decimal arithmetic, so `"1.2K"` is exactly `1200`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// A count token: grouped thousands or a plain/decimal number, with an
/// optional K/M/B suffix.
const COUNT_TOKEN: &str =
    r"(\d{1,3}(?:[,\u{a0} ]\d{3})+|\d+(?:\.\d+)?)\s*([kKmMbB](?:\b|[^a-zA-Z]|$))?";

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COUNT_TOKEN).expect("valid regex"));

fn scale_for(suffix: Option<char>) -> u64 {
    match suffix.map(|c| c.to_ascii_lowercase()) {
        Some('k') => 1_000,
        Some('m') => 1_000_000,
        Some('b') => 1_000_000_000,
        _ => 1,
    }
}

/// Converts a matched number and suffix into an integer.
///
/// Fractional digits beyond the scale are truncated (`"1.2345K"` → `1234`).
fn scaled(number: &str, suffix: Option<char>) -> Option<u64> {
    let scale = scale_for(suffix);
    let digits: String = number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits.as_str(), ""),
    };

    let int_value: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut value = int_value.checked_mul(scale)?;

    let mut place = scale;
    for d in frac_part.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        let digit = u64::from(d.to_digit(10)?);
        value = value.checked_add(digit * place)?;
    }
    Some(value)
}

/// Parses the first count in `raw`.
///
/// ```
/// use sociometer_scraper::extract::parse_count;
/// assert_eq!(parse_count("1.2K"), Some(1_200));
/// assert_eq!(parse_count("3M"), Some(3_000_000));
/// assert_eq!(parse_count("1 200 likes"), Some(1_200));
/// assert_eq!(parse_count("no digits"), None);
/// ```
#[must_use]
pub fn parse_count(raw: &str) -> Option<u64> {
    let caps = COUNT_RE.captures(raw)?;
    let number = caps.get(1)?.as_str();
    let suffix = caps.get(2).and_then(|m| m.as_str().chars().next());
    scaled(number, suffix)
}

/// Compiled search for a count attached to one of several labels, in either
/// order: `"1,234 likes"` or `"Likes: 1,234"`.
#[derive(Debug, Clone)]
pub struct LabeledCount {
    before_label: Regex,
    after_label: Regex,
}

impl LabeledCount {
    /// Builds the matcher. Labels are matched case-insensitively on word
    /// boundaries; longer labels win over their prefixes.
    ///
    /// # Panics
    ///
    /// Only if an escaped label set fails to compile, which `regex::escape`
    /// rules out.
    #[must_use]
    pub fn new(labels: &[&str]) -> Self {
        let mut sorted: Vec<&str> = labels.to_vec();
        sorted.sort_by_key(|l| std::cmp::Reverse(l.len()));
        let alternation = sorted
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");

        let before_label = Regex::new(&format!(
            r"(?i)(\d{{1,3}}(?:[,\u{{a0}} ]\d{{3}})+|\d+(?:\.\d+)?)\s*([kmb])?\s*(?:{alternation})\b"
        ))
        .expect("escaped labels form a valid regex");
        let after_label = Regex::new(&format!(
            r"(?i)\b(?:{alternation})\b\W{{0,3}}(\d{{1,3}}(?:[,\u{{a0}} ]\d{{3}})+|\d+(?:\.\d+)?)\s*([kmb])?(?:\b|$)"
        ))
        .expect("escaped labels form a valid regex");

        Self {
            before_label,
            after_label,
        }
    }

    /// Finds the count with the label after the number (`"12 likes"`).
    #[must_use]
    pub fn find_before_label(&self, text: &str) -> Option<u64> {
        Self::capture(&self.before_label, text)
    }

    /// Finds the count with the label before the number (`"Likes: 12"`).
    #[must_use]
    pub fn find_after_label(&self, text: &str) -> Option<u64> {
        Self::capture(&self.after_label, text)
    }

    /// Tries number-then-label first, then label-then-number.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<u64> {
        self.find_before_label(text)
            .or_else(|| self.find_after_label(text))
    }

    fn capture(re: &Regex, text: &str) -> Option<u64> {
        let caps = re.captures(text)?;
        let number = caps.get(1)?.as_str();
        let suffix = caps.get(2).and_then(|m| m.as_str().chars().next());
        scaled(number, suffix)
    }
}

/// Parses an ISO-8601/RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS`
/// (assumed UTC), or Unix epoch seconds / milliseconds.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = raw.parse().ok()?;
        return match raw.len() {
            13 => DateTime::from_timestamp_millis(n),
            9 | 10 => DateTime::from_timestamp(n, 0),
            _ => None,
        };
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}
