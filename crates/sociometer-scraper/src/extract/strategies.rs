//! Reusable extraction strategies. Each constructor returns a closure suitable
//! for [`FieldChain::with`]; platforms compose them in priority order.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::Selector;
use sha2::{Digest, Sha256};

use super::chain::FieldChain;
use super::node::{absolutize, PostNode};
use super::page::{visible_text, PageState};
use super::parse::{parse_count, parse_timestamp, LabeledCount};

pub type NodeChain<T> = FieldChain<PostNode, T>;
pub type PageChain<T> = FieldChain<PageState, T>;

/// First capture group of `re` over the node's links.
pub fn link_capture(re: Regex) -> impl Fn(&PostNode) -> Option<String> + Send + Sync {
    move |node| {
        node.links.iter().find_map(|link| {
            re.captures(link)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// First node link matching `re`, returned whole.
pub fn link_matching(re: Regex) -> impl Fn(&PostNode) -> Option<String> + Send + Sync {
    move |node| node.links.iter().find(|l| re.is_match(l)).cloned()
}

/// Visible text of the first element under the node matching `css`.
pub fn css_text(css: &'static str) -> impl Fn(&PostNode) -> Option<String> + Send + Sync {
    let selector = Selector::parse(css).ok();
    move |node| {
        let selector = selector.as_ref()?;
        let fragment = node.fragment();
        let found = fragment
            .select(selector)
            .map(visible_text)
            .find(|t| !t.is_empty());
        found
    }
}

/// Attribute of the first element under the node matching `css`; `href`
/// and `src` values are absolutized.
pub fn css_attr(
    css: &'static str,
    attr: &'static str,
) -> impl Fn(&PostNode) -> Option<String> + Send + Sync {
    let selector = Selector::parse(css).ok();
    move |node| {
        let selector = selector.as_ref()?;
        let fragment = node.fragment();
        let value = fragment
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(ToString::to_string)?;
        if matches!(attr, "href" | "src") {
            absolutize(node.base_url.as_ref(), &value)
        } else {
            Some(value)
        }
    }
}

/// Count parsed from the text of the first matching element.
pub fn css_count(css: &'static str) -> impl Fn(&PostNode) -> Option<u64> + Send + Sync {
    let text = css_text(css);
    move |node| text(node).as_deref().and_then(parse_count)
}

/// Count from an `aria-label` such as `"1,204 Likes. Like"`.
pub fn label_count(labels: &[&str]) -> impl Fn(&PostNode) -> Option<u64> + Send + Sync {
    let matcher = LabeledCount::new(labels);
    move |node| node.labels.iter().find_map(|l| matcher.find(l))
}

/// Count found in the node's visible text next to one of `labels`.
pub fn text_count(labels: &[&str]) -> impl Fn(&PostNode) -> Option<u64> + Send + Sync {
    let matcher = LabeledCount::new(labels);
    move |node| matcher.find(&node.text)
}

/// First parseable `<time datetime>` value.
pub fn first_datetime() -> impl Fn(&PostNode) -> Option<DateTime<Utc>> + Send + Sync {
    |node| node.datetimes.iter().find_map(|d| parse_timestamp(d))
}

/// The container's full visible text.
pub fn container_text() -> impl Fn(&PostNode) -> Option<String> + Send + Sync {
    |node| Some(node.text.clone())
}

/// Stable identifier derived from the post text: `h:` followed by the first 16
/// hex digits of its SHA-256. `None` for blank text.
#[must_use]
pub fn content_hash_id(node: &PostNode) -> Option<String> {
    let text = node.text.trim();
    if text.is_empty() {
        return None;
    }
    let digest = Sha256::digest(text.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    Some(format!("h:{hex}"))
}

/// Count next to `labels` inside a `<meta>` tag's content.
pub fn page_meta_count(
    meta: &'static str,
    labels: &[&str],
) -> impl Fn(&PageState) -> Option<u64> + Send + Sync {
    let matcher = LabeledCount::new(labels);
    move |page| page.meta_content(meta).and_then(|c| matcher.find(&c))
}

pub fn page_css_count(css: &'static str) -> impl Fn(&PageState) -> Option<u64> + Send + Sync {
    move |page| page.select_text(css).as_deref().and_then(parse_count)
}

pub fn page_attr_count(
    css: &'static str,
    attr: &'static str,
) -> impl Fn(&PageState) -> Option<u64> + Send + Sync {
    move |page| page.select_attr(css, attr).as_deref().and_then(parse_count)
}

pub fn page_text_count(labels: &[&str]) -> impl Fn(&PageState) -> Option<u64> + Send + Sync {
    let matcher = LabeledCount::new(labels);
    move |page| matcher.find(&page.text)
}

/// Numeric value at any of `pointers` (RFC 6901) inside the JSON body of the
/// first `<script>` matching `script_css`. Numeric strings are accepted too.
pub fn page_json_count(
    script_css: &'static str,
    pointers: &'static [&'static str],
) -> impl Fn(&PageState) -> Option<u64> + Send + Sync {
    move |page| {
        let blob = page.script_json(script_css)?;
        pointers.iter().find_map(|p| json_count(blob.pointer(p)?))
    }
}

fn json_count(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => parse_count(s),
        _ => None,
    }
}
