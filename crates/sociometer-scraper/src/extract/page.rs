use scraper::{ElementRef, Html, Node, Selector};

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// A rendered page snapshot: final URL, raw markup and its visible text.
///
/// `scraper::Html` is not `Send`, so only the markup is held; every query
/// re-parses inside a synchronous call and never across an `.await`.
#[derive(Debug, Clone)]
pub struct PageState {
    pub url: String,
    pub html: String,
    pub text: String,
}

impl PageState {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let document = Html::parse_document(&html);
        let text = visible_text(document.root_element());
        Self {
            url: url.into(),
            html,
            text,
        }
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Trimmed text of the first element matching `css` that has any.
    #[must_use]
    pub fn select_text(&self, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let document = self.document();
        document
            .select(&selector)
            .map(visible_text)
            .find(|t| !t.is_empty())
    }

    /// All matches of `css` rendered as visible text.
    #[must_use]
    pub fn select_all_text(&self, css: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(css) else {
            return Vec::new();
        };
        let document = self.document();
        document.select(&selector).map(visible_text).collect()
    }

    #[must_use]
    pub fn select_attr(&self, css: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let document = self.document();
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    /// Number of elements matching `css`; zero for an invalid selector.
    #[must_use]
    pub fn count(&self, css: &str) -> usize {
        let Ok(selector) = Selector::parse(css) else {
            return 0;
        };
        self.document().select(&selector).count()
    }

    /// `content` of `<meta property=name>` or `<meta name=name>`.
    #[must_use]
    pub fn meta_content(&self, name: &str) -> Option<String> {
        self.select_attr(&format!(r#"meta[property="{name}"]"#), "content")
            .or_else(|| self.select_attr(&format!(r#"meta[name="{name}"]"#), "content"))
    }

    /// Parses the body of the first `<script>` matching `css` as JSON.
    #[must_use]
    pub fn script_json(&self, css: &str) -> Option<serde_json::Value> {
        let selector = Selector::parse(css).ok()?;
        let document = self.document();
        document.select(&selector).find_map(|el| {
            let body: String = el.text().collect();
            serde_json::from_str(body.trim()).ok()
        })
    }
}

/// Collects human-visible text below `root`, skipping script-like elements and
/// substituting `alt` text for images. Whitespace is collapsed.
pub(crate) fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible(root, &mut out);
    collapse_whitespace(&out)
}

fn push_visible(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    if name == "img" {
        if let Some(alt) = el.value().attr("alt") {
            out.push(' ');
            out.push_str(alt);
            out.push(' ');
        }
        return;
    }

    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push(' ');
                    push_visible(child_el, out);
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
