use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::page::{visible_text, PageState};

/// An owned, `Send` view of one post container, captured while the page was
/// parsed. Field strategies run against this instead of the live DOM.
#[derive(Debug, Clone, Default)]
pub struct PostNode {
    /// Outer HTML of the container, for selector-based strategies.
    pub html: String,
    /// Visible text of the container.
    pub text: String,
    /// Every `href` below the container, absolutized against `base_url`.
    pub links: Vec<String>,
    /// `aria-label` values below (and on) the container.
    pub labels: Vec<String>,
    /// `datetime` attributes of `<time>` elements.
    pub datetimes: Vec<String>,
    /// Count of `img` and `video` elements.
    pub media_count: usize,
    pub base_url: Option<Url>,
}

impl PostNode {
    pub(crate) fn from_element(el: ElementRef<'_>, base_url: Option<&Url>) -> Self {
        let mut node = Self {
            html: el.html(),
            text: visible_text(el),
            base_url: base_url.cloned(),
            ..Self::default()
        };

        let mut visit = |e: ElementRef<'_>| {
            let v = e.value();
            if let Some(href) = v.attr("href") {
                if let Some(abs) = absolutize(base_url, href) {
                    node.links.push(abs);
                }
            }
            if let Some(label) = v.attr("aria-label") {
                let label = label.trim();
                if !label.is_empty() {
                    node.labels.push(label.to_string());
                }
            }
            match v.name() {
                "time" => {
                    if let Some(dt) = v.attr("datetime") {
                        node.datetimes.push(dt.trim().to_string());
                    }
                }
                "img" | "video" => node.media_count += 1,
                _ => {}
            }
        };

        visit(el);
        for descendant in el.descendants().skip(1) {
            if let Some(child) = ElementRef::wrap(descendant) {
                visit(child);
            }
        }
        node
    }

    /// Builds a node from a standalone fragment; the fragment's first element
    /// is the container.
    #[must_use]
    pub fn from_fragment(html: &str, base_url: Option<&Url>) -> Option<Self> {
        let fragment = Html::parse_fragment(html);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)?;
        Some(Self::from_element(root, base_url))
    }

    /// Parses the container markup for selector queries. Keep the result
    /// within a synchronous scope.
    pub(crate) fn fragment(&self) -> Html {
        Html::parse_fragment(&self.html)
    }

    /// First link whose path matches `predicate`.
    pub fn find_link(&self, mut predicate: impl FnMut(&Url) -> bool) -> Option<&str> {
        self.links
            .iter()
            .find(|l| Url::parse(l).is_ok_and(|u| predicate(&u)))
            .map(String::as_str)
    }

    #[must_use]
    pub fn has_media(&self) -> bool {
        self.media_count > 0
    }
}

/// Resolves `href` against `base`. Fragment-only and `javascript:` links are
/// dropped.
pub(crate) fn absolutize(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

/// Finds post containers on the page. Selectors are tried in priority order;
/// the first one yielding at least one container whose text is at least
/// `min_text_len` characters (or that carries media) wins.
#[must_use]
pub fn discover_posts(page: &PageState, containers: &[&str], min_text_len: usize) -> Vec<PostNode> {
    let document = Html::parse_document(&page.html);
    let base = Url::parse(&page.url).ok();

    for css in containers {
        let Ok(selector) = Selector::parse(css) else {
            tracing::warn!(selector = css, "skipping unparsable post container selector");
            continue;
        };
        let nodes: Vec<PostNode> = document
            .select(&selector)
            .map(|el| PostNode::from_element(el, base.as_ref()))
            .filter(|n| n.text.chars().count() >= min_text_len || n.has_media())
            .collect();
        if !nodes.is_empty() {
            tracing::debug!(selector = css, found = nodes.len(), "post containers discovered");
            return nodes;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r##"<html><body>
      <div class="feed">
        <article class="post">
          <a href="/acme/post/1">Permalink</a>
          <p>Launching our spring collection today</p>
          <time datetime="2024-03-01T12:00:00Z">Mar 1</time>
          <button aria-label="12 likes">12</button>
          <img src="/img/1.jpg" alt="">
        </article>
        <article class="post"><p>hi</p></article>
        <article class="post">
          <a href="https://cdn.example.com/x">cdn</a>
          <a href="#top">top</a>
          <p>Second real post with enough text</p>
        </article>
      </div>
    </body></html>"##;

    #[test]
    fn captures_links_labels_and_media() {
        let page = PageState::new("https://social.example/acme", FEED);
        let posts = discover_posts(&page, &["article.post"], 10);
        assert_eq!(posts.len(), 2, "short post without media is filtered");

        let first = &posts[0];
        assert_eq!(first.links, vec!["https://social.example/acme/post/1"]);
        assert_eq!(first.labels, vec!["12 likes"]);
        assert_eq!(first.datetimes, vec!["2024-03-01T12:00:00Z"]);
        assert!(first.has_media());
        assert!(first.text.contains("Launching our spring collection"));

        assert_eq!(posts[1].links, vec!["https://cdn.example.com/x"]);
    }

    #[test]
    fn falls_back_to_next_selector() {
        let page = PageState::new("https://social.example/acme", FEED);
        let posts = discover_posts(&page, &["div.missing", "[[bad", "article.post"], 10);
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn no_containers_yields_empty() {
        let page = PageState::new("https://social.example/acme", "<html><body></body></html>");
        assert!(discover_posts(&page, &["article"], 0).is_empty());
    }

    #[test]
    fn find_link_matches_on_parsed_url() {
        let base = Url::parse("https://social.example/").unwrap();
        let node = PostNode::from_fragment(
            r#"<div><a href="/about">a</a><a href="/acme/post/77">b</a></div>"#,
            Some(&base),
        )
        .unwrap();
        let link = node.find_link(|u| u.path().contains("/post/"));
        assert_eq!(link, Some("https://social.example/acme/post/77"));
    }
}
