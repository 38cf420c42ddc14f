use crate::types::{AggregatorError, NewsItem, Result};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Extracts (title, absolute url) pairs from a page using a CSS selector.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlineParser;

impl HeadlineParser {
    pub fn new() -> Self {
        Self
    }

    pub fn compile_selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|e| AggregatorError::Selector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    /// Every element matched by `selector` that carries an `href` and some
    /// visible text becomes one item, in document order. Relative hrefs are
    /// resolved against `base_url`.
    pub fn parse(&self, html: &str, selector: &str, base_url: &str) -> Result<Vec<NewsItem>> {
        let selector = Self::compile_selector(selector)?;
        let base = Url::parse(base_url)?;
        let document = Html::parse_document(html);

        let mut items = Vec::new();
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                debug!(element = element.value().name(), "Skipping match without href");
                continue;
            };

            let title = normalize_title(element.text());
            if title.is_empty() {
                debug!(%href, "Skipping link without text");
                continue;
            }

            match resolve_href(&base, href) {
                Some(url) => items.push(NewsItem { title, url }),
                None => debug!(%href, "Skipping unresolvable or non-http link"),
            }
        }

        info!(count = items.len(), base = %base, "Parsed headlines");
        Ok(items)
    }
}

fn normalize_title<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let mut title = String::new();
    for word in fragments.flat_map(str::split_whitespace) {
        if !title.is_empty() {
            title.push(' ');
        }
        title.push_str(word);
    }
    title
}

fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.into()),
        _ => None,
    }
}
