//! Anchor link extraction for rendered pages

use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Compute the origin (scheme + host + non-default port, no path) of a URL
///
/// Returns `None` for URLs without a tuple origin such as `mailto:` or `data:`.
pub fn base_origin(url: &Url) -> Option<String> {
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Extract hyperlink targets from rendered HTML
///
/// Anchors are visited in document order:
///
/// 1. anchors without `href` are skipped
/// 2. pure fragments (`#...`) are skipped
/// 3. root-relative paths (`/...`) are resolved against `base_origin`
/// 4. `http://` and `https://` targets are kept verbatim
/// 5. anything else (`mailto:`, bare relative paths) is reported and skipped
///
/// The output is neither deduplicated nor sorted.
pub fn extract_links(html: &str, base_origin: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    // The selector is a constant and always parses
    let Ok(anchor_selector) = Selector::parse("a") else {
        return Vec::new();
    };
    let base = Url::parse(base_origin).ok();

    let mut links = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        if href.starts_with('/') {
            match resolve_root_relative(base.as_ref(), base_origin, href) {
                Some(absolute) => links.push(absolute),
                None => debug!("Could not resolve {} against {}", href, base_origin),
            }
            continue;
        }

        if href.starts_with("http://") || href.starts_with("https://") {
            links.push(href.to_string());
            continue;
        }

        info!("Unknown link: {}", href);
    }

    links
}

fn resolve_root_relative(base: Option<&Url>, base_origin: &str, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Some(format!("{}{}", base_origin.trim_end_matches('/'), href)),
    }
}
