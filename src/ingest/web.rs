//! Web page fetching and text extraction

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use super::document::{Document, SOURCE_URL, TITLE};
use super::error::IngestError;

/// Elements that never carry readable text
const NON_CONTENT: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Fetch `url` and turn its text content into a document
#[instrument(skip(http, exclude_selectors))]
pub(crate) async fn fetch_page(
    http: &reqwest::Client,
    url: &str,
    exclude_selectors: &[String],
) -> Result<Document, IngestError> {
    let fetch_error = |e: reqwest::Error| IngestError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    };

    let html = http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(fetch_error)?
        .text()
        .await
        .map_err(fetch_error)?;

    let text = extract_text(&html, exclude_selectors);
    let title = extract_title(&html);
    debug!("Extracted {} characters from {}", text.len(), url);

    let document = Document::new(text)
        .ok_or_else(|| IngestError::EmptyDocument(url.to_string()))?
        .with_metadata(SOURCE_URL, url);

    Ok(match title {
        Some(title) => document.with_metadata(TITLE, title),
        None => document,
    })
}

/// Extract readable text from HTML
///
/// Text inside `exclude_selectors` matches and inside non-content elements is
/// dropped. Each remaining text node becomes one whitespace-collapsed line.
pub fn extract_text(html: &str, exclude_selectors: &[String]) -> String {
    let document = Html::parse_document(html);

    let mut excluded = HashSet::new();
    let selectors = NON_CONTENT
        .iter()
        .map(|s| s.to_string())
        .chain(exclude_selectors.iter().cloned());
    for selector_str in selectors {
        match Selector::parse(&selector_str) {
            Ok(selector) => excluded.extend(document.select(&selector).map(|element| element.id())),
            Err(e) => warn!("Failed to parse selector '{}': {}", selector_str, e),
        }
    }

    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if node.ancestors().any(|ancestor| excluded.contains(&ancestor.id())) {
            continue;
        }
        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Extract the page title, if any
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
        <head><title> Getting Started </title><style>body { color: red; }</style></head>
        <body>
            <nav>Home | Docs</nav>
            <h1>Install</h1>
            <p>Run   the
               installer.</p>
            <script>console.log("hidden")</script>
            <footer>Copyright</footer>
        </body>
    </html>"#;

    #[test]
    fn test_extract_text_skips_non_content() {
        let text = extract_text(PAGE, &[]);
        assert!(text.contains("Install"));
        assert!(text.contains("Run the installer."));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
        assert!(text.contains("Home | Docs"));
    }

    #[test]
    fn test_extract_text_honors_exclusions() {
        let text = extract_text(PAGE, &["nav".to_string(), "footer".to_string()]);
        assert_eq!(text, "Install\nRun the installer.");
    }

    #[test]
    fn test_invalid_selector_is_ignored() {
        let text = extract_text(PAGE, &["[[[".to_string()]);
        assert!(text.contains("Install"));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title(PAGE).as_deref(), Some("Getting Started"));
        assert_eq!(extract_title("<html><body>x</body></html>"), None);
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/guide")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PAGE)
            .create_async()
            .await;

        let url = format!("{}/guide", server.url());
        let document = fetch_page(&reqwest::Client::new(), &url, &[])
            .await
            .unwrap();

        assert!(document.text().contains("Run the installer."));
        assert_eq!(document.meta(SOURCE_URL), Some(url.as_str()));
        assert_eq!(document.meta(TITLE), Some("Getting Started"));
    }

    #[tokio::test]
    async fn test_fetch_page_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let err = fetch_page(&reqwest::Client::new(), &url, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_without_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/blank")
            .with_status(200)
            .with_body("<html><body><script>x()</script></body></html>")
            .create_async()
            .await;

        let url = format!("{}/blank", server.url());
        let err = fetch_page(&reqwest::Client::new(), &url, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptyDocument(_)));
    }
}
