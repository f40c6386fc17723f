use scraper::{ElementRef, Html, Selector};

use mm_core::ScrapedContent;

/// Below this much extracted text the page is treated as unreadable
/// (paywall shells, consent walls, link farms).
const MIN_TEXT_LEN: usize = 200;

/// Paragraphs shorter than this are usually captions, bylines or nav crumbs.
const MIN_PARAGRAPH_LEN: usize = 40;

/// Pull readable article text out of an HTML document. Returns `None` when
/// no candidate container yields enough text.
pub fn readable_text(url: &str, html: &str) -> Option<ScrapedContent> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let text = extract_body_text(&document)?;
    if text.len() < MIN_TEXT_LEN {
        return None;
    }
    Some(ScrapedContent {
        url: url.to_string(),
        title,
        text,
    })
}

fn extract_title(document: &Html) -> Option<String> {
    if let Ok(selector) = Selector::parse("meta[property='og:title']") {
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                let title = content.trim();
                if !title.is_empty() {
                    return Some(title.to_string());
                }
            }
        }
    }

    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

/// Semantic article containers first; the plain body is a last resort since
/// it drags in navigation and comment sections.
fn extract_body_text(document: &Html) -> Option<String> {
    for css in ["article", "main", "[role='main']"] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let mut best = String::new();
        for container in document.select(&selector) {
            let text = paragraph_text(container);
            if text.len() > best.len() {
                best = text;
            }
        }
        if best.len() >= MIN_TEXT_LEN {
            return Some(best);
        }
    }

    let selector = Selector::parse("body").ok()?;
    document
        .select(&selector)
        .next()
        .map(paragraph_text)
        .filter(|text| !text.trim().is_empty())
}

fn paragraph_text(container: ElementRef<'_>) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    let mut paragraphs = Vec::new();
    for node in container.select(&selector) {
        let text = clean_text(&node.text().collect::<String>());
        if text.len() >= MIN_PARAGRAPH_LEN {
            paragraphs.push(text);
        }
    }
    paragraphs.join("\n\n")
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
