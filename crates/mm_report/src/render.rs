//! HTML assembly for the two report flavours. Summaries arrive from the
//! model as HTML fragments and are embedded as-is; everything else that
//! reaches the page is escaped here.

use chrono::{DateTime, Utc};

/// What fills an article's section of the report.
#[derive(Debug, Clone)]
pub enum SectionBody {
    /// Model-produced HTML fragment, embedded unescaped.
    Summary(String),
    /// The page could not be scraped; carries the failure description.
    ScrapeFailed(String),
    /// Content was available but summarization failed.
    SummaryUnavailable(String),
}

#[derive(Debug, Clone)]
pub struct ArticleSection {
    pub url: String,
    pub title: Option<String>,
    pub submitted_by: String,
    pub body: SectionBody,
}

/// Minimal HTML escaping for text that did not come from the model.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn header(title: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "<h1>{}</h1>\n<p><em>Generated {} UTC</em></p>\n",
        escape(title),
        generated_at.format("%-d %B %Y %H:%M")
    )
}

fn section_heading(section: &ArticleSection) -> String {
    let label = section.title.as_deref().unwrap_or(&section.url);
    if section.url.is_empty() {
        // Content pasted directly with the trigger request has no URL.
        return format!(
            "<h2>{}</h2>\n<p><small>Submitted by {}</small></p>\n",
            escape(label),
            escape(&section.submitted_by)
        );
    }
    format!(
        "<h2><a href=\"{}\">{}</a></h2>\n<p><small>Submitted by {}</small></p>\n",
        escape(&section.url),
        escape(label),
        escape(&section.submitted_by)
    )
}

fn section_body(body: &SectionBody) -> String {
    match body {
        SectionBody::Summary(html) => format!("{html}\n"),
        SectionBody::ScrapeFailed(reason) => format!(
            "<p><em>This article could not be retrieved ({}). It is listed here so the \
             submission is not lost.</em></p>\n",
            escape(reason)
        ),
        SectionBody::SummaryUnavailable(reason) => format!(
            "<p><em>Summary unavailable ({}).</em></p>\n",
            escape(reason)
        ),
    }
}

/// Assemble the daily media report. Sections appear in submission order.
pub fn render_media_report(
    generated_at: DateTime<Utc>,
    synthesis: Option<&str>,
    synthesis_note: Option<&str>,
    sections: &[ArticleSection],
) -> String {
    let mut html = header("Daily Media Monitoring Report", generated_at);
    html.push_str(&format!(
        "<p>{} article(s) covered in this report.</p>\n<hr>\n",
        sections.len()
    ));

    if let Some(synthesis) = synthesis {
        html.push_str("<h2>Executive Overview</h2>\n");
        html.push_str(synthesis);
        html.push_str("\n<hr>\n");
    } else if let Some(note) = synthesis_note {
        html.push_str(&format!(
            "<p><em>Executive overview unavailable ({}).</em></p>\n<hr>\n",
            escape(note)
        ));
    }

    for section in sections {
        html.push_str(&section_heading(section));
        html.push_str(&section_body(&section.body));
    }
    html
}

/// Assemble the parliamentary questions briefing. The question block is a
/// model-produced HTML fragment; the source list below it is escaped.
pub fn render_hansard_report(
    generated_at: DateTime<Utc>,
    questions_html: &str,
    source_urls: &[String],
) -> String {
    let mut html = header("Parliamentary Questions Briefing", generated_at);
    html.push_str("<h2>Draft Questions</h2>\n");
    html.push_str(questions_html);
    html.push_str("\n<hr>\n<h2>Source Coverage</h2>\n<ul>\n");
    for url in source_urls {
        let escaped = escape(url);
        html.push_str(&format!("<li><a href=\"{escaped}\">{escaped}</a></li>\n"));
    }
    html.push_str("</ul>\n");
    html
}
