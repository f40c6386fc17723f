use async_trait::async_trait;

use mm_core::{SummarizationError, Summarizer, SummaryMode, SummaryResult};

/// Offline summarizer for local development and tests. Produces deterministic
/// output shaped like the real provider's, with no network calls.
#[derive(Debug, Default)]
pub struct LocalSummarizer;

impl LocalSummarizer {
    pub fn new() -> Self {
        Self
    }
}

/// First `n` sentences of `text`, whitespace-normalized.
fn leading_sentences(text: &str, n: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::new();
    let mut count = 0;
    for chunk in normalized.split_inclusive(['.', '!', '?']) {
        out.push_str(chunk);
        count += 1;
        if count >= n {
            break;
        }
    }
    out.trim().to_string()
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    fn name(&self) -> &str {
        "local"
    }

    async fn summarize(
        &self,
        text: &str,
        mode: SummaryMode,
        source_url: Option<&str>,
    ) -> SummaryResult {
        if text.trim().is_empty() {
            return Err(SummarizationError::EmptyInput);
        }

        Ok(match mode {
            SummaryMode::ArticleSummary => {
                let lead = leading_sentences(text, 3);
                match source_url {
                    Some(url) => format!("<p><a href=\"{url}\">Source</a> reports that {lead}</p>"),
                    None => format!("<p>A pasted article reports that {lead}</p>"),
                }
            }
            SummaryMode::ReportSynthesis => {
                "<p>Local mode synthesis: the monitored coverage centres on a small number \
                 of recurring themes. See the individual article summaries below for \
                 details.</p>"
                    .to_string()
            }
            SummaryMode::HansardQuestions => "<h3>General</h3>\
                 <ol><li>To ask the Minister what assessment has been made of the matters \
                 raised in recent media coverage, and what steps the department plans to \
                 take in response.</li></ol>"
                .to_string(),
        })
    }
}
