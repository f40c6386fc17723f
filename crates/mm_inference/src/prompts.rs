//! Prompt text and generation profiles for each summary mode.

use mm_core::SummaryMode;

pub const ARTICLE_SUMMARY_SYSTEM: &str = "\
You are a media monitoring analyst. Summarize the article below in a single \
neutral paragraph of 3 to 5 sentences, written for a busy executive. Capture \
who did what, the key figures or claims, and any stated government or \
industry response. Do not editorialize and do not speculate beyond the text.

Output exactly one HTML paragraph and nothing else. Start the paragraph with \
a source attribution link in this form:
<p><a href=\"ARTICLE_URL\">Source</a> reports that ...</p>
When the outlet is BBC News, write the attribution as \
<a href=\"ARTICLE_URL\">BBC News</a> instead of the word Source. If no URL \
is provided, begin with <p>A pasted article reports that ...</p> instead.";

pub const REPORT_SYNTHESIS_SYSTEM: &str = "\
You are a media monitoring analyst writing the executive overview of a daily \
report. You receive the individual article summaries already written for the \
report. Produce 2 to 4 HTML paragraphs that identify the common themes, \
points of tension between sources, and anything an executive should act on. \
Refer to outlets by name rather than repeating the per-article summaries. \
Output only the HTML paragraphs, no heading and no preamble.";

pub const HANSARD_QUESTIONS_SYSTEM: &str = "\
You are drafting parliamentary questions from a corpus of recent media \
coverage. For each distinct issue in the corpus, write one formal question \
addressed to the responsible minister, in the register used on the order \
paper (\"To ask the Minister ...\"). Group the questions under a short \
category heading per issue. Output HTML: an <h3> per category followed by an \
ordered list <ol> of questions. Only raise matters actually reported in the \
corpus.";

pub fn system_instruction(mode: SummaryMode) -> &'static str {
    match mode {
        SummaryMode::ArticleSummary => ARTICLE_SUMMARY_SYSTEM,
        SummaryMode::ReportSynthesis => REPORT_SYNTHESIS_SYSTEM,
        SummaryMode::HansardQuestions => HANSARD_QUESTIONS_SYSTEM,
    }
}

/// Build the user half of the prompt for one request.
pub fn render_user_prompt(mode: SummaryMode, text: &str, source_url: Option<&str>) -> String {
    match mode {
        SummaryMode::ArticleSummary => match source_url {
            Some(url) => format!("Article URL: {url}\n\nArticle Text: {text}"),
            None => format!("Pasted Article\n\nArticle Text: {text}"),
        },
        SummaryMode::ReportSynthesis => {
            format!("Per-article summaries for today's report:\n\n{text}")
        }
        SummaryMode::HansardQuestions => format!("Media corpus:\n\n{text}"),
    }
}

/// Sampling parameters per mode. Summaries stay conservative; question
/// drafting gets a little more room.
#[derive(Debug, Clone, Copy)]
pub struct GenerationProfile {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

pub fn generation_profile(mode: SummaryMode) -> GenerationProfile {
    match mode {
        SummaryMode::ArticleSummary => GenerationProfile {
            temperature: 0.2,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 512,
        },
        SummaryMode::ReportSynthesis => GenerationProfile {
            temperature: 0.3,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 1024,
        },
        SummaryMode::HansardQuestions => GenerationProfile {
            temperature: 0.4,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_prompt_carries_source_url() {
        let prompt = render_user_prompt(
            SummaryMode::ArticleSummary,
            "Body text.",
            Some("https://news.example/a"),
        );
        assert!(prompt.starts_with("Article URL: https://news.example/a"));
        assert!(prompt.contains("Body text."));
    }

    #[test]
    fn pasted_article_prompt_has_no_url_line() {
        let prompt = render_user_prompt(SummaryMode::ArticleSummary, "Body text.", None);
        assert!(prompt.starts_with("Pasted Article"));
        assert!(!prompt.contains("Article URL"));
    }

    #[test]
    fn each_mode_has_its_own_instruction() {
        let a = system_instruction(SummaryMode::ArticleSummary);
        let s = system_instruction(SummaryMode::ReportSynthesis);
        let h = system_instruction(SummaryMode::HansardQuestions);
        assert_ne!(a, s);
        assert_ne!(s, h);
        assert!(h.contains("parliamentary"));
    }
}
