//! Report orchestration: walks a run through scraping, summarization,
//! rendering, delivery and archiving. Articles only leave the pending set
//! after the delivery transport confirms acceptance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use mm_core::{
    AppConfig, ArticleStore, ContentFetcher, Error, Notifier, PendingArticle, Report,
    ReportOutcome, Result, RunStats, Summarizer, SummaryInput, SummaryMode,
};

pub mod job;
pub mod render;

pub use job::{ReportJob, ReportKind, RunState, SourceText};
pub use render::{ArticleSection, SectionBody};

pub mod prelude {
    pub use super::{ReportConfig, ReportGenerator, ReportKind};
    pub use mm_core::ReportOutcome;
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Standing recipient list; a per-request recipient is appended to it.
    pub recipients: Vec<String>,
    /// Wall-clock cap for a whole run.
    pub run_budget: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            run_budget: Duration::from_secs(300),
        }
    }
}

impl ReportConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            recipients: config.recipients.clone(),
            run_budget: config.run_budget,
        }
    }
}

/// Drives report runs over the store, fetcher, summarizer and notifier.
/// At most one run executes at a time.
pub struct ReportGenerator {
    store: Arc<dyn ArticleStore>,
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    config: ReportConfig,
    run_slot: Arc<Semaphore>,
}

impl ReportGenerator {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        fetcher: Arc<dyn ContentFetcher>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
        config: ReportConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            notifier,
            config,
            run_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Generate and deliver the daily media report. `pasted_content` is
    /// optional ad-hoc text included alongside the pending articles;
    /// `extra_recipient` is added to the standing recipient list.
    pub async fn generate_media_report(
        &self,
        pasted_content: Option<String>,
        extra_recipient: Option<String>,
    ) -> Result<ReportOutcome> {
        let _permit = self
            .run_slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::ReportInProgress)?;

        // The budget covers everything up to delivery. Once the notifier has
        // confirmed, the post-delivery steps run to completion so a late
        // expiry cannot be misreported as "nothing was sent".
        let budget = self.config.run_budget;
        let mut job =
            match tokio::time::timeout(budget, self.run_media(pasted_content, extra_recipient))
                .await
            {
                Ok(job) => job?,
                Err(_) => {
                    error!("media report run exceeded its budget");
                    return Err(Error::RunTimeout(budget.as_secs()));
                }
            };

        job.advance(RunState::Archiving);
        self.archive_reported(&mut job).await?;

        job.advance(RunState::Done);
        info!(report_id = %job.report_id, stats = ?job.stats, "media report delivered");
        Ok(ReportOutcome {
            report_id: job.report_id,
            stats: job.stats,
        })
    }

    /// Generate and deliver the parliamentary questions briefing over the
    /// current pending corpus.
    pub async fn generate_hansard_report(
        &self,
        extra_recipient: Option<String>,
    ) -> Result<ReportOutcome> {
        let _permit = self
            .run_slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::ReportInProgress)?;

        let budget = self.config.run_budget;
        let (mut job, questions_html) =
            match tokio::time::timeout(budget, self.run_hansard(extra_recipient)).await {
                Ok(result) => result?,
                Err(_) => {
                    error!("hansard report run exceeded its budget");
                    return Err(Error::RunTimeout(budget.as_secs()));
                }
            };

        // Persisting the question batch is best-effort once the briefing is
        // out the door.
        if let Err(e) = self
            .store
            .record_hansard_questions(&questions_html, "general", &job.pending_ids)
            .await
        {
            warn!("failed to persist hansard questions: {}", e);
        }

        job.advance(RunState::Archiving);
        self.archive_reported(&mut job).await?;

        job.advance(RunState::Done);
        info!(report_id = %job.report_id, stats = ?job.stats, "hansard briefing delivered");
        Ok(ReportOutcome {
            report_id: job.report_id,
            stats: job.stats,
        })
    }

    /// The timed portion of a media run: collect, scrape, summarize, render
    /// and deliver. Archiving happens in the caller, outside the budget.
    async fn run_media(
        &self,
        pasted_content: Option<String>,
        extra_recipient: Option<String>,
    ) -> Result<ReportJob> {
        let started_at = Utc::now();
        let mut job = ReportJob::new(ReportKind::Media, started_at);

        let pending = self.store.list_pending().await?;
        let ad_hoc = pasted_content.filter(|t| !t.trim().is_empty());
        if pending.is_empty() && ad_hoc.is_none() {
            return Err(Error::EmptyReport);
        }
        job.pending_ids = pending.iter().map(|a| a.id).collect();

        job.advance(RunState::Scraping);
        let sources = self.collect_sources(&pending, &mut job.stats).await;

        job.advance(RunState::Summarizing);
        let mut inputs = Vec::new();
        let mut input_for_section = Vec::with_capacity(sources.len());
        for (article, source) in &sources {
            let text = match source {
                SourceText::Pasted(text) => Some(text.clone()),
                SourceText::Scraped { text, .. } => Some(text.clone()),
                SourceText::Failed(_) => None,
            };
            match text {
                Some(text) => {
                    input_for_section.push(Some(inputs.len()));
                    inputs.push(SummaryInput {
                        text,
                        source_url: Some(article.url.clone()),
                    });
                }
                None => input_for_section.push(None),
            }
        }
        let ad_hoc_idx = ad_hoc.map(|text| {
            let idx = inputs.len();
            inputs.push(SummaryInput {
                text,
                source_url: None,
            });
            idx
        });

        let results = self
            .summarizer
            .batch_summarize(&inputs, SummaryMode::ArticleSummary)
            .await;

        let mut sections = Vec::with_capacity(sources.len() + 1);
        let mut summaries = Vec::new();
        for ((article, source), input_idx) in sources.iter().zip(&input_for_section) {
            let body = match input_idx {
                Some(idx) => match &results[*idx] {
                    Ok(html) => {
                        job.stats.summarized_ok += 1;
                        summaries.push(html.clone());
                        SectionBody::Summary(html.clone())
                    }
                    Err(e) => {
                        job.stats.summarize_failed += 1;
                        warn!(url = %article.url, "summarization failed: {}", e);
                        SectionBody::SummaryUnavailable(e.to_string())
                    }
                },
                None => {
                    let reason = match source {
                        SourceText::Failed(reason) => reason.clone(),
                        _ => "no content".to_string(),
                    };
                    SectionBody::ScrapeFailed(reason)
                }
            };
            let title = match source {
                SourceText::Scraped { title, .. } => title.clone(),
                _ => None,
            };
            sections.push(ArticleSection {
                url: article.url.clone(),
                title,
                submitted_by: article.submitted_by.clone(),
                body,
            });
        }
        if let Some(idx) = ad_hoc_idx {
            let body = match &results[idx] {
                Ok(html) => {
                    job.stats.summarized_ok += 1;
                    summaries.push(html.clone());
                    SectionBody::Summary(html.clone())
                }
                Err(e) => {
                    job.stats.summarize_failed += 1;
                    SectionBody::SummaryUnavailable(e.to_string())
                }
            };
            sections.push(ArticleSection {
                url: String::new(),
                title: Some("Pasted article".to_string()),
                submitted_by: "report trigger".to_string(),
                body,
            });
        }

        if job.stats.summarized_ok == 0 {
            return Err(Error::NoUsableContent);
        }

        // A missing overview degrades the report, it does not abort the run.
        let (synthesis, synthesis_note) = match self
            .summarizer
            .summarize(&summaries.join("\n"), SummaryMode::ReportSynthesis, None)
            .await
        {
            Ok(html) => (Some(html), None),
            Err(e) => {
                warn!("report synthesis failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        job.advance(RunState::Rendering);
        let report = Report {
            subject: job.kind.subject(started_at),
            html: render::render_media_report(
                started_at,
                synthesis.as_deref(),
                synthesis_note.as_deref(),
                &sections,
            ),
        };

        job.advance(RunState::Sending);
        let recipients = self.resolve_recipients(extra_recipient)?;
        self.notifier.send(&report, &recipients).await?;

        Ok(job)
    }

    /// The timed portion of a hansard run, through delivery. Returns the
    /// generated question block so the caller can persist it afterwards.
    async fn run_hansard(&self, extra_recipient: Option<String>) -> Result<(ReportJob, String)> {
        let started_at = Utc::now();
        let mut job = ReportJob::new(ReportKind::Hansard, started_at);

        let pending = self.store.list_pending().await?;
        if pending.is_empty() {
            return Err(Error::EmptyReport);
        }
        job.pending_ids = pending.iter().map(|a| a.id).collect();

        job.advance(RunState::Scraping);
        let sources = self.collect_sources(&pending, &mut job.stats).await;

        job.advance(RunState::Summarizing);
        let mut corpus = String::new();
        for (article, source) in &sources {
            let text = match source {
                SourceText::Pasted(text) => text,
                SourceText::Scraped { text, .. } => text,
                SourceText::Failed(_) => continue,
            };
            corpus.push_str(&format!("Source: {}\n{}\n\n", article.url, text));
        }
        if corpus.is_empty() {
            return Err(Error::NoUsableContent);
        }

        // One generation over the whole corpus. Unlike per-article summaries
        // there is no partial output worth sending, so failure is fatal.
        let questions_html = self
            .summarizer
            .summarize(&corpus, SummaryMode::HansardQuestions, None)
            .await?;
        job.stats.summarized_ok += 1;

        job.advance(RunState::Rendering);
        let source_urls: Vec<String> = sources
            .iter()
            .filter(|(_, s)| !matches!(s, SourceText::Failed(_)))
            .map(|(a, _)| a.url.clone())
            .collect();
        let report = Report {
            subject: job.kind.subject(started_at),
            html: render::render_hansard_report(started_at, &questions_html, &source_urls),
        };

        job.advance(RunState::Sending);
        let recipients = self.resolve_recipients(extra_recipient)?;
        self.notifier.send(&report, &recipients).await?;

        Ok((job, questions_html))
    }

    /// Resolve each pending article to its report text. Operator-pasted
    /// text wins over scraping; scrape failures become per-article notes.
    async fn collect_sources(
        &self,
        pending: &[PendingArticle],
        stats: &mut RunStats,
    ) -> Vec<(PendingArticle, SourceText)> {
        let urls: Vec<String> = pending
            .iter()
            .filter(|a| !a.has_content())
            .map(|a| a.url.clone())
            .collect();
        let mut fetched: HashMap<String, mm_core::ScrapeResult> =
            self.fetcher.fetch_all(&urls).await.into_iter().collect();

        let mut out = Vec::with_capacity(pending.len());
        for article in pending {
            let source = if article.has_content() {
                stats.scraped_ok += 1;
                SourceText::Pasted(article.pasted_text.clone().unwrap_or_default())
            } else {
                match fetched.remove(&article.url) {
                    Some(Ok(content)) => {
                        stats.scraped_ok += 1;
                        SourceText::Scraped {
                            title: content.title,
                            text: content.text,
                        }
                    }
                    Some(Err(failure)) => {
                        stats.scrape_failed += 1;
                        warn!(url = %article.url, "scrape failed: {}", failure);
                        SourceText::Failed(failure.to_string())
                    }
                    None => {
                        stats.scrape_failed += 1;
                        SourceText::Failed("fetch produced no result".to_string())
                    }
                }
            };
            out.push((article.clone(), source));
        }
        out
    }

    fn resolve_recipients(&self, extra: Option<String>) -> Result<Vec<String>> {
        let mut recipients = self.config.recipients.clone();
        if let Some(extra) = extra {
            let extra = extra.trim().to_string();
            if !extra.is_empty() && !recipients.contains(&extra) {
                recipients.push(extra);
            }
        }
        if recipients.is_empty() {
            return Err(Error::Config(
                "no recipients configured for this report".to_string(),
            ));
        }
        Ok(recipients)
    }

    /// Move every article covered by the delivered report into the archive.
    /// The report is already out, so any failure here is an inconsistency
    /// the operator has to review, not a retryable error.
    async fn archive_reported(&self, job: &mut ReportJob) -> Result<()> {
        if job.pending_ids.is_empty() {
            return Ok(());
        }
        match self.store.archive(&job.pending_ids).await {
            Ok(archived) => {
                job.stats.archived = archived.len();
                Ok(())
            }
            Err(e) => {
                error!(report_id = %job.report_id, "archive step failed: {}", e);
                Err(Error::ArchiveInconsistent(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use mm_core::{
        DeliveryError, ScrapeFailure, ScrapedContent, SummarizationError, SummaryResult,
    };
    use mm_storage::MemoryStore;

    struct StaticFetcher {
        pages: HashMap<String, mm_core::ScrapeResult>,
    }

    impl StaticFetcher {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
            }
        }

        fn with_page(mut self, url: &str, text: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                Ok(ScrapedContent {
                    url: url.to_string(),
                    title: Some("Title".to_string()),
                    text: text.to_string(),
                }),
            );
            self
        }

        fn with_failure(mut self, url: &str, failure: ScrapeFailure) -> Self {
            self.pages.insert(url.to_string(), Err(failure));
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> mm_core::ScrapeResult {
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(Err(ScrapeFailure::ParseEmpty))
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        fn name(&self) -> &str {
            "echo"
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
                SummaryMode::ArticleSummary => format!(
                    "<p>summary of {}</p>",
                    source_url.unwrap_or("pasted content")
                ),
                SummaryMode::ReportSynthesis => "<p>overview</p>".to_string(),
                SummaryMode::HansardQuestions => {
                    "<h3>General</h3><ol><li>To ask the Minister...</li></ol>".to_string()
                }
            })
        }
    }

    struct SleepySummarizer;

    #[async_trait]
    impl Summarizer for SleepySummarizer {
        fn name(&self) -> &str {
            "sleepy"
        }

        async fn summarize(&self, _: &str, _: SummaryMode, _: Option<&str>) -> SummaryResult {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("<p>late</p>".to_string())
        }
    }

    struct BlockingSummarizer {
        entered: Arc<tokio::sync::Notify>,
        release: Arc<Semaphore>,
    }

    #[async_trait]
    impl Summarizer for BlockingSummarizer {
        fn name(&self) -> &str {
            "blocking"
        }

        async fn summarize(&self, _: &str, _: SummaryMode, _: Option<&str>) -> SummaryResult {
            self.entered.notify_one();
            let permit = self.release.acquire().await.unwrap();
            permit.forget();
            Ok("<p>done</p>".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: AtomicUsize,
        fail_with: Option<DeliveryError>,
        last: Mutex<Option<(Report, Vec<String>)>>,
    }

    impl RecordingNotifier {
        fn failing(error: DeliveryError) -> Self {
            Self {
                fail_with: Some(error),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(
            &self,
            report: &Report,
            recipients: &[String],
        ) -> std::result::Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            *self.last.lock().unwrap() = Some((report.clone(), recipients.to_vec()));
            Ok(())
        }
    }

    /// Store whose archive step takes longer than a short run budget.
    struct SlowArchiveStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl ArticleStore for SlowArchiveStore {
        async fn submit(&self, url: &str, by: &str) -> Result<mm_core::PendingArticle> {
            self.inner.submit(url, by).await
        }

        async fn list_pending(&self) -> Result<Vec<mm_core::PendingArticle>> {
            self.inner.list_pending().await
        }

        async fn set_pasted_text(&self, id: i64, text: &str) -> Result<mm_core::PendingArticle> {
            self.inner.set_pasted_text(id, text).await
        }

        async fn remove(&self, id: i64) -> Result<()> {
            self.inner.remove(id).await
        }

        async fn archive(&self, ids: &[i64]) -> Result<Vec<mm_core::ArchivedArticle>> {
            tokio::time::sleep(self.delay).await;
            self.inner.archive(ids).await
        }

        async fn list_archive(&self) -> Result<Vec<mm_core::ArchivedArticle>> {
            self.inner.list_archive().await
        }

        async fn record_hansard_questions(
            &self,
            text: &str,
            category: &str,
            source_ids: &[i64],
        ) -> Result<()> {
            self.inner
                .record_hansard_questions(text, category, source_ids)
                .await
        }

        async fn recent_hansard_questions(
            &self,
            limit: usize,
        ) -> Result<Vec<mm_core::HansardQuestionRecord>> {
            self.inner.recent_hansard_questions(limit).await
        }

        async fn health(&self) -> Result<()> {
            self.inner.health().await
        }
    }

    /// Notifier that deletes a pending article while "delivering", to model
    /// a concurrent removal between send and archive.
    struct RacingNotifier {
        store: Arc<MemoryStore>,
        victim: i64,
    }

    #[async_trait]
    impl Notifier for RacingNotifier {
        fn name(&self) -> &str {
            "racing"
        }

        async fn send(
            &self,
            _: &Report,
            _: &[String],
        ) -> std::result::Result<(), DeliveryError> {
            self.store.remove(self.victim).await.unwrap();
            Ok(())
        }
    }

    fn config() -> ReportConfig {
        ReportConfig {
            recipients: vec!["exec@example.com".to_string()],
            run_budget: Duration::from_secs(10),
        }
    }

    fn generator(
        store: Arc<MemoryStore>,
        fetcher: StaticFetcher,
        summarizer: impl Summarizer + 'static,
        notifier: Arc<RecordingNotifier>,
    ) -> ReportGenerator {
        ReportGenerator::new(
            store,
            Arc::new(fetcher),
            Arc::new(summarizer),
            notifier,
            config(),
        )
    }

    #[tokio::test]
    async fn successful_run_archives_every_reported_article() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();
        let b = store.submit("https://news.example/b", "Bob").await.unwrap();

        let fetcher = StaticFetcher::new()
            .with_page(&a.url, "Body of article a.")
            .with_failure(&b.url, ScrapeFailure::Timeout);
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store.clone(), fetcher, EchoSummarizer, notifier.clone());

        let outcome = generator.generate_media_report(None, None).await.unwrap();

        assert!(outcome.report_id.starts_with("media_report_"));
        assert_eq!(outcome.stats.scraped_ok, 1);
        assert_eq!(outcome.stats.scrape_failed, 1);
        assert_eq!(outcome.stats.summarized_ok, 1);
        assert_eq!(outcome.stats.archived, 2);

        // Both articles left pending, including the failed scrape that the
        // report still mentions.
        assert!(store.list_pending().await.unwrap().is_empty());
        assert_eq!(store.list_archive().await.unwrap().len(), 2);

        let (report, recipients) = notifier.last.lock().unwrap().clone().unwrap();
        assert!(report.html.contains("summary of https://news.example/a"));
        assert!(report.html.contains("https://news.example/b"));
        assert!(report.html.contains("could not be retrieved"));
        assert_eq!(recipients, vec!["exec@example.com".to_string()]);
    }

    #[tokio::test]
    async fn delivery_failure_keeps_articles_pending() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::failing(DeliveryError::ConnectionFailed(
            "refused".to_string(),
        )));
        let generator = generator(store.clone(), fetcher, EchoSummarizer, notifier.clone());

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);

        assert_eq!(store.list_pending().await.unwrap().len(), 1);
        assert!(store.list_archive().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_run_sends_nothing() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store, StaticFetcher::new(), EchoSummarizer, notifier.clone());

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::EmptyReport));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_failures_abort_before_delivery() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_failure(&a.url, ScrapeFailure::HttpStatus(403));
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store.clone(), fetcher, EchoSummarizer, notifier.clone());

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::NoUsableContent));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pasted_text_wins_over_scraping() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();
        store.set_pasted_text(a.id, "Pasted body.").await.unwrap();

        // No fetcher page configured: a scrape attempt would fail.
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store, StaticFetcher::new(), EchoSummarizer, notifier.clone());

        let outcome = generator.generate_media_report(None, None).await.unwrap();
        assert_eq!(outcome.stats.scraped_ok, 1);
        assert_eq!(outcome.stats.scrape_failed, 0);
    }

    #[tokio::test]
    async fn ad_hoc_paste_alone_produces_a_report() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store.clone(), StaticFetcher::new(), EchoSummarizer, notifier.clone());

        let outcome = generator
            .generate_media_report(Some("Pasted with the trigger.".to_string()), None)
            .await
            .unwrap();
        assert_eq!(outcome.stats.summarized_ok, 1);
        assert_eq!(outcome.stats.archived, 0);

        let (report, _) = notifier.last.lock().unwrap().clone().unwrap();
        assert!(report.html.contains("Pasted article"));
    }

    #[tokio::test]
    async fn per_request_recipient_is_appended() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store, fetcher, EchoSummarizer, notifier.clone());

        generator
            .generate_media_report(None, Some("minister@example.com".to_string()))
            .await
            .unwrap();

        let (_, recipients) = notifier.last.lock().unwrap().clone().unwrap();
        assert_eq!(
            recipients,
            vec![
                "exec@example.com".to_string(),
                "minister@example.com".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn second_trigger_is_rejected_while_a_run_is_active() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(Semaphore::new(0));
        let summarizer = BlockingSummarizer {
            entered: entered.clone(),
            release: release.clone(),
        };

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = Arc::new(generator(store, fetcher, summarizer, notifier));

        let first = {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate_media_report(None, None).await })
        };
        entered.notified().await;

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::ReportInProgress));

        // Unblock the per-article summary and the synthesis call.
        release.add_permits(2);
        assert!(first.await.unwrap().is_ok());

        // The slot frees up once the run finishes.
        release.add_permits(2);
        assert!(matches!(
            generator.generate_media_report(None, None).await.unwrap_err(),
            Error::EmptyReport
        ));
    }

    #[tokio::test]
    async fn overrunning_the_budget_aborts_the_run() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = ReportGenerator::new(
            store.clone(),
            Arc::new(fetcher),
            Arc::new(SleepySummarizer),
            notifier.clone(),
            ReportConfig {
                recipients: vec!["exec@example.com".to_string()],
                run_budget: Duration::from_millis(50),
            },
        );

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::RunTimeout(_)));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn budget_expiry_after_delivery_still_archives() {
        let store = Arc::new(SlowArchiveStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(200),
        });
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = ReportGenerator::new(
            store.clone(),
            Arc::new(fetcher),
            Arc::new(EchoSummarizer),
            notifier.clone(),
            ReportConfig {
                recipients: vec!["exec@example.com".to_string()],
                run_budget: Duration::from_millis(50),
            },
        );

        // Delivery finishes well inside the budget; only the archive step is
        // slow. The run must finish cleanly rather than claim nothing was
        // sent.
        let outcome = generator.generate_media_report(None, None).await.unwrap();
        assert_eq!(outcome.stats.archived, 1);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_race_is_surfaced_as_inconsistency() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();
        let b = store.submit("https://news.example/b", "Bob").await.unwrap();

        let fetcher = StaticFetcher::new()
            .with_page(&a.url, "Body a.")
            .with_page(&b.url, "Body b.");
        let notifier = Arc::new(RacingNotifier {
            store: store.clone(),
            victim: b.id,
        });
        let generator = ReportGenerator::new(
            store.clone(),
            Arc::new(fetcher),
            Arc::new(EchoSummarizer),
            notifier,
            config(),
        );

        let err = generator.generate_media_report(None, None).await.unwrap_err();
        assert!(matches!(err, Error::ArchiveInconsistent(_)));

        // All-or-nothing archive: the surviving article stays pending.
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
        assert!(store.list_archive().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hansard_run_persists_questions_and_archives() {
        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store.clone(), fetcher, EchoSummarizer, notifier.clone());

        let outcome = generator.generate_hansard_report(None).await.unwrap();
        assert!(outcome.report_id.starts_with("hansard_report_"));
        assert_eq!(outcome.stats.archived, 1);

        let questions = store.recent_hansard_questions(5).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert!(questions[0].question_text.contains("To ask the Minister"));
        assert_eq!(questions[0].source_article_ids, vec![a.id]);

        let (report, _) = notifier.last.lock().unwrap().clone().unwrap();
        assert!(report.subject.contains("Parliamentary Questions Briefing"));
        assert!(report.html.contains("Source Coverage"));
    }

    #[tokio::test]
    async fn hansard_summarization_failure_is_fatal() {
        struct FailingSummarizer;

        #[async_trait]
        impl Summarizer for FailingSummarizer {
            fn name(&self) -> &str {
                "failing"
            }

            async fn summarize(&self, _: &str, _: SummaryMode, _: Option<&str>) -> SummaryResult {
                Err(SummarizationError::ServiceUnavailable)
            }
        }

        let store = Arc::new(MemoryStore::new());
        let a = store.submit("https://news.example/a", "Alice").await.unwrap();

        let fetcher = StaticFetcher::new().with_page(&a.url, "Body.");
        let notifier = Arc::new(RecordingNotifier::default());
        let generator = generator(store.clone(), fetcher, FailingSummarizer, notifier.clone());

        let err = generator.generate_hansard_report(None).await.unwrap_err();
        assert!(matches!(err, Error::Summarization(_)));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.list_pending().await.unwrap().len(), 1);
    }
}
