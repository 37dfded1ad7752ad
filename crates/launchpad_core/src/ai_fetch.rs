//! crates/launchpad_core/src/ai_fetch.rs
//!
//! Periodically asks a generative text model for new product listings, drops
//! the ones already stored under the same name, attaches a generated-image URL
//! and stores the rest.
//!
//! The job never fails from the scheduler's point of view. Every degraded path
//! is reported through [`FetchOutcome`] instead.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::domain::NewAiProduct;
use crate::ports::{DatabaseService, TextGenerationService};

pub const LISTINGS_PROMPT: &str = r#"
Return ONLY valid JSON.
Generate 5 realistic NEW tech products launched today.

Format:
[
  {
    "name": "",
    "tagline": "",
    "description": "",
    "website": ""
  }
]

NO MARKDOWN, NO EXTRA TEXT.
"#;

/// Value of the `source` field on every listing this job writes.
pub const AI_SOURCE_TAG: &str = "gemini";

const IMAGE_ENDPOINT: &str = "https://image.pollinations.ai/prompt/";
const IMAGE_PROMPT_SUFFIX: &str = "futuristic tech product render, high quality, ultra realistic";
const IMAGE_WIDTH: u32 = 800;
const IMAGE_HEIGHT: u32 = 600;
const IMAGE_MODEL: &str = "flux";

// First '[' through the last ']', across newlines.
static JSON_ARRAY: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]"));

/// A listing as proposed by the model. Every field is optional because model
/// output is not trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCandidate {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

impl ProductCandidate {
    /// Reads one array element. Scalars are taken as text; anything that is not
    /// an object yields `None`.
    fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| match fields.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        Some(Self {
            name: text("name"),
            tagline: text("tagline"),
            description: text("description"),
            website: text("website"),
        })
    }
}

/// The usable elements of the model's array, plus how many were not objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateBatch {
    pub candidates: Vec<ProductCandidate>,
    pub malformed: usize,
}

/// Per-run counters for a fetch that got as far as a candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Array elements returned by the model, malformed ones included.
    pub candidates: usize,
    pub added: usize,
    pub duplicates: usize,
    pub skipped_unnamed: usize,
    pub malformed: usize,
    /// Candidates whose duplicate check, image URL or insert failed.
    pub failed: usize,
}

/// How a fetch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// No text-API credential is configured; nothing was attempted.
    MissingCredential,
    /// The text API call failed.
    UpstreamFailed(String),
    /// The model answered, but no JSON array could be read from it.
    Unparseable(String),
    Completed(FetchReport),
}

impl FetchOutcome {
    pub fn added(&self) -> usize {
        match self {
            FetchOutcome::Completed(report) => report.added,
            _ => 0,
        }
    }
}

/// Pulls the candidate array out of free-form model output. Only a missing or
/// invalid array fails; bad elements are counted and skipped.
pub fn parse_candidates(raw: &str) -> Result<CandidateBatch, String> {
    let pattern = JSON_ARRAY
        .as_ref()
        .map_err(|e| format!("array pattern failed to compile: {e}"))?;
    let array_text = pattern
        .find(raw)
        .ok_or_else(|| "model output contains no JSON array".to_string())?
        .as_str();
    let elements: Vec<Value> =
        serde_json::from_str(array_text).map_err(|e| format!("invalid candidate array: {e}"))?;

    let mut batch = CandidateBatch::default();
    for element in &elements {
        match ProductCandidate::from_value(element) {
            Some(candidate) => batch.candidates.push(candidate),
            None => batch.malformed += 1,
        }
    }
    Ok(batch)
}

/// Builds the image-generation URL for a listing. The image itself is never fetched.
pub fn image_url(name: &str, tagline: &str) -> Result<String, url::ParseError> {
    let prompt = format!("{name} {tagline} {IMAGE_PROMPT_SUFFIX}");
    let mut url = Url::parse(IMAGE_ENDPOINT)?;
    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push(&prompt);
    url.query_pairs_mut()
        .append_pair("width", &IMAGE_WIDTH.to_string())
        .append_pair("height", &IMAGE_HEIGHT.to_string())
        .append_pair("model", IMAGE_MODEL)
        .append_pair("nologo", "true");
    Ok(url.into())
}

#[derive(Clone)]
pub struct AiContentFetcher {
    db: Arc<dyn DatabaseService>,
    /// `None` when no credential is configured.
    text: Option<Arc<dyn TextGenerationService>>,
}

impl AiContentFetcher {
    pub fn new(db: Arc<dyn DatabaseService>, text: Option<Arc<dyn TextGenerationService>>) -> Self {
        Self { db, text }
    }

    pub async fn run(&self) -> FetchOutcome {
        info!("Running AI product fetch.");
        let Some(text) = &self.text else {
            error!("Generative text credential missing; AI fetch skipped.");
            return FetchOutcome::MissingCredential;
        };

        let raw = match text.generate_text(LISTINGS_PROMPT).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Generative text call failed: {}", e);
                return FetchOutcome::UpstreamFailed(e.to_string());
            }
        };

        let batch = match parse_candidates(&raw) {
            Ok(batch) => batch,
            Err(reason) => {
                warn!("No usable listings in model output: {}", reason);
                return FetchOutcome::Unparseable(reason);
            }
        };
        if batch.malformed > 0 {
            warn!("Skipped {} malformed listing(s) in model output.", batch.malformed);
        }

        let report = self.store_candidates(batch).await;
        info!(
            "AI products added: {} (duplicates {}, unnamed {}, malformed {}, failed {}).",
            report.added, report.duplicates, report.skipped_unnamed, report.malformed, report.failed
        );
        FetchOutcome::Completed(report)
    }

    /// Processes candidates in order. Names are stored trimmed, so the duplicate
    /// check sees every earlier write, including ones from this batch. A store
    /// failure on one candidate is logged and counted, and the run moves on.
    async fn store_candidates(&self, batch: CandidateBatch) -> FetchReport {
        let mut report = FetchReport {
            candidates: batch.candidates.len() + batch.malformed,
            malformed: batch.malformed,
            ..FetchReport::default()
        };

        for candidate in batch.candidates {
            let Some(name) = candidate
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
            else {
                report.skipped_unnamed += 1;
                continue;
            };

            match self.db.ai_product_name_exists(&name).await {
                Ok(true) => {
                    report.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!("Duplicate check for '{}' failed: {}", name, e);
                    report.failed += 1;
                    continue;
                }
            }

            let tagline = candidate.tagline.unwrap_or_default();
            let image = match image_url(&name, &tagline) {
                Ok(image) => image,
                Err(e) => {
                    error!("Image URL for '{}' could not be built: {}", name, e);
                    report.failed += 1;
                    continue;
                }
            };
            let listing = NewAiProduct {
                image,
                name,
                tagline,
                description: candidate.description.unwrap_or_default(),
                website: candidate.website.unwrap_or_default(),
                source: AI_SOURCE_TAG.to_string(),
            };

            match self.db.insert_ai_product(listing).await {
                Ok(_) => report.added += 1,
                Err(e) => {
                    error!("Storing AI product failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AiProduct, DailyRanking, NewDailyRanking, NewNotification, Notification, Product,
        UserProfile,
    };
    use crate::memory::InMemoryStore;
    use crate::ports::{MockTextGenerationService, PortError, PortResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    /// Rejects inserts of one listing name and delegates everything else.
    struct RejectingStore {
        inner: InMemoryStore,
        rejected_name: &'static str,
    }

    #[async_trait]
    impl DatabaseService for RejectingStore {
        async fn get_product(&self, product_id: &str) -> PortResult<Option<Product>> {
            self.inner.get_product(product_id).await
        }
        async fn list_published_products_launched_between(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> PortResult<Vec<Product>> {
            self.inner.list_published_products_launched_between(start, end).await
        }
        async fn insert_notification(&self, n: NewNotification) -> PortResult<Notification> {
            self.inner.insert_notification(n).await
        }
        async fn put_daily_ranking(&self, r: NewDailyRanking) -> PortResult<DailyRanking> {
            self.inner.put_daily_ranking(r).await
        }
        async fn get_daily_ranking(&self, date_id: &str) -> PortResult<Option<DailyRanking>> {
            self.inner.get_daily_ranking(date_id).await
        }
        async fn ai_product_name_exists(&self, name: &str) -> PortResult<bool> {
            self.inner.ai_product_name_exists(name).await
        }
        async fn insert_ai_product(&self, product: NewAiProduct) -> PortResult<AiProduct> {
            if product.name == self.rejected_name {
                return Err(PortError::Unexpected("write rejected".to_string()));
            }
            self.inner.insert_ai_product(product).await
        }
        async fn get_user(&self, uid: &str) -> PortResult<Option<UserProfile>> {
            self.inner.get_user(uid).await
        }
        async fn resolve_auth_token(&self, token: &str) -> PortResult<Option<String>> {
            self.inner.resolve_auth_token(token).await
        }
    }

    fn fetcher_answering(store: &InMemoryStore, answer: &'static str) -> AiContentFetcher {
        let mut text = MockTextGenerationService::new();
        text.expect_generate_text()
            .returning(move |_| Ok(answer.to_string()));
        AiContentFetcher::new(Arc::new(store.clone()), Some(Arc::new(text)))
    }

    #[test]
    fn extracts_array_from_chatty_output() {
        let raw = "Sure! Here you go:\n```json\n[{\"name\": \"Orbit\", \"tagline\": \"Go\"}]\n```";
        let batch = parse_candidates(raw).unwrap();

        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.candidates[0].name.as_deref(), Some("Orbit"));
        assert_eq!(batch.candidates[0].website, None);
        assert_eq!(batch.malformed, 0);
    }

    #[test]
    fn bad_elements_do_not_discard_the_batch() {
        let raw = r#"["just a string", {"name": "Tally", "tagline": 42}, 7, {"name": "Beam"}]"#;
        let batch = parse_candidates(raw).unwrap();

        assert_eq!(batch.malformed, 2);
        let names: Vec<_> = batch.candidates.iter().map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Tally"), Some("Beam")]);
        assert_eq!(batch.candidates[0].tagline.as_deref(), Some("42"));
    }

    #[test]
    fn output_without_brackets_is_unparseable() {
        assert!(parse_candidates("I cannot help with that.").is_err());
        assert!(parse_candidates("[not json]").is_err());
    }

    #[test]
    fn image_url_encodes_prompt_and_fixed_parameters() {
        let raw = image_url("Acme Widget", "Fast").unwrap();
        let url = Url::parse(&raw).unwrap();

        assert_eq!(url.host_str(), Some("image.pollinations.ai"));
        assert!(url.path().starts_with("/prompt/Acme%20Widget%20Fast%20futuristic%20tech"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("width".to_string(), "800".to_string()),
                ("height".to_string(), "600".to_string()),
                ("model".to_string(), "flux".to_string()),
                ("nologo".to_string(), "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn new_candidate_is_stored_with_image_url() {
        let store = InMemoryStore::new();
        let fetcher = fetcher_answering(
            &store,
            r#"[{"name":"Acme Widget","tagline":"Fast","description":"","website":""}]"#,
        );

        let outcome = fetcher.run().await;
        assert_eq!(outcome.added(), 1);

        let stored = store.ai_products().await;
        assert_eq!(stored.len(), 1);
        let product = &stored[0];
        assert_eq!(product.name, "Acme Widget");
        assert_eq!(product.source, "gemini");
        assert!(Url::parse(&product.image).is_ok());
        assert!(product.image.contains("Acme"));
        assert!(product.image.contains("Widget"));
    }

    #[tokio::test]
    async fn duplicate_names_are_written_once_across_runs() {
        let store = InMemoryStore::new();
        let fetcher = fetcher_answering(&store, r#"[{"name":"A"},{"name":"A"},{"tagline":"nameless"}]"#);

        let first = fetcher.run().await;
        let second = fetcher.run().await;

        assert_eq!(
            first,
            FetchOutcome::Completed(FetchReport {
                candidates: 3,
                added: 1,
                duplicates: 1,
                skipped_unnamed: 1,
                malformed: 0,
                failed: 0,
            })
        );
        assert_eq!(second.added(), 0);
        assert_eq!(store.ai_products().await.len(), 1);
    }

    #[tokio::test]
    async fn padded_names_match_existing_trimmed_records() {
        let store = InMemoryStore::new();
        fetcher_answering(&store, r#"[{"name":"Nova"}]"#).run().await;

        let outcome = fetcher_answering(&store, r#"[{"name":"  Nova  "}]"#).run().await;

        assert_eq!(outcome.added(), 0);
        assert_eq!(store.ai_products().await.len(), 1);
    }

    #[tokio::test]
    async fn padded_duplicates_in_one_batch_are_written_once() {
        let store = InMemoryStore::new();
        let outcome = fetcher_answering(&store, r#"[{"name":" A"},{"name":" A"},{"name":"   "}]"#)
            .run()
            .await;

        assert_eq!(outcome.added(), 1);
        let names: Vec<_> = store.ai_products().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn padded_name_blocks_later_plain_name() {
        let store = InMemoryStore::new();
        fetcher_answering(&store, r#"[{"name":"Nova "}]"#).run().await;

        let outcome = fetcher_answering(&store, r#"[{"name":"Nova"}]"#).run().await;

        assert_eq!(outcome.added(), 0);
        let names: Vec<_> = store.ai_products().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Nova".to_string()]);
    }

    #[tokio::test]
    async fn malformed_elements_are_counted_and_the_rest_stored() {
        let store = InMemoryStore::new();
        let outcome = fetcher_answering(&store, r#"["oops", {"name":"Kite","website":"https://kite.dev"}]"#)
            .run()
            .await;

        match outcome {
            FetchOutcome::Completed(report) => {
                assert_eq!(report.candidates, 2);
                assert_eq!(report.malformed, 1);
                assert_eq!(report.added, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.ai_products().await[0].website, "https://kite.dev");
    }

    #[tokio::test]
    async fn prose_answer_completes_with_nothing_added() {
        let store = InMemoryStore::new();
        let outcome = fetcher_answering(&store, "No products today, sorry.").run().await;

        assert!(matches!(outcome, FetchOutcome::Unparseable(_)));
        assert!(store.ai_products().await.is_empty());
    }

    #[tokio::test]
    async fn upstream_error_degrades_to_empty_run() {
        let store = InMemoryStore::new();
        let mut text = MockTextGenerationService::new();
        text.expect_generate_text()
            .returning(|_| Err(PortError::Unexpected("quota exceeded".to_string())));
        let fetcher = AiContentFetcher::new(Arc::new(store.clone()), Some(Arc::new(text)));

        let outcome = fetcher.run().await;

        assert_eq!(
            outcome,
            FetchOutcome::UpstreamFailed("An unexpected error occurred: quota exceeded".to_string())
        );
        assert!(store.ai_products().await.is_empty());
    }

    #[tokio::test]
    async fn missing_credential_skips_the_call() {
        let store = InMemoryStore::new();
        let fetcher = AiContentFetcher::new(Arc::new(store.clone()), None);

        assert_eq!(fetcher.run().await, FetchOutcome::MissingCredential);
    }

    #[tokio::test]
    async fn failed_insert_does_not_stop_later_candidates() {
        let store = InMemoryStore::new();
        let rejecting = RejectingStore {
            inner: store.clone(),
            rejected_name: "Broken",
        };
        let mut text = MockTextGenerationService::new();
        text.expect_generate_text()
            .returning(|_| Ok(r#"[{"name":"Broken"},{"name":"Fine"}]"#.to_string()));
        let fetcher = AiContentFetcher::new(Arc::new(rejecting), Some(Arc::new(text)));

        let outcome = fetcher.run().await;

        match outcome {
            FetchOutcome::Completed(report) => {
                assert_eq!(report.added, 1);
                assert_eq!(report.failed, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let names: Vec<_> = store.ai_products().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Fine".to_string()]);
    }
}
