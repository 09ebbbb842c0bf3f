//! Where the studio gets resumes from: the API first, the local cache second.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use vitae_core::print::UNTITLED;
use vitae_core::Resume;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Resolves a resume by id. `Ok(None)` means the source has no such resume.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the server can render `/print/:id` for resumes found here.
    fn serves_print_view(&self) -> bool {
        false
    }

    async fn load(&self, id: &str) -> Result<Option<Resume>, SourceError>;
}

/// A resume together with the source that produced it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub resume: Resume,
    pub origin: String,
    pub serves_print_view: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// API
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    resume: Record,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
    #[serde(default)]
    title: String,
    data: Option<Resume>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Reads `GET /api/v1/resumes/:id`.
#[derive(Clone)]
pub struct ApiSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl ResumeSource for ApiSource {
    fn name(&self) -> &str {
        "api"
    }

    fn serves_print_view(&self) -> bool {
        true
    }

    async fn load(&self, id: &str) -> Result<Option<Resume>, SourceError> {
        let url = format!(
            "{}/api/v1/resumes/{}",
            self.base_url,
            urlencoding::encode(id)
        );
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: RecordEnvelope = response.json().await?;
        Ok(from_record(envelope.resume))
    }
}

/// The record's own id and title win over whatever `data` carries.
fn from_record(record: Record) -> Option<Resume> {
    let data = record.data?;
    let mut resume = data.with_id(record.id);
    if resume.display_name().is_none() {
        resume.name = if record.title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            record.title
        };
    }
    Some(resume)
}

// ────────────────────────────────────────────────────────────────────────────
// Local cache
// ────────────────────────────────────────────────────────────────────────────

/// A JSON array of resumes on disk, newest first.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every cached resume. A missing file is an empty cache.
    pub async fn load_all(&self) -> Result<Vec<Resume>, SourceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the cached copy of `resume`, or inserts it at the front, and
    /// returns what was stored. Every save is a mutation: the stored copy's
    /// `updated_at` is later than both the incoming and the previously cached one.
    pub async fn save(&self, resume: &Resume) -> Result<Resume, SourceError> {
        let mut all = self.load_all().await?;
        let mut stored = resume.clone();
        let position = all.iter().position(|r| r.id() == resume.id());
        if let Some(existing) = position.map(|i| &all[i]) {
            stored.updated_at = stored.updated_at.max(existing.updated_at);
        }
        stored.touch(Utc::now().timestamp_millis());
        match position {
            Some(i) => all[i] = stored.clone(),
            None => all.insert(0, stored.clone()),
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&all)?).await?;
        debug!(
            "Cached resume {} in {} (updated_at {})",
            stored.id(),
            self.path.display(),
            stored.updated_at
        );
        Ok(stored)
    }
}

#[async_trait]
impl ResumeSource for LocalCache {
    fn name(&self) -> &str {
        "local cache"
    }

    async fn load(&self, id: &str) -> Result<Option<Resume>, SourceError> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id() == id))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chain
// ────────────────────────────────────────────────────────────────────────────

/// Tries each source in order. A failing source is logged and skipped.
pub struct ChainSource {
    sources: Vec<Box<dyn ResumeSource>>,
}

impl ChainSource {
    pub fn new(sources: Vec<Box<dyn ResumeSource>>) -> Self {
        Self { sources }
    }

    /// Like [`ResumeSource::load`], but also reports which source answered.
    pub async fn resolve(&self, id: &str) -> Result<Option<Resolved>, SourceError> {
        for source in &self.sources {
            match source.load(id).await {
                Ok(Some(resume)) => {
                    info!("Resolved resume {id} from {}", source.name());
                    return Ok(Some(Resolved {
                        resume,
                        origin: source.name().to_string(),
                        serves_print_view: source.serves_print_view(),
                    }));
                }
                Ok(None) => debug!("Resume {id} not in {}", source.name()),
                Err(e) => warn!("Loading resume {id} from {} failed: {e}", source.name()),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ResumeSource for ChainSource {
    fn name(&self) -> &str {
        "chain"
    }

    async fn load(&self, id: &str) -> Result<Option<Resume>, SourceError> {
        Ok(self.resolve(id).await?.map(|resolved| resolved.resume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl ResumeSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self, _id: &str) -> Result<Option<Resume>, SourceError> {
            Err(SourceError::Api {
                status: 503,
                message: "down".into(),
            })
        }
    }

    /// Answers like the API for a single known id.
    struct Server(&'static str);

    #[async_trait]
    impl ResumeSource for Server {
        fn name(&self) -> &str {
            "server"
        }

        fn serves_print_view(&self) -> bool {
            true
        }

        async fn load(&self, id: &str) -> Result<Option<Resume>, SourceError> {
            Ok((id == self.0).then(|| Resume::new(id)))
        }
    }

    #[test]
    fn test_record_id_and_title_backfill() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": "srv-1",
            "title": "Backend CV",
            "data": { "id": "local-9", "name": "  ", "skills": ["Rust"] }
        }))
        .unwrap();
        let resume = from_record(record).unwrap();
        assert_eq!(resume.id(), "srv-1");
        assert_eq!(resume.name, "Backend CV");
        assert_eq!(resume.skills, vec!["Rust".to_string()]);
    }

    #[test]
    fn test_record_without_data_is_absent() {
        let record: Record =
            serde_json::from_value(serde_json::json!({ "id": "x", "title": "t", "data": null }))
                .unwrap();
        assert!(from_record(record).is_none());
    }

    #[tokio::test]
    async fn test_cache_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("nested").join("resumes.v1.json"));
        assert!(cache.load("r1").await.unwrap().is_none());

        let mut resume = Resume::new("r1");
        resume.name = "Jane".into();
        cache.save(&resume).await.unwrap();
        resume.name = "Jane Doe".into();
        cache.save(&resume).await.unwrap();
        cache.save(&Resume::new("r2")).await.unwrap();

        let all = cache.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), "r2");
        assert_eq!(cache.load("r1").await.unwrap().unwrap().name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_cache_save_bumps_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("resumes.v1.json"));

        let mut resume = Resume::new("r1");
        resume.updated_at = 1_000;
        let first = cache.save(&resume).await.unwrap();
        assert!(first.updated_at > 1_000);

        // Saving the stale in-memory copy again still moves the stamp forward.
        resume.name = "Jane".into();
        let second = cache.save(&resume).await.unwrap();
        assert!(second.updated_at > first.updated_at);

        // A copy stamped in the future is bumped past its own value.
        let mut ahead = second.clone();
        ahead.updated_at = i64::MAX / 2;
        let third = cache.save(&ahead).await.unwrap();
        assert_eq!(third.updated_at, i64::MAX / 2 + 1);

        let cached = cache.load("r1").await.unwrap().unwrap();
        assert_eq!(cached.updated_at, third.updated_at);
        assert_eq!(cached.name, "Jane");
    }

    #[tokio::test]
    async fn test_chain_skips_failing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("resumes.v1.json"));
        cache.save(&Resume::new("r1")).await.unwrap();

        let chain = ChainSource::new(vec![Box::new(Failing), Box::new(cache)]);
        assert!(chain.load("r1").await.unwrap().is_some());
        assert!(chain.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_reports_cache_only_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("resumes.v1.json"));
        cache.save(&Resume::new("draft-1")).await.unwrap();
        cache.save(&Resume::new("srv-1")).await.unwrap();

        let chain = ChainSource::new(vec![Box::new(Server("srv-1")), Box::new(cache)]);

        let stored = chain.resolve("srv-1").await.unwrap().unwrap();
        assert_eq!(stored.origin, "server");
        assert!(stored.serves_print_view);

        let draft = chain.resolve("draft-1").await.unwrap().unwrap();
        assert_eq!(draft.origin, "local cache");
        assert!(!draft.serves_print_view);
        assert_eq!(draft.resume.id(), "draft-1");
    }
}
