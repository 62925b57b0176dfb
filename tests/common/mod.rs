#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use daily_art_poster::config::{QueueSettings, TermSelection};
use daily_art_poster::generator::{PostGenerator, TemplateGenerator};
use daily_art_poster::model::{ArtworkId, ArtworkRecord, CandidatePost, TemplateKind, UNKNOWN_ARTIST};
use daily_art_poster::publisher::Publisher;
use daily_art_poster::retry::Backoff;
use daily_art_poster::source::{SearchSource, SourceError};

pub fn artwork(id: ArtworkId, title: &str, artist: &str) -> ArtworkRecord {
    ArtworkRecord {
        object_id: id,
        title: title.into(),
        artist: artist.into(),
        date: "1889".into(),
        medium: "Oil on canvas".into(),
        culture: None,
        period: Some("Post-Impressionism".into()),
        image_url: format!("https://images.example/{id}.jpg"),
        link_url: format!("https://museum.example/objects/{id}"),
        department: Some("European Paintings".into()),
        dimensions: None,
        classification: None,
    }
}

pub fn post(id: ArtworkId, title: &str) -> CandidatePost {
    TemplateGenerator::with_kind(TemplateKind::DailyArtwork).render(artwork(id, title, "Vincent van Gogh"))
}

pub fn posts(ids: impl IntoIterator<Item = ArtworkId>) -> Vec<CandidatePost> {
    ids.into_iter().map(|id| post(id, &format!("Work {id}"))).collect()
}

pub fn ids(posts: &[CandidatePost]) -> Vec<ArtworkId> {
    posts.iter().map(CandidatePost::artwork_id).collect()
}

/// Defaults from the configuration, with no politeness delay and
/// deterministic term order.
pub fn settings() -> QueueSettings {
    QueueSettings {
        fetch_delay_ms: 0,
        term_selection: TermSelection::RoundRobin,
        ..QueueSettings::default()
    }
}

pub fn no_wait() -> Backoff {
    Backoff::new(3, Duration::ZERO)
}

pub fn terms(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// In-memory collection. Terms map to id lists; ids map to records, or to
/// `None` for objects without an image.
#[derive(Clone, Default)]
pub struct FakeSource {
    results: HashMap<String, Vec<ArtworkId>>,
    objects: HashMap<ArtworkId, Option<ArtworkRecord>>,
    search_errors: Arc<Mutex<VecDeque<SourceError>>>,
    fetch_errors: Arc<Mutex<VecDeque<SourceError>>>,
    always_fail_search: bool,
    searches: Arc<Mutex<Vec<String>>>,
    fetches: Arc<Mutex<Vec<ArtworkId>>>,
}

pub fn bad_gateway() -> SourceError {
    SourceError::Status {
        status: StatusCode::BAD_GATEWAY,
        body: "upstream unavailable".into(),
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            always_fail_search: true,
            ..Self::default()
        }
    }

    pub fn with_term(mut self, term: &str, ids: &[ArtworkId]) -> Self {
        self.results.insert(term.to_string(), ids.to_vec());
        self
    }

    pub fn with_artwork(mut self, record: ArtworkRecord) -> Self {
        self.objects.insert(record.object_id, Some(record));
        self
    }

    pub fn with_painter(self, id: ArtworkId) -> Self {
        self.with_artwork(artwork(id, &format!("Painting {id}"), "Rembrandt van Rijn"))
    }

    pub fn with_unknown_artist(self, id: ArtworkId) -> Self {
        self.with_artwork(artwork(id, &format!("Anonymous {id}"), UNKNOWN_ARTIST))
    }

    pub fn with_no_image(mut self, id: ArtworkId) -> Self {
        self.objects.insert(id, None);
        self
    }

    pub async fn fail_next_search(&self, err: SourceError) {
        self.search_errors.lock().await.push_back(err);
    }

    pub async fn fail_next_fetch(&self, err: SourceError) {
        self.fetch_errors.lock().await.push_back(err);
    }

    pub async fn searches(&self) -> Vec<String> {
        self.searches.lock().await.clone()
    }

    pub async fn fetches(&self) -> Vec<ArtworkId> {
        self.fetches.lock().await.clone()
    }
}

#[async_trait]
impl SearchSource for FakeSource {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<ArtworkId>, SourceError> {
        self.searches.lock().await.push(term.to_string());
        if self.always_fail_search {
            return Err(bad_gateway());
        }
        if let Some(err) = self.search_errors.lock().await.pop_front() {
            return Err(err);
        }
        let mut ids = self.results.get(term).cloned().unwrap_or_default();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn fetch(&self, id: ArtworkId) -> Result<Option<ArtworkRecord>, SourceError> {
        self.fetches.lock().await.push(id);
        if let Some(err) = self.fetch_errors.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.objects.get(&id).cloned().flatten())
    }
}

#[derive(Debug, Clone)]
pub struct PublishCall {
    pub image_url: String,
    pub caption: String,
}

/// Publisher that records calls and answers from a scripted list,
/// defaulting to sequential post ids once the script runs out.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<Mutex<Vec<PublishCall>>>,
    reject_credentials: bool,
}

impl RecordingPublisher {
    pub fn with_responses(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub fn rejecting_credentials() -> Self {
        Self {
            reject_credentials: true,
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn verify(&self) -> Result<()> {
        if self.reject_credentials {
            return Err(anyhow!("invalid OAuth access token"));
        }
        Ok(())
    }

    async fn publish(&self, image_url: &str, caption: &str) -> Result<String> {
        let mut calls = self.calls.lock().await;
        calls.push(PublishCall {
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        });
        let n = calls.len();
        drop(calls);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(format!("post-{n}")))
    }
}
