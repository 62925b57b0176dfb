//! One run: load state, top up the queue, publish the head, commit.
//!
//! Commit order is used-set, then log, then queue. If the process stops
//! after the used-set write but before the queue write, the stale head is
//! dropped by the next run's load filter instead of being published again.
use std::fmt;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::model::{ArtworkId, CandidatePost, PostingLogEntry};
use crate::publisher::Publisher;
use crate::replenish::{QueueReplenisher, ReplenishReport};
use crate::store::{pop_head, StateStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Loading,
    Replenishing,
    Selecting,
    Publishing,
    Committing,
    Done,
    /// Terminal state of a run that ended without finishing its commit.
    Aborted,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Loading => "loading",
            RunPhase::Replenishing => "replenishing",
            RunPhase::Selecting => "selecting",
            RunPhase::Publishing => "publishing",
            RunPhase::Committing => "committing",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run ended without publishing (or without finishing its commit).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("publisher credentials check failed: {0:#}")]
    Credentials(anyhow::Error),
    #[error("no posts available in queue")]
    NoPostsAvailable,
    #[error("publishing artwork {object_id} failed: {error:#}")]
    Publish {
        object_id: ArtworkId,
        error: anyhow::Error,
    },
    #[error("state I/O failed while {phase}: {source}")]
    Store {
        phase: RunPhase,
        #[source]
        source: StoreError,
    },
}

impl RunError {
    fn store(phase: RunPhase) -> impl FnOnce(StoreError) -> RunError {
        move |source| {
            error!(
                phase = %RunPhase::Aborted,
                failed_in = %phase,
                err = %source,
                "state I/O failed"
            );
            RunError::Store { phase, source }
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub post_id: String,
    pub post_url: Option<String>,
    pub object_id: ArtworkId,
    pub title: String,
    pub artist: String,
    /// Posts left in the queue after the commit.
    pub remaining: usize,
    /// Present when the queue was replenished during this run.
    pub replenish: Option<ReplenishReport>,
}

pub struct DailyPostOrchestrator<'a> {
    store: &'a StateStore,
    replenisher: &'a QueueReplenisher<'a>,
    publisher: &'a dyn Publisher,
}

impl<'a> DailyPostOrchestrator<'a> {
    pub fn new(
        store: &'a StateStore,
        replenisher: &'a QueueReplenisher<'a>,
        publisher: &'a dyn Publisher,
    ) -> Self {
        Self {
            store,
            replenisher,
            publisher,
        }
    }

    /// Execute one publish cycle.
    ///
    /// Every persisted write is a checkpoint: a failure or kill at any point
    /// leaves state the next run can continue from.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), publisher = self.publisher.name()))]
    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        // Nothing is worth doing if we cannot publish.
        if let Err(err) = self.publisher.verify().await {
            error!(phase = %RunPhase::Aborted, err = %format!("{err:#}"), "publisher credentials rejected");
            return Err(RunError::Credentials(err));
        }

        let mut phase = RunPhase::Loading;
        let queue_store = self.store.queue();
        let mut used = self.store.load_used().await.map_err(RunError::store(phase))?;
        let mut log = self.store.load_log().await.map_err(RunError::store(phase))?;
        let loaded = queue_store.load().await.map_err(RunError::store(phase))?;
        let mut queue = drop_used(loaded, |id| used.contains(id));
        info!(
            queued = queue.posts.len(),
            used = used.len(),
            logged = log.len(),
            "state loaded"
        );

        phase = RunPhase::Replenishing;
        let replenish = self.replenisher.replenish(&used, &mut queue.posts).await;
        if replenish.is_some() || queue.stale > 0 {
            queue_store
                .save(&queue.posts)
                .await
                .map_err(RunError::store(phase))?;
        }

        phase = RunPhase::Selecting;
        let Some((head, rest)) = pop_head(queue.posts) else {
            error!(
                phase = %RunPhase::Aborted,
                failed_in = %phase,
                "no posts available in queue; check the search source and term database"
            );
            return Err(RunError::NoPostsAvailable);
        };

        phase = RunPhase::Publishing;
        let object_id = head.artwork_id();
        info!(
            %phase,
            object_id,
            title = %head.artwork.title,
            artist = %head.artwork.artist,
            date = %head.artwork.date,
            kind = head.kind.as_str(),
            "publishing today's artwork"
        );
        let post_id = match self.publisher.publish(&head.image_url, &head.text).await {
            Ok(post_id) => post_id,
            Err(error) => {
                error!(
                    phase = %RunPhase::Aborted,
                    failed_in = %phase,
                    object_id,
                    error = %format!("{error:#}"),
                    "publish failed; queue left unchanged"
                );
                return Err(RunError::Publish { object_id, error });
            }
        };
        info!(object_id, post_id = %post_id, "published");

        phase = RunPhase::Committing;
        used.add(object_id).await.map_err(RunError::store(phase))?;
        log.append(PostingLogEntry::for_post(&post_id, &head))
            .await
            .map_err(RunError::store(phase))?;
        queue_store
            .save(&rest)
            .await
            .map_err(RunError::store(phase))?;

        phase = RunPhase::Done;
        let outcome = RunOutcome {
            post_url: self.publisher.post_url(&post_id),
            post_id,
            object_id,
            title: head.artwork.title,
            artist: head.artwork.artist,
            remaining: rest.len(),
            replenish,
        };
        info!(%phase, post_id = %outcome.post_id, remaining = outcome.remaining, "run complete");
        Ok(outcome)
    }
}

/// Loaded queue after removing entries whose artwork is already used.
struct FilteredQueue {
    posts: Vec<CandidatePost>,
    stale: usize,
}

fn drop_used(loaded: Vec<CandidatePost>, is_used: impl Fn(ArtworkId) -> bool) -> FilteredQueue {
    let before = loaded.len();
    let posts: Vec<CandidatePost> = loaded
        .into_iter()
        .filter(|post| !is_used(post.artwork_id()))
        .collect();
    let stale = before - posts.len();
    if stale > 0 {
        warn!(stale, "dropped queued posts for artworks already published");
    }
    FilteredQueue { posts, stale }
}
