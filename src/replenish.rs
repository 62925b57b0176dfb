//! Refilling the post queue from the search source.
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::config::{QueueSettings, TermSelection};
use crate::generator::PostGenerator;
use crate::model::{ArtworkId, CandidatePost};
use crate::retry::Backoff;
use crate::source::SearchSource;
use crate::store::UsedArtworks;

/// What one replenishment pass did. Falling short of the growth target is a
/// normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplenishReport {
    /// Search terms tried.
    pub attempts: u32,
    /// Candidates appended to the queue.
    pub generated: usize,
    /// Searches that still failed after retries.
    pub failed_searches: u32,
    pub skipped_used: usize,
    pub skipped_duplicate: usize,
    pub skipped_unusable: usize,
    /// Metadata fetches that still failed after retries.
    pub failed_fetches: usize,
}

/// Grows the queue toward its target by searching a rotation of terms.
pub struct QueueReplenisher<'a> {
    source: &'a dyn SearchSource,
    generator: &'a dyn PostGenerator,
    terms: &'a [String],
    settings: QueueSettings,
    backoff: Backoff,
}

impl<'a> QueueReplenisher<'a> {
    pub fn new(
        source: &'a dyn SearchSource,
        generator: &'a dyn PostGenerator,
        terms: &'a [String],
        settings: QueueSettings,
        backoff: Backoff,
    ) -> Self {
        Self {
            source,
            generator,
            terms,
            settings,
            backoff,
        }
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    pub fn needs_replenish(&self, queued: usize) -> bool {
        queued < self.settings.min_size
    }

    /// Append new candidates to `queue` if it is below the minimum size.
    /// Returns `None` when the queue was already long enough.
    ///
    /// `queue` must already exclude artworks in `used`.
    #[instrument(skip_all, fields(queued = queue.len()))]
    pub async fn replenish(
        &self,
        used: &UsedArtworks,
        queue: &mut Vec<CandidatePost>,
    ) -> Option<ReplenishReport> {
        if !self.needs_replenish(queue.len()) {
            debug!(min_size = self.settings.min_size, "queue above threshold");
            return None;
        }
        info!(
            queued = queue.len(),
            min_size = self.settings.min_size,
            growth = self.settings.growth,
            "queue is low; generating more posts"
        );

        let queued: HashSet<ArtworkId> = queue.iter().map(CandidatePost::artwork_id).collect();
        let (posts, report) = self.generate(used, queued).await;
        queue.extend(posts);

        info!(
            attempts = report.attempts,
            generated = report.generated,
            failed_searches = report.failed_searches,
            queued = queue.len(),
            "replenishment finished"
        );
        Some(report)
    }

    /// Produce up to `growth` candidates whose ids are neither used nor in
    /// `exclude`, spending at most `max_attempts` search terms.
    pub async fn generate(
        &self,
        used: &UsedArtworks,
        mut exclude: HashSet<ArtworkId>,
    ) -> (Vec<CandidatePost>, ReplenishReport) {
        let growth = self.settings.growth;
        let mut report = ReplenishReport::default();
        let mut posts = Vec::new();
        let mut picker = TermPicker::new(self.settings.term_selection, used.len());
        let source = self.source;
        let limit = self.settings.search_limit;
        let delay = self.settings.fetch_delay();

        while posts.len() < growth && report.attempts < self.settings.max_attempts {
            let Some(term) = picker.next(self.terms) else {
                warn!("no search terms available");
                break;
            };
            report.attempts += 1;
            debug!(term, attempt = report.attempts, "searching");

            let ids = match self
                .backoff
                .retry("search", move || source.search(term, limit))
                .await
            {
                Ok(ids) => ids,
                Err(err) => {
                    warn!(term, %err, "search failed; skipping term");
                    report.failed_searches += 1;
                    continue;
                }
            };

            for id in ids {
                if posts.len() >= growth {
                    break;
                }
                if used.contains(id) {
                    report.skipped_used += 1;
                    continue;
                }
                if !exclude.insert(id) {
                    report.skipped_duplicate += 1;
                    continue;
                }

                let record = match self
                    .backoff
                    .retry("fetch", move || source.fetch(id))
                    .await
                {
                    Ok(Some(record)) if record.is_usable() => record,
                    Ok(_) => {
                        debug!(id, "artwork not usable");
                        report.skipped_unusable += 1;
                        continue;
                    }
                    Err(err) => {
                        warn!(id, %err, "fetch failed; skipping artwork");
                        report.failed_fetches += 1;
                        continue;
                    }
                };

                let post = self.generator.render(record);
                info!(
                    id,
                    title = %post.artwork.title,
                    kind = post.kind.as_str(),
                    "generated post"
                );
                posts.push(post);

                if posts.len() < growth && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        report.generated = posts.len();
        (posts, report)
    }
}

/// Chooses the next search term.
///
/// Round-robin starts at an offset derived from how many artworks have been
/// used, so consecutive runs begin at different terms.
struct TermPicker {
    selection: TermSelection,
    cursor: usize,
}

impl TermPicker {
    fn new(selection: TermSelection, offset: usize) -> Self {
        Self {
            selection,
            cursor: offset,
        }
    }

    fn next<'t>(&mut self, terms: &'t [String]) -> Option<&'t str> {
        if terms.is_empty() {
            return None;
        }
        match self.selection {
            TermSelection::Random => terms.choose(&mut rand::thread_rng()).map(String::as_str),
            TermSelection::RoundRobin => {
                let term = &terms[self.cursor % terms.len()];
                self.cursor = self.cursor.wrapping_add(1);
                Some(term.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn round_robin_cycles_from_offset() {
        let t = terms(&["a", "b", "c"]);
        let mut picker = TermPicker::new(TermSelection::RoundRobin, 1);
        let picked: Vec<_> = (0..4).map(|_| picker.next(&t).unwrap()).collect();
        assert_eq!(picked, vec!["b", "c", "a", "b"]);
    }

    #[test]
    fn random_stays_within_terms() {
        let t = terms(&["a", "b"]);
        let mut picker = TermPicker::new(TermSelection::Random, 0);
        for _ in 0..20 {
            assert!(t.iter().any(|x| x == picker.next(&t).unwrap()));
        }
    }

    #[test]
    fn empty_terms_yield_nothing() {
        let mut picker = TermPicker::new(TermSelection::Random, 0);
        assert!(picker.next(&[]).is_none());
    }
}
