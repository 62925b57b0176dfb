//! Turns artwork metadata into ready-to-publish post text.
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use std::fmt::Write as _;

use crate::model::{ArtworkRecord, CandidatePost, TemplateKind};

/// Renders a post for an artwork. Must succeed for any well-formed record.
pub trait PostGenerator: Send + Sync {
    fn render(&self, artwork: ArtworkRecord) -> CandidatePost;
}

static NON_TAG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

const MUSEUM: &str = "The Metropolitan Museum of Art";

const APPRECIATION: &[&str] = &[
    "A masterpiece that continues to inspire art lovers worldwide.",
    "The skillful composition and technique make this a timeless work.",
    "Notice the masterful use of light, color, and form in this piece.",
    "A stunning example of artistic excellence from this period.",
    "The attention to detail and artistic vision are truly remarkable.",
];

const QUESTIONS: &[&str] = &[
    "What emotions does this artwork evoke for you?",
    "What details do you notice first in this painting?",
    "How would you describe this work to someone who can't see it?",
    "What story do you think this painting tells?",
    "Which element of this artwork speaks to you most?",
];

/// Template-based generator. Picks a template kind at random unless one is
/// pinned.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator {
    kind: Option<TemplateKind>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(kind: TemplateKind) -> Self {
        Self { kind: Some(kind) }
    }

    fn pick_kind(&self) -> TemplateKind {
        self.kind.unwrap_or_else(|| {
            *TemplateKind::ALL
                .choose(&mut rand::thread_rng())
                .unwrap_or(&TemplateKind::DailyArtwork)
        })
    }
}

impl PostGenerator for TemplateGenerator {
    fn render(&self, artwork: ArtworkRecord) -> CandidatePost {
        let kind = self.pick_kind();
        let text = match kind {
            TemplateKind::DailyArtwork => daily_artwork(&artwork),
            TemplateKind::ArtistSpotlight => artist_spotlight(&artwork),
            TemplateKind::TechniqueFocus => technique_focus(&artwork),
            TemplateKind::PeriodContext => period_context(&artwork),
        };
        CandidatePost {
            text,
            image_url: artwork.image_url.clone(),
            link_url: artwork.link_url.clone(),
            kind,
            artwork,
        }
    }
}

/// `#Tag` from free text, or `None` if nothing taggable remains.
pub fn hashtag(text: &str) -> Option<String> {
    let tag = NON_TAG_CHARS.replace_all(text, "");
    (!tag.is_empty()).then(|| format!("#{tag}"))
}

fn pick(lines: &'static [&'static str]) -> &'static str {
    lines.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

fn daily_artwork(a: &ArtworkRecord) -> String {
    let mut post = String::from("🎨 Artwork of the Day\n\n");
    let _ = writeln!(post, "\"{}\"", a.title);
    let _ = writeln!(post, "by {}", a.artist);
    let _ = write!(post, "({})\n\n", a.date);
    let _ = write!(post, "✨ {}\n\n", pick(APPRECIATION));
    let _ = write!(post, "🏛️ {MUSEUM}\n\n");
    let _ = write!(post, "{}\n\n", pick(QUESTIONS));
    post.push_str(
        "#ArtHistory #Painting #FineArt #ClassicalArt #Museum \
         #ArtLovers #ArtAppreciation #DailyArt #MetMuseum",
    );
    post
}

fn artist_spotlight(a: &ArtworkRecord) -> String {
    let mut post = format!("👨‍🎨 Artist Spotlight: {}\n\n", a.artist);
    let _ = write!(
        post,
        "A master of {}, {} created works that continue to captivate audiences centuries later.\n\n",
        a.period.as_deref().unwrap_or("their era"),
        a.artist
    );
    let _ = write!(post, "Featured work: \"{}\" ({})\n\n", a.title, a.date);
    let _ = write!(post, "🏛️ Collection: {MUSEUM}\n\n");
    post.push_str("What draws you to this artist's work? Share your thoughts! 💭\n\n");
    let artist_tag = hashtag(&a.artist).unwrap_or_else(|| "#Artist".into());
    let _ = write!(
        post,
        "#ArtHistory {artist_tag} #ArtistSpotlight #FineArt #Painting"
    );
    post
}

fn technique_focus(a: &ArtworkRecord) -> String {
    let mut post = String::from("🖌️ Technique Spotlight\n\n");
    let _ = writeln!(post, "\"{}\"", a.title);
    let _ = write!(post, "by {} ({})\n\n", a.artist, a.date);
    let _ = write!(post, "Medium: {}\n\n", a.medium);
    post.push_str(
        "Notice the mastery in technique and composition. \
         Each brushstroke contributes to the overall impact of the piece.\n\n",
    );
    let _ = write!(post, "🏛️ {MUSEUM}\n\n");
    post.push_str("What technical aspects catch your eye? 🔍\n\n");
    post.push_str("#ArtTechnique #Painting #FineArt #ArtHistory #Museum");
    post
}

fn period_context(a: &ArtworkRecord) -> String {
    let era = a.era();
    let mut post = String::from("📖 Art History Context\n\n");
    if let Some(era) = era {
        let _ = write!(post, "Focus: {era}\n\n");
    }
    let _ = writeln!(post, "\"{}\"", a.title);
    let _ = write!(post, "by {} ({})\n\n", a.artist, a.date);
    post.push_str(
        "This work exemplifies the artistic ideals and techniques of its time. \
         Understanding the historical context enriches our appreciation of the artwork.\n\n",
    );
    let _ = write!(post, "🏛️ {MUSEUM}\n\n");
    post.push_str("What elements of the period do you notice? 🎨\n\n");
    let era_tag = era
        .and_then(hashtag)
        .unwrap_or_else(|| "#ArtMovement".into());
    let _ = write!(post, "#ArtHistory {era_tag} #FineArt #Museum #Painting");
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::artwork;

    #[test]
    fn hashtag_strips_punctuation_and_spaces() {
        assert_eq!(hashtag("J. M. W. Turner").as_deref(), Some("#JMWTurner"));
        assert_eq!(
            hashtag("Jean-Honoré Fragonard").as_deref(),
            Some("#JeanHonoréFragonard")
        );
        assert_eq!(hashtag(" .- "), None);
    }

    #[test]
    fn every_template_carries_the_artwork() {
        for kind in TemplateKind::ALL {
            let post = TemplateGenerator::with_kind(kind)
                .render(artwork(42, "Starry Night", "Vincent van Gogh"));
            assert_eq!(post.kind, kind);
            assert_eq!(post.artwork_id(), 42);
            assert_eq!(post.image_url, "https://images.example/42.jpg");
            assert!(post.text.contains("Starry Night") || post.text.contains("Vincent van Gogh"));
        }
    }

    #[test]
    fn spotlight_tags_the_artist() {
        let post = TemplateGenerator::with_kind(TemplateKind::ArtistSpotlight)
            .render(artwork(1, "Bridge", "Claude Monet"));
        assert!(post.text.contains("#ClaudeMonet"));
    }

    #[test]
    fn period_context_without_era_uses_fallback_tag() {
        let mut a = artwork(2, "Portrait", "Anonymous Painter");
        a.period = None;
        a.culture = None;
        let post = TemplateGenerator::with_kind(TemplateKind::PeriodContext).render(a);
        assert!(!post.text.contains("Focus:"));
        assert!(post.text.contains("#ArtMovement"));
    }

    #[test]
    fn random_generator_picks_a_known_kind() {
        let post = TemplateGenerator::new().render(artwork(3, "Waves", "Hokusai"));
        assert!(TemplateKind::ALL.contains(&post.kind));
    }
}
