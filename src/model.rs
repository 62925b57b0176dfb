use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Source-assigned artwork identifier (Met `objectID`).
pub type ArtworkId = u64;

/// Artist name the source reports when attribution is missing.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Metadata for a single artwork as returned by the search source.
///
/// Field names match the queue file written by earlier versions of the
/// poster so an existing `generated_posts.json` keeps loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtworkRecord {
    pub object_id: ArtworkId,
    pub title: String,
    pub artist: String,
    pub date: String,
    pub medium: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub culture: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub period: Option<String>,
    pub image_url: String,
    #[serde(rename = "museum_url")]
    pub link_url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub dimensions: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub classification: Option<String>,
}

impl ArtworkRecord {
    /// A record is postable only with an image and a known artist.
    pub fn is_usable(&self) -> bool {
        let artist = self.artist.trim();
        !self.image_url.trim().is_empty() && !artist.is_empty() && artist != UNKNOWN_ARTIST
    }

    /// Period if known, falling back to culture.
    pub fn era(&self) -> Option<&str> {
        self.period.as_deref().or(self.culture.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    DailyArtwork,
    ArtistSpotlight,
    TechniqueFocus,
    PeriodContext,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::DailyArtwork,
        TemplateKind::ArtistSpotlight,
        TemplateKind::TechniqueFocus,
        TemplateKind::PeriodContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::DailyArtwork => "daily_artwork",
            TemplateKind::ArtistSpotlight => "artist_spotlight",
            TemplateKind::TechniqueFocus => "technique_focus",
            TemplateKind::PeriodContext => "period_context",
        }
    }
}

/// A rendered post waiting in the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidatePost {
    #[serde(rename = "post_text")]
    pub text: String,
    pub image_url: String,
    pub link_url: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(rename = "artwork_details")]
    pub artwork: ArtworkRecord,
}

impl CandidatePost {
    pub fn artwork_id(&self) -> ArtworkId {
        self.artwork.object_id
    }
}

/// One line of the posting audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostingLogEntry {
    #[serde(deserialize_with = "log_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub post_id: String,
    pub object_id: ArtworkId,
    pub title: String,
    pub artist: String,
}

impl PostingLogEntry {
    pub fn for_post(post_id: &str, post: &CandidatePost) -> Self {
        Self {
            timestamp: Utc::now(),
            post_id: post_id.to_string(),
            object_id: post.artwork.object_id,
            title: post.artwork.title.clone(),
            artist: post.artwork.artist.clone(),
        }
    }
}

/// RFC 3339, or the offset-less ISO form older logs were written with.
/// Offset-less values are local wall-clock time.
fn log_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive)))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
