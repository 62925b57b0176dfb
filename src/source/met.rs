use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{SearchSource, SourceError};
use crate::config::SourceSettings;
use crate::model::{ArtworkId, ArtworkRecord, UNKNOWN_ARTIST};

/// Client for The Metropolitan Museum of Art collection API.
#[derive(Clone)]
pub struct MetClient {
    http: Client,
    base_url: Url,
    department_id: Option<u32>,
}

impl fmt::Debug for MetClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetClient")
            .field("base_url", &self.base_url)
            .field("department_id", &self.department_id)
            .finish_non_exhaustive()
    }
}

impl MetClient {
    pub fn from_settings(settings: &SourceSettings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("invalid source.base_url: {}", settings.base_url))?;
        let http = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(http, base_url, settings.department_id))
    }

    pub fn with_client(http: Client, mut base_url: Url, department_id: Option<u32>) -> Self {
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            department_id,
        }
    }

    pub fn search_url(&self, term: &str) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| SourceError::Decode(format!("invalid search URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", term);
            query.append_pair("hasImages", "true");
            if let Some(department) = self.department_id {
                query.append_pair("departmentId", &department.to_string());
            }
        }
        Ok(url)
    }

    pub fn object_url(&self, id: ArtworkId) -> Result<Url, SourceError> {
        self.base_url
            .join(&format!("objects/{id}"))
            .map_err(|e| SourceError::Decode(format!("invalid object URL: {e}")))
    }
}

#[async_trait]
impl SearchSource for MetClient {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<ArtworkId>, SourceError> {
        let url = self.search_url(term)?;
        debug!(%url, "met search");
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }
        let payload: SearchResponse = res
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        let mut ids = payload.object_ids.unwrap_or_default();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn fetch(&self, id: ArtworkId) -> Result<Option<ArtworkRecord>, SourceError> {
        let url = self.object_url(id)?;
        let res = self.http.get(url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }
        let object: MetObject = res
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(object.into_record(id))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "objectIDs")]
    object_ids: Option<Vec<ArtworkId>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetObject {
    title: Option<String>,
    artist_display_name: Option<String>,
    object_date: Option<String>,
    medium: Option<String>,
    culture: Option<String>,
    period: Option<String>,
    primary_image: Option<String>,
    #[serde(rename = "objectURL")]
    object_url: Option<String>,
    department: Option<String>,
    dimensions: Option<String>,
    classification: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl MetObject {
    /// `None` when the object has no primary image.
    fn into_record(self, id: ArtworkId) -> Option<ArtworkRecord> {
        let image_url = non_empty(self.primary_image)?;
        Some(ArtworkRecord {
            object_id: id,
            title: non_empty(self.title).unwrap_or_else(|| "Untitled".into()),
            artist: non_empty(self.artist_display_name).unwrap_or_else(|| UNKNOWN_ARTIST.into()),
            date: non_empty(self.object_date).unwrap_or_else(|| "Date unknown".into()),
            medium: non_empty(self.medium).unwrap_or_else(|| "Medium unknown".into()),
            culture: non_empty(self.culture),
            period: non_empty(self.period),
            image_url,
            link_url: non_empty(self.object_url).unwrap_or_default(),
            department: non_empty(self.department),
            dimensions: non_empty(self.dimensions),
            classification: non_empty(self.classification),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(department: Option<u32>) -> MetClient {
        let base = Url::parse("https://collection.example/public/collection/v1").unwrap();
        MetClient::with_client(Client::new(), base, department)
    }

    #[test]
    fn search_url_carries_filters() {
        let url = client(Some(11)).search_url("Van Gogh").unwrap();
        assert_eq!(url.path(), "/public/collection/v1/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".into(), "Van Gogh".into())));
        assert!(pairs.contains(&("hasImages".into(), "true".into())));
        assert!(pairs.contains(&("departmentId".into(), "11".into())));

        let url = client(None).search_url("Monet").unwrap();
        assert!(url.query_pairs().all(|(k, _)| k != "departmentId"));
    }

    #[test]
    fn object_url_appends_id() {
        let url = client(None).object_url(436535).unwrap();
        assert_eq!(url.path(), "/public/collection/v1/objects/436535");
    }

    #[test]
    fn null_object_ids_is_empty() {
        let res: SearchResponse =
            serde_json::from_value(json!({ "total": 0, "objectIDs": null })).unwrap();
        assert!(res.object_ids.is_none());
    }

    #[test]
    fn maps_object_with_defaults() {
        let obj: MetObject = serde_json::from_value(json!({
            "objectID": 436535,
            "title": "Wheat Field with Cypresses",
            "artistDisplayName": "",
            "objectDate": "1889",
            "medium": "Oil on canvas",
            "culture": "",
            "period": "",
            "primaryImage": "https://images.example/DT1567.jpg",
            "objectURL": "https://www.metmuseum.org/art/collection/search/436535",
            "department": "European Paintings"
        }))
        .unwrap();
        let record = obj.into_record(436535).unwrap();
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert!(!record.is_usable());
        assert_eq!(record.culture, None);
        assert_eq!(record.department.as_deref(), Some("European Paintings"));
    }

    #[test]
    fn object_without_image_is_not_usable() {
        let obj: MetObject = serde_json::from_value(json!({
            "title": "Study",
            "artistDisplayName": "Edgar Degas",
            "primaryImage": ""
        }))
        .unwrap();
        assert!(obj.into_record(1).is_none());
    }
}
