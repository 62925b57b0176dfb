use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::Publisher;
use crate::config::FacebookSettings;

/// Posts photos to a Facebook page through the Graph API.
#[derive(Clone)]
pub struct FacebookPublisher {
    http: Client,
    base_url: Url,
    page_id: String,
    token: String,
}

impl fmt::Debug for FacebookPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookPublisher")
            .field("base_url", &self.base_url)
            .field("page_id", &self.page_id)
            .finish_non_exhaustive()
    }
}

impl FacebookPublisher {
    /// `base_url` is the versioned Graph root, e.g. `https://graph.facebook.com/v21.0/`.
    pub fn new(base_url: Url, page_id: String, token: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("daily-art-poster/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            page_id,
            token,
        })
    }

    /// Build from settings, exchanging a user token for the page token when
    /// no page token is configured.
    pub async fn connect(settings: &FacebookSettings) -> Result<Self> {
        let base_url = graph_base(settings)?;
        if !settings.page_access_token.trim().is_empty() {
            return Self::new(
                base_url,
                settings.page_id.clone(),
                settings.page_access_token.clone(),
            );
        }
        let mut publisher = Self::new(
            base_url,
            settings.page_id.clone(),
            settings.user_access_token.clone(),
        )?;
        publisher.token = publisher.exchange_user_token().await?;
        info!(page_id = %publisher.page_id, "obtained page access token");
        Ok(publisher)
    }

    pub fn build_photo_request(&self, image_url: &str, caption: &str) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("{}/photos", self.page_id))
            .context("invalid Graph base URL")?;
        self.http
            .post(endpoint)
            .form(&[
                ("url", image_url),
                ("message", caption),
                ("published", "true"),
                ("access_token", self.token.as_str()),
            ])
            .build()
            .context("failed to build Graph request")
    }

    /// Look up the page token for `page_id` among the pages the user manages.
    async fn exchange_user_token(&self) -> Result<String> {
        let url = self
            .base_url
            .join("me/accounts")
            .context("invalid Graph base URL")?;
        let res = self
            .http
            .get(url)
            .query(&[("access_token", self.token.as_str())])
            .send()
            .await
            .context("failed to reach Graph API")?;
        let body = read_graph_response(res).await?;
        let accounts: AccountsResponse =
            serde_json::from_str(&body).context("invalid /me/accounts response")?;
        accounts
            .data
            .into_iter()
            .find(|page| page.id == self.page_id)
            .map(|page| page.access_token)
            .ok_or_else(|| anyhow!("page {} is not managed by this user token", self.page_id))
    }
}

fn graph_base(settings: &FacebookSettings) -> Result<Url> {
    let root = Url::parse(&settings.graph_url)
        .with_context(|| format!("invalid graph_url: {}", settings.graph_url))?;
    root.join(&format!("{}/", settings.graph_version.trim_matches('/')))
        .context("invalid graph_version")
}

async fn read_graph_response(res: reqwest::Response) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read Graph response")?;
    if !status.is_success() {
        let message = serde_json::from_str::<GraphErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(anyhow!("graph error {}: {}", status, message));
    }
    Ok(body)
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn name(&self) -> &'static str {
        "facebook"
    }

    #[instrument(skip_all, fields(page_id = %self.page_id))]
    async fn verify(&self) -> Result<()> {
        let url = self
            .base_url
            .join(&self.page_id)
            .context("invalid Graph base URL")?;
        let res = self
            .http
            .get(url)
            .query(&[("fields", "id,name"), ("access_token", self.token.as_str())])
            .send()
            .await
            .context("failed to reach Graph API")?;
        let body = read_graph_response(res)
            .await
            .context("page credentials rejected")?;
        let page: PageResponse = serde_json::from_str(&body).context("invalid page response")?;
        info!(page = %page.name.unwrap_or_default(), "facebook credentials ok");
        Ok(())
    }

    async fn publish(&self, image_url: &str, caption: &str) -> Result<String> {
        let request = self.build_photo_request(image_url, caption)?;
        debug!(url = %request.url(), image_url, "posting photo");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Graph API")?;
        let body = read_graph_response(res).await?;
        let payload: PhotoResponse =
            serde_json::from_str(&body).context("invalid Graph photo response")?;
        Ok(payload.id)
    }

    fn post_url(&self, post_id: &str) -> Option<String> {
        Some(format!("https://facebook.com/{post_id}"))
    }
}

#[derive(Deserialize)]
struct PhotoResponse {
    id: String,
}

#[derive(Deserialize)]
struct PageResponse {
    name: Option<String>,
}

#[derive(Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    data: Vec<ManagedPage>,
}

#[derive(Deserialize)]
struct ManagedPage {
    id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct GraphErrorResponse {
    error: GraphError,
}

#[derive(Deserialize)]
struct GraphError {
    message: String,
}
