use super::{ReplicationError, RemoteStore, INCIDENTS_COLLECTION, NOTIFICATIONS_COLLECTION};
use crate::notification::Notification;
use crate::report::IncidentRecord;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub api_base_url: String,
    pub api_token: String,
}

impl RemoteConfig {
    /// Reads `KARANGUE_API_BASE_URL` and `KARANGUE_API_TOKEN`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = std::env::var("KARANGUE_API_BASE_URL")
            .map_err(|_| anyhow!("KARANGUE_API_BASE_URL missing"))?;
        let api_token = std::env::var("KARANGUE_API_TOKEN")
            .map_err(|_| anyhow!("KARANGUE_API_TOKEN missing"))?;
        Ok(Self {
            api_base_url,
            api_token,
        })
    }
}

#[derive(Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("karangue-core/0.1")
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        }
    }
}

#[derive(Deserialize)]
struct CreatedView {
    id: String,
}

#[derive(Deserialize)]
struct NotificationPage {
    #[serde(default)]
    notifications: Vec<Notification>,
}

#[derive(Deserialize)]
struct IncidentPage {
    #[serde(default)]
    incidents: Vec<IncidentRecord>,
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create_incident(
        &self,
        record: &IncidentRecord,
    ) -> Result<String, ReplicationError> {
        let url = format!("{}/api/{}", self.base_url, INCIDENTS_COLLECTION);
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(record)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(ReplicationError::Rejected {
                status: res.status().as_u16(),
            });
        }
        let created: CreatedView = res.json().await?;
        Ok(created.id)
    }

    async fn query_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, ReplicationError> {
        let url = format!("{}/api/{}", self.base_url, NOTIFICATIONS_COLLECTION);
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("user", user_id), ("sort", "-date")])
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !res.status().is_success() {
            return Err(ReplicationError::Rejected {
                status: res.status().as_u16(),
            });
        }
        let page: NotificationPage = res.json().await?;
        Ok(page.notifications)
    }

    async fn query_owned_incidents(
        &self,
        user_id: &str,
    ) -> Result<Vec<IncidentRecord>, ReplicationError> {
        let url = format!("{}/api/{}", self.base_url, INCIDENTS_COLLECTION);
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("owner", user_id)])
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !res.status().is_success() {
            return Err(ReplicationError::Rejected {
                status: res.status().as_u16(),
            });
        }
        let page: IncidentPage = res.json().await?;
        Ok(page.incidents)
    }
}
