//! Destinations for buffered progress patches.

use async_trait::async_trait;
use reqwest::header::COOKIE;

use super::{ProgressError, ProgressPatch};
use crate::{Result, api::KID_COOKIE};

/// Where a [`ProgressBuffer`](super::ProgressBuffer) delivers flushed patches.
#[async_trait]
pub trait ProgressSink: Send + Sync + std::fmt::Debug {
    async fn send(&self, lesson_id: i64, patch: ProgressPatch) -> Result<()>;
}

/// Posts patches to a KidSpark server as the logged-in kid.
#[derive(Clone)]
pub struct HttpProgressSink {
    client: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl HttpProgressSink {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session_token)
    }

    /// Use a preconfigured client. Its timeout is the only one applied.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session_token: session_token.into(),
        }
    }

    fn progress_url(&self, lesson_id: i64) -> String {
        format!("{}/api/learn/progress/{lesson_id}", self.base_url)
    }
}

impl std::fmt::Debug for HttpProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProgressSink")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProgressSink for HttpProgressSink {
    async fn send(&self, lesson_id: i64, patch: ProgressPatch) -> Result<()> {
        let response = self
            .client
            .post(self.progress_url(lesson_id))
            .header(COOKIE, format!("{KID_COOKIE}={}", self.session_token))
            .json(&patch)
            .send()
            .await
            .map_err(|e| ProgressError::SendFailed {
                lesson_id,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProgressError::SendFailed {
                lesson_id,
                reason: format!("server returned {status}"),
            }
            .into());
        }
        Ok(())
    }
}
