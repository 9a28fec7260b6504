// =============================================================================
// LINE push notifier — outbound message transport
// =============================================================================
//
// External collaborator at the pipeline's egress boundary. Delivery failures
// are reported as `NotificationFailure`; the caller logs and moves on — no
// retry, and storage mutations are never rolled back (persistence and
// notification are not transactional with each other).

use serde_json::json;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

const PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

pub struct LineNotifier {
    channel_token: String,
    user_id: String,
    push_url: String,
    client: reqwest::Client,
}

impl LineNotifier {
    pub fn new(channel_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            channel_token: channel_token.into(),
            user_id: user_id.into(),
            push_url: PUSH_URL.to_string(),
            client,
        }
    }

    #[cfg(test)]
    fn with_push_url(mut self, url: impl Into<String>) -> Self {
        self.push_url = url.into();
        self
    }

    /// Push a text message, optionally followed by an image.
    pub async fn push(&self, message: &str, image_url: Option<&str>) -> Result<()> {
        let mut messages = vec![json!({ "type": "text", "text": message })];
        if let Some(url) = image_url {
            messages.push(json!({
                "type": "image",
                "originalContentUrl": url,
                "previewImageUrl": url,
            }));
        }

        let body = json!({ "to": self.user_id, "messages": messages });
        debug!(messages = messages.len(), "sending LINE push");

        let resp = self
            .client
            .post(&self.push_url)
            .bearer_auth(&self.channel_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::NotificationFailure(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::NotificationFailure(format!(
                "LINE API returned {status}: {text}"
            )));
        }

        info!("LINE push sent");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_notification_failure() {
        let notifier =
            LineNotifier::new("token", "user").with_push_url("http://127.0.0.1:1/push");
        let err = notifier.push("hello", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotificationFailure(_)));
    }
}
