#[cfg(test)]
#[path = "timothy_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AssistantBackend;
use crate::domain::models::AssistantReply;
use crate::domain::models::BackendVersion;
use crate::domain::models::Origin;
use crate::domain::models::ProtocolGeneration;
use crate::domain::models::TurnRequest;
use crate::domain::models::VersionResponse;

/// HTTP client for the Timothy shop-assistant backend.
pub struct Timothy {
    url: String,
    protocol: ProtocolGeneration,
    client: reqwest::Client,
}

impl Timothy {
    pub fn new(url: &str, protocol: ProtocolGeneration) -> Timothy {
        return Timothy {
            url: url.trim_end_matches('/').to_string(),
            protocol,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config() -> Result<Timothy> {
        return Ok(Timothy::new(
            &Config::get(ConfigKey::BackendURL),
            Config::protocol()?,
        ));
    }

    async fn get_version(&self, path: &str) -> Result<BackendVersion> {
        let res = self
            .client
            .get(format!("{url}{path}", url = self.url))
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::debug!(status = res.status().as_u16(), path, "Version request failed");
            bail!(format!(
                "Timothy returned status {} for {path}",
                res.status().as_u16()
            ));
        }

        let body = res.json::<VersionResponse>().await?;
        return Ok(body.version);
    }
}

#[async_trait]
impl AssistantBackend for Timothy {
    fn protocol(&self) -> ProtocolGeneration {
        return self.protocol;
    }

    #[allow(clippy::implicit_return)]
    async fn is_ready(&self) -> Result<BackendVersion> {
        return self.get_version("/is-ready").await;
    }

    #[allow(clippy::implicit_return)]
    async fn update_data(&self) -> Result<BackendVersion> {
        return self.get_version("/update-data").await;
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, request: &TurnRequest) -> Result<AssistantReply> {
        let payload = self.protocol.encode(request);
        tracing::debug!(
            protocol = self.protocol.to_string(),
            messages = request.context.len() + 1,
            use_external = request.use_external,
            "Sending message"
        );

        let res = self
            .client
            .post(format!("{url}/send/message", url = self.url))
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to send message to Timothy"
            );
            bail!(format!(
                "Timothy returned status {} for /send/message",
                res.status().as_u16()
            ));
        }

        let body = res.text().await?;
        let text = self.protocol.decode_reply(&body)?;

        let mut origin = None;
        if self.protocol.supports_external_llm() {
            origin = Some(Origin::from_preference(request.use_external));
        }

        return Ok(AssistantReply { text, origin });
    }
}
