use async_trait::async_trait;
use reqwest::{Client, Url};

use super::SessionRefresher;
use crate::{GateConfig, GateError, SecretString, SessionCookiePair};

/// Response header carrying the new `_ubs` value.
pub const SIGNATURE_HEADER: &str = "x-userbin-signature";

/// Refreshes sessions over HTTP, authenticating with Basic `(app_id, api_secret)`.
#[derive(Debug, Clone)]
pub struct HttpSessionRefresher {
    client: Client,
    api_endpoint: String,
    app_id: String,
    api_secret: SecretString,
}

impl HttpSessionRefresher {
    /// Builds a refresher with its own client, bounded by the configured
    /// refresh timeout.
    ///
    /// # Errors
    ///
    /// Returns `GateError::ConfigurationError` if the HTTP client cannot be built.
    pub fn new(config: &GateConfig) -> Result<Self, GateError> {
        let client = Client::builder()
            .timeout(config.refresh_timeout())
            .build()
            .map_err(|e| GateError::ConfigurationError(format!("http client: {e}")))?;

        Ok(Self::with_client(config, client))
    }

    /// Builds a refresher on top of an existing client.
    pub fn with_client(config: &GateConfig, client: Client) -> Self {
        Self {
            client,
            api_endpoint: config.api_endpoint().to_owned(),
            app_id: config.app_id().to_owned(),
            api_secret: config.api_secret().clone(),
        }
    }

    /// `{api_endpoint}/sessions/{session_id}/refresh`, with the id escaped as
    /// a single path segment.
    pub fn refresh_url(&self, session_id: &str) -> Result<Url, GateError> {
        let mut url = Url::parse(&self.api_endpoint).map_err(|e| {
            GateError::ConfigurationError(format!("invalid api endpoint: {e}"))
        })?;

        url.path_segments_mut()
            .map_err(|()| {
                GateError::ConfigurationError("api endpoint cannot be a base url".to_owned())
            })?
            .pop_if_empty()
            .extend(["sessions", session_id, "refresh"]);

        Ok(url)
    }
}

fn transport_error(err: &reqwest::Error) -> GateError {
    if err.is_timeout() {
        GateError::Timeout
    } else {
        GateError::RefreshTransport(err.to_string())
    }
}

#[async_trait]
impl SessionRefresher for HttpSessionRefresher {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "refresh_session", skip(self), err)
    )]
    async fn refresh(&self, session_id: &str) -> Result<SessionCookiePair, GateError> {
        let url = self.refresh_url(session_id)?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.app_id, Some(self.api_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::RefreshTransport(format!(
                "refresh returned status {status}"
            )));
        }

        let signature = response
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                GateError::RefreshTransport(format!("response is missing {SIGNATURE_HEADER}"))
            })?;

        let data = response.text().await.map_err(|e| transport_error(&e))?;

        log::debug!(
            target: "userbin",
            "msg=\"session refreshed\" session_id=\"{session_id}\""
        );

        Ok(SessionCookiePair::new(data, signature))
    }
}
