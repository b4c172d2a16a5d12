// Rover backend client over HTTP
use crate::application::telemetry_source::{LogQuery, TelemetryError, TelemetrySource};
use crate::domain::telemetry::{EnviroSample, ImagerySnapshot, LogRow};
use crate::infrastructure::locator::ServerLocator;
use crate::infrastructure::wire_mapper::{Envelope, enviro_rows, imagery_row, log_rows};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    locator: ServerLocator,
}

impl HttpTelemetrySource {
    pub fn new(locator: ServerLocator, timeout: Duration) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, locator })
    }

    async fn get_data(&self, url: Url) -> Result<Value, TelemetryError> {
        tracing::debug!(%url, "fetching");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        // The backend reports failures (including 404) inside the envelope,
        // so the body is decoded before the status is considered.
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TelemetryError::Server(format!("status {status}: {body}")));
            }
            Err(e) => return Err(TelemetryError::Malformed(e.to_string())),
        };

        envelope.into_data()
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_enviro(&self, start: i64) -> Result<Vec<EnviroSample>, TelemetryError> {
        let mut url = self.locator.url("/data/enviro");
        url.query_pairs_mut().append_pair("start", &start.to_string());

        enviro_rows(self.get_data(url).await?)
    }

    async fn fetch_imagery(&self) -> Result<Option<ImagerySnapshot>, TelemetryError> {
        let url = self.locator.url("/data/imagery");
        imagery_row(self.get_data(url).await?)
    }

    async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<LogRow>, TelemetryError> {
        let mut url = self.locator.url("/data/all");
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("start", &query.start.format(LogQuery::TIME_FORMAT).to_string())
            .append_pair("end", &query.end.format(LogQuery::TIME_FORMAT).to_string());

        log_rows(self.get_data(url).await?)
    }

    fn video_url(&self) -> Url {
        self.locator.url("/video")
    }
}
