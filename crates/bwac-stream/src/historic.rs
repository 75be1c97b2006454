//! Historic AIS download.
//!
//! For every day window in the requested range, the vessels seen in any of
//! the [`NORWAY_AREAS`] are collected and their tracks are written with a
//! [`TrackWriter`].

use std::collections::BTreeSet;

use bwac_auth::AccessTokenManager;
use bwac_models::{day_intervals, format_query_time, PositionReport};
use bwac_storage::TrackWriter;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, info_span, Instrument};

use crate::areas::{Area, NORWAY_AREAS};
use crate::config::StreamConfig;
use crate::error::{IngestError, IngestResult};
use crate::metrics;

/// Log a progress line every this many vessels within a window.
const VESSEL_PROGRESS_EVERY: usize = 100;

/// Totals of one [`HistoricClient::download`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub windows: usize,
    pub vessels: usize,
    pub records: usize,
}

/// Client for the historic query endpoints.
pub struct HistoricClient {
    http: Client,
    base_url: String,
    tokens: AccessTokenManager,
}

impl HistoricClient {
    pub fn new(config: &StreamConfig, tokens: AccessTokenManager) -> IngestResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("bwac/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.historic_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    async fn bearer(&mut self) -> IngestResult<String> {
        self.tokens.acquire(false).await?;
        Ok(self.tokens.access_token()?.to_owned())
    }

    /// Vessels reporting inside `area` between `from` and `to`.
    pub async fn query_mmsis_in_area(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        area: &Area,
    ) -> IngestResult<Vec<u64>> {
        let token = self.bearer().await?;
        let url = format!("{}/mmsiinarea", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&area_query(from, to, area))
            .send()
            .await?;

        let mmsis: Vec<u64> = decode(url, response).await?;
        debug!(area = area.name, vessels = mmsis.len(), "Queried vessels in area");
        Ok(mmsis)
    }

    /// Union of the vessels in every predefined area, sorted and deduplicated.
    pub async fn query_all_mmsis(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> IngestResult<Vec<u64>> {
        let mut mmsis = BTreeSet::new();
        for area in NORWAY_AREAS {
            mmsis.extend(self.query_mmsis_in_area(from, to, area).await?);
        }
        Ok(mmsis.into_iter().collect())
    }

    /// Track of one vessel, as returned by the provider (newest first).
    pub async fn query_track(
        &mut self,
        mmsi: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> IngestResult<Vec<PositionReport>> {
        let token = self.bearer().await?;
        let url = format!(
            "{}/tracks/{}/{}/{}",
            self.base_url,
            mmsi,
            from.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            to.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        );

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        decode(url, response).await
    }

    /// Download every vessel track between `from` and `to`, one day window
    /// at a time.
    pub async fn download(
        &mut self,
        writer: &TrackWriter,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> IngestResult<DownloadSummary> {
        let mut summary = DownloadSummary::default();

        for (start, end) in day_intervals(from, to) {
            let span = info_span!("historic_window", from = %start, to = %end);
            let (vessels, records) = self.download_window(writer, start, end).instrument(span).await?;

            summary.windows += 1;
            summary.vessels += vessels;
            summary.records += records;
        }

        info!(
            windows = summary.windows,
            vessels = summary.vessels,
            records = summary.records,
            output_dir = %writer.root().display(),
            "Historic download finished"
        );
        Ok(summary)
    }

    async fn download_window(
        &mut self,
        writer: &TrackWriter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> IngestResult<(usize, usize)> {
        let mmsis = self.query_all_mmsis(start, end).await?;
        info!(vessels = mmsis.len(), "Downloading tracks");

        let mut records = 0;
        for (done, mmsi) in mmsis.iter().enumerate() {
            let track = self.query_track(*mmsi, start, end).await?;
            let written = writer.save_track(&track).await?;
            metrics::record_written("historic", written as u64);
            records += written;

            if (done + 1) % VESSEL_PROGRESS_EVERY == 0 {
                info!(done = done + 1, total = mmsis.len(), records, "Track progress");
            }
        }

        Ok((mmsis.len(), records))
    }
}

/// Request body for `mmsiinarea`.
pub fn area_query(from: DateTime<Utc>, to: DateTime<Utc>, area: &Area) -> Value {
    json!({
        "polygon": {
            "coordinates": [area.ring],
            "type": "Polygon",
        },
        "msgTimeFrom": format_query_time(&from),
        "msgTimeTo": format_query_time(&to),
    })
}

async fn decode<T: DeserializeOwned>(url: String, response: Response) -> IngestResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::HttpStatus {
            url,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| IngestError::protocol(format!("invalid response from {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::find_area;
    use chrono::TimeZone;

    #[test]
    fn test_area_query_body() {
        let from = Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 7, 24, 12, 30, 0).unwrap();
        let area = find_area("oslofjord").unwrap();

        let body = area_query(from, to, area);

        assert_eq!(body["polygon"]["type"], "Polygon");
        assert_eq!(body["polygon"]["coordinates"][0][1][0], 8.485531852850272);
        assert_eq!(body["polygon"]["coordinates"][0].as_array().unwrap().len(), 4);
        assert_eq!(body["msgTimeFrom"], "2025-07-24T00:00:00.000000Z");
        assert_eq!(body["msgTimeTo"], "2025-07-24T12:30:00.000000Z");
    }
}
