/*
 * Sewer::Forecast, rainfall driven sewer capacity forecasting
 * Copyright (C) 2025 Athaariq A. Ramadhani <foss@athaariq.my.id>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::time::Duration;

use chrono::NaiveDateTime;
use parse_datetime::parse_datetime;
use tracing::{debug, warn};

use super::typedef::*;
use crate::config::SourceConfig;
use crate::error::{ForecastError, Result};
use crate::pipeline::ForecastSeries;

const TIMESTAMP_FORMATS: [&str; 4] = [
	"%Y-%m-%dT%H:%M",
	"%Y-%m-%dT%H:%M:%S",
	"%Y-%m-%d %H:%M:%S",
	"%Y-%m-%d %H:%M",
];

// Wall-clock time as written, anything exotic goes through parse_datetime
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
	let raw = raw.trim();
	TIMESTAMP_FORMATS
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
		.or_else(|| parse_datetime(raw).ok().map(|found| found.naive_local()))
}

pub fn build_url(config: &SourceConfig, horizon: ForecastHorizon) -> String {
	format!(
		"{}?latitude={}&longitude={}&minutely_15=precipitation&past_days={}&forecast_days={}",
		config.base_url,
		config.latitude,
		config.longitude,
		config.past_days,
		horizon.days()
	)
}

pub fn parse_response(json: &str) -> Result<ForecastSeries> {
	let response: OpenMeteoResponse =
		serde_json::from_str(json).map_err(|err| ForecastError::Parse(err.to_string()))?;

	if response.error {
		return Err(ForecastError::Parse(
			response
				.reason
				.unwrap_or_else(|| String::from("Endpoint reported an error")),
		));
	}

	let data = response
		.minutely_15
		.ok_or_else(|| ForecastError::Parse(String::from("Response has no minutely_15 block")))?;

	if data.time.len() != data.precipitation.len() {
		return Err(ForecastError::MisalignedSeries {
			times: data.time.len(),
			values: data.precipitation.len(),
		});
	}

	let points = data
		.time
		.iter()
		.zip(data.precipitation)
		.map(|(time, precipitation)| {
			let timestamp = parse_timestamp(time)
				.ok_or_else(|| ForecastError::Parse(format!("Unreadable timestamp \"{}\"", time)))?;

			// Missing readings count as a dry quarter hour
			Ok((timestamp, precipitation.unwrap_or_default()))
		})
		.collect::<Result<Vec<_>>>()?;

	ForecastSeries::new(points)
}

#[derive(Clone, Debug)]
pub struct ForecastSource {
	config: SourceConfig,
	client: reqwest::Client,
}

impl ForecastSource {
	pub fn new(config: SourceConfig) -> Result<Self> {
		let client = reqwest::Client::builder()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self { config, client })
	}

	pub fn config(&self) -> &SourceConfig {
		&self.config
	}

	// One day of lookback plus the horizon, no retries
	pub async fn fetch(&self, horizon: ForecastHorizon) -> Result<ForecastSeries> {
		let url = build_url(&self.config, horizon);
		let timeout_secs = self.config.timeout_secs;

		let request = async {
			let response = self.client.get(&url).send().await?;
			let status = response.status();
			if !status.is_success() {
				return Err(ForecastError::Status(status.as_u16()));
			}

			let text = response.text().await?;
			Ok::<ForecastSeries, ForecastError>(parse_response(&text)?)
		};

		let series = match tokio::time::timeout(Duration::from_secs(timeout_secs), request).await {
			Ok(result) => result,
			Err(_) => Err(ForecastError::Timeout(timeout_secs)),
		}
		.inspect_err(|err| warn!(%url, %err, "Forecast fetch failed"))?;

		debug!(%url, points = series.len(), "Forecast fetched");
		Ok(series)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{NaiveDate, TimeDelta};

	const SAMPLE: &str = r#"{
		"latitude": 51.56,
		"longitude": 4.58,
		"minutely_15_units": {"time": "iso8601", "precipitation": "mm"},
		"minutely_15": {
			"time": ["2023-12-17T00:00", "2023-12-17T00:15", "2023-12-17T00:30"],
			"precipitation": [0.0, 0.4, null]
		}
	}"#;

	#[test]
	fn url_carries_location_and_horizon() {
		let url = build_url(&SourceConfig::default(), ForecastHorizon::SevenDays);
		assert_eq!(
			url,
			"https://api.open-meteo.com/v1/forecast?latitude=51.55202&longitude=4.586668&minutely_15=precipitation&past_days=1&forecast_days=7"
		);
	}

	#[test]
	fn response_becomes_a_quarter_hour_series() {
		let series = parse_response(SAMPLE).unwrap();
		let start = NaiveDate::from_ymd_opt(2023, 12, 17)
			.unwrap()
			.and_hms_opt(0, 0, 0)
			.unwrap();

		assert_eq!(series.interval(), Some(TimeDelta::minutes(15)));
		assert_eq!(
			series.points(),
			&[
				(start, 0.0),
				(start + TimeDelta::minutes(15), 0.4),
				(start + TimeDelta::minutes(30), 0.0),
			]
		);
	}

	#[test]
	fn misaligned_arrays_are_rejected() {
		let json = r#"{"minutely_15": {"time": ["2023-12-17T00:00"], "precipitation": [0.1, 0.2]}}"#;
		assert!(matches!(
			parse_response(json),
			Err(ForecastError::MisalignedSeries {
				times: 1,
				values: 2
			})
		));
	}

	#[test]
	fn endpoint_error_reason_is_kept() {
		let json = r#"{"error": true, "reason": "Latitude must be in range of -90 to 90°."}"#;
		match parse_response(json) {
			Err(ForecastError::Parse(reason)) => assert!(reason.starts_with("Latitude")),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn malformed_json_is_a_parse_error() {
		assert!(matches!(
			parse_response("<html>"),
			Err(ForecastError::Parse(_))
		));
	}

	#[test]
	fn timestamps_in_common_layouts() {
		let expected = NaiveDate::from_ymd_opt(2022, 1, 1)
			.unwrap()
			.and_hms_opt(8, 0, 0)
			.unwrap();
		assert_eq!(parse_timestamp("2022-01-01T08:00"), Some(expected));
		assert_eq!(parse_timestamp("2022-01-01 08:00:00"), Some(expected));
		assert_eq!(parse_timestamp(" 2022-01-01T08:00:00 "), Some(expected));
		assert_eq!(parse_timestamp("#####"), None);
	}

	#[tokio::test]
	async fn unreachable_endpoint_is_an_error() {
		let source = ForecastSource::new(SourceConfig {
			base_url: String::from("http://127.0.0.1:9/v1/forecast"),
			timeout_secs: 5,
			..Default::default()
		})
		.unwrap();

		assert!(source.fetch(ForecastHorizon::OneDay).await.is_err());
	}
}
