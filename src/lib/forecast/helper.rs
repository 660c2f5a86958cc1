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

use std::sync::Arc;

use tracing::{error, info, warn};

use super::typedef::*;
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::model::{Artifacts, CapacityModel, FeatureScaler};
use crate::pipeline::{build_features, predict_autoregressive, FeatureTable, ForecastSeries};
use crate::source::{ForecastHorizon, ForecastSource};

pub(crate) fn summarize(points: Vec<ForecastPoint>) -> ForecastReport {
	let [high_peak, low_peak] = points.iter().fold(
		[Option::<&ForecastPoint>::None; 2],
		|[last_max, last_min], each| {
			let max = match last_max {
				Some(found) if found.capacity_percentage >= each.capacity_percentage => found,
				_ => each,
			};
			let min = match last_min {
				Some(found) if found.capacity_percentage <= each.capacity_percentage => found,
				_ => each,
			};

			[Some(max), Some(min)]
		},
	);

	let [high_peak, low_peak] = [high_peak.cloned(), low_peak.cloned()];

	ForecastReport {
		points,
		high_peak,
		low_peak,
	}
}

fn to_points(table: &FeatureTable, predictions: &[f64]) -> Vec<ForecastPoint> {
	table
		.timestamps
		.iter()
		.zip(&table.rows)
		.zip(predictions)
		.map(|((timestamp, row), prediction)| ForecastPoint {
			timestamp: *timestamp,
			capacity_percentage: *prediction,
			rainfall: row.rainfall_current,
		})
		.collect()
}

#[derive(Debug)]
pub struct ForecastService<S, M> {
	artifacts: Arc<Artifacts<S, M>>,
	config: PipelineConfig,
}

// Clones share the loaded artifacts
impl<S, M> Clone for ForecastService<S, M> {
	fn clone(&self) -> Self {
		Self {
			artifacts: Arc::clone(&self.artifacts),
			config: self.config.clone(),
		}
	}
}

impl<S, M> ForecastService<S, M>
where
	S: FeatureScaler + Send + Sync + 'static,
	M: CapacityModel + Send + Sync + 'static,
{
	pub fn new(artifacts: Artifacts<S, M>, config: PipelineConfig) -> Self {
		Self {
			artifacts: Arc::new(artifacts),
			config,
		}
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	// Synchronous from feature derivation to the last prediction
	pub fn run(&self, series: &ForecastSeries) -> Result<ForecastReport> {
		let mut table = build_features(series, &self.config)?;
		let predictions =
			predict_autoregressive(&mut table, &self.artifacts.scaler, &self.artifacts.model)?;

		Ok(summarize(to_points(&table, &predictions)))
	}

	// A failed fetch is the "no data" state, only pipeline failures are errors.
	// Consumes the service, the prediction itself runs on a blocking thread.
	pub async fn forecast(
		self,
		source: &ForecastSource,
		horizon: ForecastHorizon,
	) -> Result<ForecastReport> {
		let series = match source.fetch(horizon).await {
			Ok(ok) => ok,
			Err(err) => {
				warn!(%horizon, %err, "No forecast data, returning an empty report");
				return Ok(ForecastReport::default());
			}
		};

		let report = self.run_blocking(series).await?;

		info!(%horizon, points = report.points.len(), "Forecast ready");
		Ok(report)
	}

	// A task that panics or gets cancelled is a failed request, not missing data
	pub async fn run_blocking(self, series: ForecastSeries) -> Result<ForecastReport> {
		match tokio::task::spawn_blocking(move || self.run(&series)).await {
			Ok(result) => result,
			Err(err) => {
				error!(%err, "Prediction task did not finish");
				Err(ForecastError::Task(err.to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SourceConfig;
	use crate::model::NormalParam;
	use crate::pipeline::FEATURE_COUNT;
	use chrono::{NaiveDate, TimeDelta};

	#[derive(Clone)]
	struct RainDriven;

	impl CapacityModel for RainDriven {
		fn feature_count(&self) -> usize {
			FEATURE_COUNT
		}

		fn predict(&self, scaled: &[f64]) -> Result<f64> {
			Ok(20.0 + 30.0 * scaled[4] + 0.5 * scaled[6])
		}
	}

	fn service(lag_default: f64) -> ForecastService<NormalParam, RainDriven> {
		let scaler = NormalParam::new(vec![0.0; FEATURE_COUNT], vec![1.0; FEATURE_COUNT]).unwrap();
		ForecastService::new(
			Artifacts::new(scaler, RainDriven).unwrap(),
			PipelineConfig::new().with_lag_default(lag_default),
		)
	}

	fn series(length: usize) -> ForecastSeries {
		let start = NaiveDate::from_ymd_opt(2024, 6, 1)
			.unwrap()
			.and_hms_opt(0, 0, 0)
			.unwrap();
		ForecastSeries::new(
			(0..length)
				.map(|i| {
					let rain = if i == 100 { 2.0 } else { 0.0 };
					(start + TimeDelta::minutes(15 * i as i64), rain)
				})
				.collect(),
		)
		.unwrap()
	}

	#[test]
	fn report_pairs_predictions_with_rainfall() {
		let input = series(96 * 2);
		let report = service(0.0).run(&input).unwrap();

		assert_eq!(report.points.len(), 96);
		assert_eq!(report.points[0].timestamp, input.points()[96].0);
		assert_eq!(report.points[4].rainfall, 2.0);
		assert_eq!(report.points[0].capacity_percentage, 20.0);
	}

	#[test]
	fn peaks_follow_the_storm() {
		let report = service(0.0).run(&series(96 * 2)).unwrap();

		let high = report.high_peak.unwrap();
		assert_eq!(high, report.points[4]);
		// 20 -> 30 -> 35 -> 37.5 before the storm, then 20 + 30 * 2.0 + 0.5 * 37.5
		assert_eq!(high.capacity_percentage, 98.75);

		let low = report.low_peak.unwrap();
		assert_eq!(low, report.points[0]);
	}

	#[test]
	fn short_series_gives_an_empty_report() {
		let report = service(0.0).run(&series(50)).unwrap();
		assert!(report.is_empty());
		assert_eq!(report.high_peak, None);
		assert_eq!(report.low_peak, None);
	}

	#[test]
	fn lag_default_seeds_the_first_prediction() {
		let report = service(10.0).run(&series(96 * 2)).unwrap();
		assert_eq!(report.points[0].capacity_percentage, 25.0);
	}

	#[test]
	fn mismatched_scaler_fails_the_request() {
		let scaler = NormalParam::new(vec![0.0; 4], vec![1.0; 4]).unwrap();
		let service = ForecastService {
			artifacts: Arc::new(Artifacts {
				scaler,
				model: RainDriven,
			}),
			config: PipelineConfig::new(),
		};

		assert!(matches!(
			service.run(&series(200)),
			Err(ForecastError::FeatureMismatch { .. })
		));
	}

	#[test]
	fn clones_share_the_loaded_artifacts() {
		let first = service(0.0);
		let second = first.clone();
		assert!(Arc::ptr_eq(&first.artifacts, &second.artifacts));
		assert_eq!(Arc::strong_count(&first.artifacts), 2);
	}

	struct Exploding;

	impl CapacityModel for Exploding {
		fn feature_count(&self) -> usize {
			FEATURE_COUNT
		}

		fn predict(&self, _scaled: &[f64]) -> Result<f64> {
			panic!("weights are corrupt")
		}
	}

	#[tokio::test]
	async fn crashed_prediction_is_an_error() {
		let scaler = NormalParam::new(vec![0.0; FEATURE_COUNT], vec![1.0; FEATURE_COUNT]).unwrap();
		let service = ForecastService::new(
			Artifacts::new(scaler, Exploding).unwrap(),
			PipelineConfig::new(),
		);

		let outcome = service.run_blocking(series(96 * 2)).await;
		assert!(matches!(outcome, Err(ForecastError::Task(_))));
	}

	#[tokio::test]
	async fn blocking_run_matches_the_direct_run() {
		let direct = service(0.0).run(&series(96 * 2)).unwrap();
		let spawned = service(0.0).run_blocking(series(96 * 2)).await.unwrap();
		assert_eq!(direct, spawned);
	}

	#[tokio::test]
	async fn failed_fetch_is_an_empty_report() {
		let source = ForecastSource::new(SourceConfig {
			base_url: String::from("http://127.0.0.1:9/v1/forecast"),
			timeout_secs: 5,
			..Default::default()
		})
		.unwrap();

		let report = service(0.0)
			.forecast(&source, ForecastHorizon::ThreeDays)
			.await
			.unwrap();
		assert!(report.is_empty());
	}
}
