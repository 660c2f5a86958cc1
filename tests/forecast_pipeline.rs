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

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::Rng;

use sewer_forecast_lib::config::PipelineConfig;
use sewer_forecast_lib::error::Result;
use sewer_forecast_lib::model::{
	BurnRegressor, CapacityModel, CapacityRegressorConfig, FeatureScaler, NormalParam,
};
use sewer_forecast_lib::pipeline::{
	build_features, predict_autoregressive, predict_batched, ForecastSeries, FEATURE_COUNT,
	LAG_COUNT,
};

struct Unscaled;

impl FeatureScaler for Unscaled {
	fn feature_count(&self) -> usize {
		FEATURE_COUNT
	}

	fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
		Ok(features.to_vec())
	}
}

// Distinct output per row so every lag slot can be traced back to its source
struct StepCounter;

impl CapacityModel for StepCounter {
	fn feature_count(&self) -> usize {
		FEATURE_COUNT
	}

	fn predict(&self, scaled: &[f64]) -> Result<f64> {
		Ok(scaled[6] + 1.0 + scaled[4])
	}
}

fn start() -> NaiveDateTime {
	NaiveDate::from_ymd_opt(2023, 12, 17)
		.unwrap()
		.and_hms_opt(0, 0, 0)
		.unwrap()
}

fn quarter_hourly(precipitation: &[f64]) -> ForecastSeries {
	ForecastSeries::new(
		precipitation
			.iter()
			.enumerate()
			.map(|(i, y)| (start() + TimeDelta::minutes(15 * i as i64), *y))
			.collect(),
	)
	.unwrap()
}

#[test]
fn two_day_storm_at_the_start_of_the_lookback() {
	let precipitation = (0..192)
		.map(|i| if i < 8 { 1.0 } else { 0.0 })
		.collect::<Vec<_>>();
	let config = PipelineConfig::new();

	let mut table = build_features(&quarter_hourly(&precipitation), &config).unwrap();
	assert_eq!(table.len(), 96);
	assert_eq!(table.timestamps[0], start() + TimeDelta::hours(24));

	// Original rows 88..95 feed the first kept row, all of them dry
	assert_eq!(table.rows[0].rainfall_previous_2_hours, 0.0);
	assert!(table.rows.iter().all(|each| each.rainfall_current == 0.0));

	let predictions = predict_autoregressive(&mut table, &Unscaled, &StepCounter).unwrap();
	assert_eq!(predictions[..6], [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

	for row in 1usize..=6 {
		for k in 0..LAG_COUNT {
			let expected = match (row - 1).checked_sub(k) {
				Some(source) => predictions[source],
				None => config.lag_default,
			};
			assert_eq!(table.rows[row].lags[k], expected, "row {row} lag {}", k + 1);
		}
	}
}

#[test]
fn burn_regressor_agrees_across_both_predictors() {
	let mut rng = rand::rng();
	let precipitation = (0..96 + 64)
		.map(|_| if rng.random_bool(0.3) { rng.random_range(0.0..2.5) } else { 0.0 })
		.collect::<Vec<_>>();
	let config = PipelineConfig::new();
	let series = quarter_hourly(&precipitation);

	let regressor_config = CapacityRegressorConfig::new().with_hidden_size(16);
	let model = BurnRegressor::from_config(&regressor_config);
	let scaler = NormalParam::new(
		vec![15.0, 6.0, 3.0, 12.0, 0.2, 0.2, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0],
		vec![8.0, 3.5, 2.0, 7.0, 0.5, 0.5, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0],
	)
	.unwrap();

	let mut sequential_table = build_features(&series, &config).unwrap();
	let sequential = predict_autoregressive(&mut sequential_table, &scaler, &model).unwrap();

	// Batch kernels may round differently from single rows, so settle loosely
	let mut batched_table = build_features(&series, &config).unwrap();
	let batched = predict_batched(&mut batched_table, &scaler, &model, 1e-5).unwrap();

	assert_eq!(sequential.len(), 64);
	assert_eq!(batched.len(), 64);
	for (a, b) in sequential.iter().zip(&batched) {
		assert_relative_eq!(a, b, epsilon = 1e-3);
	}
}
