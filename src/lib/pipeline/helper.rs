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

use chrono::TimeDelta;
use tracing::debug;

use super::typedef::*;
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::model::{CapacityModel, FeatureScaler};

pub fn build_features(series: &ForecastSeries, config: &PipelineConfig) -> Result<FeatureTable> {
	let expected_interval = TimeDelta::minutes(config.sampling_minutes);
	if let Some(interval) = series.interval() {
		if interval != expected_interval {
			return Err(ForecastError::IrregularSampling {
				index: 1,
				reason: format!(
					"sampled every {} minutes, expected {}",
					interval.num_minutes(),
					config.sampling_minutes
				),
			});
		}
	}

	let points = series.points();

	// Shorter inputs have nothing left after the lookback day, that is an empty table
	let (timestamps, rows) = (config.lookback_steps..points.len())
		.map(|index| {
			let (timestamp, rainfall) = points[index];
			let rainfall_earlier = match index.checked_sub(config.rain_shift_steps) {
				Some(earlier) => points[earlier].1,
				None => 0f64,
			};

			(
				timestamp,
				FeatureRow::new(timestamp, rainfall, rainfall_earlier, config.lag_default),
			)
		})
		.unzip::<_, _, Vec<_>, Vec<_>>();

	debug!(
		input = points.len(),
		output = rows.len(),
		"Feature table built"
	);

	Ok(FeatureTable { timestamps, rows })
}

fn check_widths<S, M>(scaler: &S, model: &M) -> Result<()>
where
	S: FeatureScaler + ?Sized,
	M: CapacityModel + ?Sized,
{
	for actual in [scaler.feature_count(), model.feature_count()] {
		if actual != FEATURE_COUNT {
			return Err(ForecastError::FeatureMismatch {
				expected: FEATURE_COUNT,
				actual,
			});
		}
	}

	Ok(())
}

// Push `predicted` into row `index + 1` and slide row `index`'s lags behind it
fn cascade_lags(table: &mut FeatureTable, index: usize, predicted: f64) {
	let previous = table.rows[index].lags;
	let next = &mut table.rows[index + 1].lags;
	next[0] = predicted;
	next[1..].copy_from_slice(&previous[..LAG_COUNT - 1]);
}

pub fn predict_autoregressive<S, M>(
	table: &mut FeatureTable,
	scaler: &S,
	model: &M,
) -> Result<Vec<f64>>
where
	S: FeatureScaler + ?Sized,
	M: CapacityModel + ?Sized,
{
	let row_count = table.len();
	if row_count == 0 {
		return Ok(Vec::new());
	}

	check_widths(scaler, model)?;

	// Row i only ever sees lags written while predicting rows before it
	let mut predictions = Vec::<f64>::with_capacity(row_count);
	for index in 0..row_count {
		let scaled = scaler.transform(&table.rows[index].to_vector())?;
		let predicted = model.predict(&scaled)?;
		predictions.push(predicted);

		if index + 1 < row_count {
			cascade_lags(table, index, predicted);
		}
	}

	debug!(rows = row_count, "Autoregressive prediction done");
	Ok(predictions)
}

// Rewrite every lag column from a full set of predictions, row 0 keeps its seed lags
fn rewrite_lags(table: &mut FeatureTable, seed: &[f64; LAG_COUNT], predictions: &[f64]) {
	for index in 1..table.len() {
		let lags = &mut table.rows[index].lags;
		for (k, each) in lags.iter_mut().enumerate() {
			let back = k + 1;
			*each = match index.checked_sub(back) {
				Some(source) => predictions[source],
				None => seed[back - index - 1],
			};
		}
	}
}

pub fn predict_batched<S, M>(
	table: &mut FeatureTable,
	scaler: &S,
	model: &M,
	tolerance: f64,
) -> Result<Vec<f64>>
where
	S: FeatureScaler + ?Sized,
	M: CapacityModel + ?Sized,
{
	let row_count = table.len();
	if row_count == 0 {
		return Ok(Vec::new());
	}

	check_widths(scaler, model)?;

	let seed = table.rows[0].lags;
	let mut last_predictions = Option::<Vec<f64>>::None;

	// After pass p the first p + 1 rows are exact, so row_count + 1 passes always settle
	for pass in 0..=row_count {
		let scaled = table
			.rows
			.iter()
			.map(|each| scaler.transform(&each.to_vector()))
			.collect::<Result<Vec<_>>>()?;

		let predictions = model.predict_batch(&scaled)?;
		if predictions.len() != row_count {
			return Err(ForecastError::Parse(format!(
				"Batch prediction returned {} values for {} rows",
				predictions.len(),
				row_count
			)));
		}

		let settled = last_predictions.as_ref().is_some_and(|last| {
			last.iter()
				.zip(&predictions)
				.all(|(before, after)| (before - after).abs() <= tolerance)
		});

		rewrite_lags(table, &seed, &predictions);

		if settled {
			debug!(rows = row_count, passes = pass + 1, "Batched prediction settled");
			return Ok(predictions);
		}

		last_predictions = Some(predictions);
	}

	Ok(last_predictions.unwrap_or_default())
}
