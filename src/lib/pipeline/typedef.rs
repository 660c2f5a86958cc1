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

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;

use crate::error::{ForecastError, Result};

pub const LAG_COUNT: usize = 6;
pub const FEATURE_COUNT: usize = 6 + LAG_COUNT;

// Column order the scaler and the regressor were fitted with
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
	"day",
	"month",
	"dayofweek",
	"hour",
	"rainfall_current",
	"rainfall_previous_2_hours",
	"percentage_previous_1",
	"percentage_previous_2",
	"percentage_previous_3",
	"percentage_previous_4",
	"percentage_previous_5",
	"percentage_previous_6",
];

#[derive(Default, Clone, Debug, PartialEq)]
pub struct ForecastSeries {
	points: Vec<(NaiveDateTime, f64)>,
	interval: Option<TimeDelta>,
}

impl ForecastSeries {
	pub fn new(points: Vec<(NaiveDateTime, f64)>) -> Result<Self> {
		let interval = match points.as_slice() {
			[first, second, ..] => Some(second.0 - first.0),
			_ => None,
		};

		if let Some(expected) = interval {
			if expected <= TimeDelta::zero() {
				return Err(ForecastError::IrregularSampling {
					index: 1,
					reason: String::from("timestamps are not strictly increasing"),
				});
			}

			let future_iter = points.iter().skip(1);
			if let Some(index) = points
				.iter()
				.zip(future_iter)
				.position(|(now, next)| next.0 - now.0 != expected)
			{
				return Err(ForecastError::IrregularSampling {
					index: index + 1,
					reason: format!(
						"gap of {} minutes, expected {}",
						(points[index + 1].0 - points[index].0).num_minutes(),
						expected.num_minutes()
					),
				});
			}
		}

		Ok(Self { points, interval })
	}

	pub fn points(&self) -> &[(NaiveDateTime, f64)] {
		&self.points
	}

	pub fn interval(&self) -> Option<TimeDelta> {
		self.interval
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}
}

#[derive(Default, Serialize, Clone, Debug, PartialEq)]
pub struct FeatureRow {
	pub day: u32,
	pub month: u32,
	pub dayofweek: u32,
	pub hour: u32,
	pub rainfall_current: f64,
	pub rainfall_previous_2_hours: f64,
	// percentage_previous_1 is lags[0]
	pub lags: [f64; LAG_COUNT],
}

impl FeatureRow {
	pub fn new(timestamp: NaiveDateTime, rainfall: f64, rainfall_earlier: f64, lag: f64) -> Self {
		Self {
			day: timestamp.day(),
			month: timestamp.month(),
			dayofweek: timestamp.weekday().num_days_from_monday(),
			hour: timestamp.hour(),
			rainfall_current: rainfall,
			rainfall_previous_2_hours: rainfall_earlier,
			lags: [lag; LAG_COUNT],
		}
	}

	pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
		let mut vector = [0f64; FEATURE_COUNT];
		vector[0] = self.day as f64;
		vector[1] = self.month as f64;
		vector[2] = self.dayofweek as f64;
		vector[3] = self.hour as f64;
		vector[4] = self.rainfall_current;
		vector[5] = self.rainfall_previous_2_hours;
		vector[6..].copy_from_slice(&self.lags);
		vector
	}
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct FeatureTable {
	pub timestamps: Vec<NaiveDateTime>,
	pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn reset_lags(&mut self, value: f64) {
		self.rows.iter_mut().for_each(|each| each.lags = [value; LAG_COUNT]);
	}
}
