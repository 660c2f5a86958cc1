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

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
	#[error("Feature vector has {actual} values but {expected} were expected")]
	FeatureMismatch { expected: usize, actual: usize },

	#[error("Forecast series is not evenly sampled at row {index}: {reason}")]
	IrregularSampling { index: usize, reason: String },

	#[error("Forecast arrays are misaligned: {times} timestamps, {values} precipitation values")]
	MisalignedSeries { times: usize, values: usize },

	#[error("Forecast request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("Forecast endpoint answered with status {0}")]
	Status(u16),

	#[error("Cannot parse forecast response: {0}")]
	Parse(String),

	#[error("Forecast request exceeded {0} seconds")]
	Timeout(u64),

	#[error("Cannot load artifact \"{path}\": {reason}")]
	Artifact { path: String, reason: String },

	#[error("Cannot read configuration \"{path}\": {reason}")]
	Config { path: String, reason: String },

	#[error("Cannot read archive: {0}")]
	Archive(String),

	#[error("Prediction task did not finish: {0}")]
	Task(String),

	#[error(transparent)]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
