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

use std::{fs::File, io::BufReader, path::Path};

use burn::{
	backend::{ndarray::NdArrayDevice, NdArray},
	config::Config,
	module::Module,
	record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use tracing::info;

use super::regressor::*;
use super::typedef::*;
use crate::config::ArtifactConfig;
use crate::error::{ForecastError, Result};
use crate::pipeline::FEATURE_COUNT;

fn artifact_error(path: &Path, reason: impl ToString) -> ForecastError {
	ForecastError::Artifact {
		path: path.to_string_lossy().into_owned(),
		reason: reason.to_string(),
	}
}

pub fn load_scaler(path: &Path) -> Result<NormalParam> {
	let file = File::open(path).map_err(|err| artifact_error(path, err))?;
	let scaler: NormalParam =
		serde_json::from_reader(BufReader::new(file)).map_err(|err| artifact_error(path, err))?;

	// Re-run the constructor checks on whatever came from disk
	NormalParam::new(scaler.mean, scaler.stdev).map_err(|err| artifact_error(path, err))
}

// `stem` has no extension: the config is `<stem>.json`, the weights `<stem>.mpk`
pub fn load_regressor(stem: &Path) -> Result<BurnRegressor> {
	let device = NdArrayDevice::Cpu;
	let config_path = stem.with_extension("json");

	let config = CapacityRegressorConfig::load(&config_path)
		.map_err(|err| artifact_error(&config_path, err))?;

	let network = config
		.init::<NdArray>(&device)
		.load_file(
			stem.to_path_buf(),
			&NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
			&device,
		)
		.map_err(|err| artifact_error(stem, err))?;

	Ok(BurnRegressor::new(network))
}

pub fn save_regressor(
	model: &BurnRegressor,
	config: &CapacityRegressorConfig,
	stem: &Path,
) -> Result<()> {
	let config_path = stem.with_extension("json");
	config
		.save(&config_path)
		.map_err(|err| artifact_error(&config_path, err))?;

	model
		.network()
		.save_file(
			stem.to_path_buf(),
			&NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
		)
		.map_err(|err| artifact_error(stem, err))
}

// Both artifacts, loaded once at start-up and only read afterwards
#[derive(Debug)]
pub struct Artifacts<S, M> {
	pub scaler: S,
	pub model: M,
}

impl<S: FeatureScaler, M: CapacityModel> Artifacts<S, M> {
	pub fn new(scaler: S, model: M) -> Result<Self> {
		if scaler.feature_count() != FEATURE_COUNT {
			return Err(ForecastError::FeatureMismatch {
				expected: FEATURE_COUNT,
				actual: scaler.feature_count(),
			});
		}

		if model.feature_count() != FEATURE_COUNT {
			return Err(ForecastError::FeatureMismatch {
				expected: FEATURE_COUNT,
				actual: model.feature_count(),
			});
		}

		Ok(Self { scaler, model })
	}
}

pub fn load_artifacts(config: &ArtifactConfig) -> Result<Artifacts<NormalParam, BurnRegressor>> {
	let scaler = load_scaler(&config.scaler_path)?;
	let model = load_regressor(&config.model_path)?;

	info!(
		scaler = %config.scaler_path.display(),
		model = %config.model_path.display(),
		"Artifacts loaded"
	);

	Artifacts::new(scaler, model)
}
