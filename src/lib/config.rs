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

use std::{
	fs::File,
	io::BufReader,
	path::{Path, PathBuf},
};

use burn::config::Config;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{self, ForecastError};

#[derive(Config, Debug)]
pub struct PipelineConfig {
	// One day of 15-minute samples, only there to feed the rainfall shift
	#[config(default = 96)]
	pub lookback_steps: usize,

	// Two hours back at 15-minute sampling
	#[config(default = 8)]
	pub rain_shift_steps: usize,

	#[config(default = 15)]
	pub sampling_minutes: i64,

	// Value of every percentage lag column before the model fills it in
	#[config(default = 0.0)]
	pub lag_default: f64,

	// Largest prediction change still treated as settled by the batched predictor,
	// anything above zero trades exactness for fewer passes
	#[config(default = 0.0)]
	pub convergence_tolerance: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
	pub base_url: String,
	pub latitude: f64,
	pub longitude: f64,
	pub past_days: u8,
	pub timeout_secs: u64,
}

impl Default for SourceConfig {
	fn default() -> Self {
		Self {
			base_url: String::from("https://api.open-meteo.com/v1/forecast"),
			latitude: 51.55202,
			longitude: 4.586668,
			past_days: 1,
			timeout_secs: 30,
		}
	}
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtifactConfig {
	pub scaler_path: PathBuf,
	// Path without extension, the regressor lives in `<stem>.json` + `<stem>.mpk`
	pub model_path: PathBuf,
}

impl Default for ArtifactConfig {
	fn default() -> Self {
		Self {
			scaler_path: PathBuf::from("data/scaler.json"),
			model_path: PathBuf::from("data/capacity_regressor"),
		}
	}
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
	#[serde(deserialize_with = "pipeline_with_defaults")]
	pub pipeline: PipelineConfig,
	pub source: SourceConfig,
	pub artifacts: ArtifactConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			pipeline: PipelineConfig::new(),
			source: SourceConfig::default(),
			artifacts: ArtifactConfig::default(),
		}
	}
}

// The derived burn deserializer wants every field, so keys the file leaves out
// are taken from `PipelineConfig::new()` before handing it over
fn pipeline_with_defaults<'de, D>(deserializer: D) -> std::result::Result<PipelineConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let overrides = match Value::deserialize(deserializer)? {
		Value::Object(found) => found,
		other => {
			return Err(de::Error::custom(format!(
				"pipeline must be an object, found {}",
				other
			)))
		}
	};

	let mut merged = serde_json::to_value(PipelineConfig::new()).map_err(de::Error::custom)?;
	if let Value::Object(defaults) = &mut merged {
		defaults.extend(overrides);
	}

	serde_json::from_value(merged).map_err(de::Error::custom)
}

impl AppConfig {
	pub fn load(path: &Path) -> error::Result<Self> {
		if !path.exists() {
			info!(path = %path.display(), "No configuration file, using defaults");
			return Ok(Self::default());
		}

		let file = File::open(path)?;
		let config: AppConfig =
			serde_json::from_reader(BufReader::new(file)).map_err(|err| ForecastError::Config {
				path: path.to_string_lossy().into_owned(),
				reason: err.to_string(),
			})?;

		debug!(?config, "Configuration loaded");
		Ok(config)
	}
}
