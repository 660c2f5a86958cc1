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

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Turns a raw feature vector into the scale the model was trained on.
pub trait FeatureScaler {
	fn feature_count(&self) -> usize;

	fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Pre-trained capacity percentage regressor, fed with scaled feature vectors.
pub trait CapacityModel {
	fn feature_count(&self) -> usize;

	fn predict(&self, scaled: &[f64]) -> Result<f64>;

	// Implementations with a real batch path should override this
	fn predict_batch(&self, scaled_rows: &[Vec<f64>]) -> Result<Vec<f64>> {
		scaled_rows.iter().map(|each| self.predict(each)).collect()
	}
}

// Per-feature standardization, same semantics as a fitted standard scaler
#[derive(Default, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NormalParam {
	pub mean: Vec<f64>,
	pub stdev: Vec<f64>,
}

impl NormalParam {
	pub fn new(mean: Vec<f64>, stdev: Vec<f64>) -> Result<Self> {
		if mean.len() != stdev.len() {
			return Err(ForecastError::FeatureMismatch {
				expected: mean.len(),
				actual: stdev.len(),
			});
		}

		Ok(Self { mean, stdev })
	}
}

impl FeatureScaler for NormalParam {
	fn feature_count(&self) -> usize {
		self.mean.len()
	}

	fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
		if features.len() != self.mean.len() || self.stdev.len() != self.mean.len() {
			return Err(ForecastError::FeatureMismatch {
				expected: self.mean.len(),
				actual: features.len(),
			});
		}

		Ok(features
			.iter()
			.zip(self.mean.iter().zip(&self.stdev))
			.map(|(x, (mean, stdev))| {
				// Constant columns were left unscaled during training
				let stdev = if *stdev == 0f64 { 1f64 } else { *stdev };
				(x - mean) / stdev
			})
			.collect())
	}
}
