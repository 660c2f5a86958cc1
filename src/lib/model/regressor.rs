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

use std::sync::{Mutex, MutexGuard, PoisonError};

use burn::{
	backend::{ndarray::NdArrayDevice, NdArray},
	config::Config,
	module::Module,
	nn::{Linear, LinearConfig, Relu},
	tensor::{backend::Backend, Tensor, TensorData},
};

use super::typedef::CapacityModel;
use crate::error::{self, ForecastError};

#[derive(Config, Debug)]
pub struct CapacityRegressorConfig {
	#[config(default = 12)]
	pub input_size: usize,
	#[config(default = 32)]
	pub hidden_size: usize,
}

impl CapacityRegressorConfig {
	pub fn init<B: Backend>(&self, device: &B::Device) -> CapacityRegressor<B> {
		CapacityRegressor {
			input: LinearConfig::new(self.input_size, self.hidden_size).init(device),
			hidden: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
			output: LinearConfig::new(self.hidden_size, 1).init(device),
			activation: Relu::new(),
		}
	}
}

#[derive(Module, Debug)]
pub struct CapacityRegressor<B: Backend> {
	input: Linear<B>,
	hidden: Linear<B>,
	output: Linear<B>,
	activation: Relu,
}

impl<B: Backend> CapacityRegressor<B> {
	// Linear weights are stored as [d_input, d_output]
	pub fn input_size(&self) -> usize {
		self.input.weight.val().dims()[0]
	}

	// [rows, features] -> [rows, 1]
	pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
		let x = self.activation.forward(self.input.forward(features));
		let x = self.activation.forward(self.hidden.forward(x));
		self.output.forward(x)
	}
}

// The regressor pinned to the CPU backend it is served from. burn parameters
// initialise through a `OnceCell`, which keeps the module itself from being
// `Sync`, so the network sits behind a lock to be shared across requests.
#[derive(Debug)]
pub struct BurnRegressor {
	network: Mutex<CapacityRegressor<NdArray>>,
	input_size: usize,
	device: NdArrayDevice,
}

impl BurnRegressor {
	// The accepted row width always comes from the network's first layer
	pub fn new(network: CapacityRegressor<NdArray>) -> Self {
		Self {
			input_size: network.input_size(),
			network: Mutex::new(network),
			device: NdArrayDevice::Cpu,
		}
	}

	pub fn from_config(config: &CapacityRegressorConfig) -> Self {
		Self::new(config.init::<NdArray>(&NdArrayDevice::Cpu))
	}

	// Weights are never written after loading, a poisoned lock still holds them intact
	fn locked(&self) -> MutexGuard<'_, CapacityRegressor<NdArray>> {
		self.network.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn network(&self) -> CapacityRegressor<NdArray> {
		self.locked().clone()
	}

	pub fn device(&self) -> &NdArrayDevice {
		&self.device
	}

	fn forward_rows(&self, scaled_rows: &[Vec<f64>]) -> error::Result<Vec<f64>> {
		if let Some(found) = scaled_rows.iter().find(|each| each.len() != self.input_size) {
			return Err(ForecastError::FeatureMismatch {
				expected: self.input_size,
				actual: found.len(),
			});
		}

		let row_count = scaled_rows.len();
		if row_count == 0 {
			return Ok(Vec::new());
		}

		let flatten = scaled_rows.iter().flatten().cloned().collect::<Vec<_>>();
		let data = TensorData::new(flatten, [row_count, self.input_size])
			.convert::<<NdArray as Backend>::FloatElem>();
		let tensor = Tensor::<NdArray, 2>::from_data(data, &self.device);

		let output = self.locked().forward(tensor).into_data();

		Ok(output.iter::<f64>().collect::<Vec<_>>())
	}
}

impl CapacityModel for BurnRegressor {
	fn feature_count(&self) -> usize {
		self.input_size
	}

	fn predict(&self, scaled: &[f64]) -> error::Result<f64> {
		let output = self.forward_rows(&[scaled.to_vec()])?;
		output
			.first()
			.cloned()
			.ok_or_else(|| ForecastError::Parse(String::from("Regressor produced no output")))
	}

	fn predict_batch(&self, scaled_rows: &[Vec<f64>]) -> error::Result<Vec<f64>> {
		self.forward_rows(scaled_rows)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn regressor() -> BurnRegressor {
		BurnRegressor::from_config(&CapacityRegressorConfig::new())
	}

	#[test]
	fn batch_matches_single_row_predictions() {
		let model = regressor();
		let rows = (0..5)
			.map(|i| (0..12).map(|j| (i * j) as f64 / 10f64).collect::<Vec<_>>())
			.collect::<Vec<_>>();

		let batch = model.predict_batch(&rows).unwrap();
		assert_eq!(batch.len(), 5);
		for (row, expected) in rows.iter().zip(&batch) {
			assert_relative_eq!(model.predict(row).unwrap(), *expected, epsilon = 1e-4);
		}
	}

	#[test]
	fn rejects_wrong_feature_width() {
		let model = regressor();
		let error = model.predict(&[0.0; 7]).unwrap_err();
		assert!(matches!(
			error,
			ForecastError::FeatureMismatch {
				expected: 12,
				actual: 7
			}
		));
	}

	#[test]
	fn empty_batch_is_empty() {
		assert!(regressor().predict_batch(&[]).unwrap().is_empty());
	}

	#[test]
	fn row_width_follows_the_network() {
		let narrow = CapacityRegressorConfig::new().with_input_size(7);
		let model = BurnRegressor::new(narrow.init::<NdArray>(&NdArrayDevice::Cpu));
		assert_eq!(model.feature_count(), 7);
		assert!(model.predict(&[0.5; 7]).unwrap().is_finite());

		let error = model.predict(&[0.5; 12]).unwrap_err();
		assert!(matches!(
			error,
			ForecastError::FeatureMismatch {
				expected: 7,
				actual: 12
			}
		));
	}
}
