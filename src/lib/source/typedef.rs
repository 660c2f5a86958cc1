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
use strum_macros::EnumIter;

#[derive(Default, PartialEq, Eq, EnumIter, Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(try_from = "u8", into = "u8")]
pub enum ForecastHorizon {
	OneDay,
	#[default]
	ThreeDays,
	SevenDays,
	FourteenDays,
	SixteenDays,
}

impl ForecastHorizon {
	pub fn days(&self) -> u8 {
		match self {
			ForecastHorizon::OneDay => 1,
			ForecastHorizon::ThreeDays => 3,
			ForecastHorizon::SevenDays => 7,
			ForecastHorizon::FourteenDays => 14,
			ForecastHorizon::SixteenDays => 16,
		}
	}
}

impl TryFrom<u8> for ForecastHorizon {
	type Error = String;

	fn try_from(days: u8) -> Result<Self, Self::Error> {
		match days {
			1 => Ok(ForecastHorizon::OneDay),
			3 => Ok(ForecastHorizon::ThreeDays),
			7 => Ok(ForecastHorizon::SevenDays),
			14 => Ok(ForecastHorizon::FourteenDays),
			16 => Ok(ForecastHorizon::SixteenDays),
			_ => Err(format!("No forecast horizon of {} days", days)),
		}
	}
}

impl From<ForecastHorizon> for u8 {
	fn from(horizon: ForecastHorizon) -> Self {
		horizon.days()
	}
}

impl std::fmt::Display for ForecastHorizon {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ForecastHorizon::OneDay => write!(f, "1 day"),
			other => write!(f, "{} days", other.days()),
		}
	}
}

// Open-Meteo answers with either the data or `{"error": true, "reason": ...}`
#[derive(Deserialize, Debug)]
pub(super) struct OpenMeteoResponse {
	pub minutely_15: Option<QuarterHourly>,
	#[serde(default)]
	pub error: bool,
	pub reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(super) struct QuarterHourly {
	pub time: Vec<String>,
	pub precipitation: Vec<Option<f64>>,
}
