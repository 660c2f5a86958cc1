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

use serde::Serialize;
use std::borrow::Cow;

use crate::archive::Archive;
use crate::forecast::ForecastService;
use crate::model::{BurnRegressor, NormalParam};
use crate::source::ForecastSource;

#[derive(Default, Serialize, Clone)]
pub(crate) struct ErrorInfo {
	pub title: Cow<'static, str>,
	pub message: String,
}

pub(crate) type ServedForecast = ForecastService<NormalParam, BurnRegressor>;

#[derive(Default)]
pub(crate) struct AppState {
	pub service: Option<ServedForecast>,
	pub source: Option<ForecastSource>,
	pub archive: Option<Archive>,
}
