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

use std::sync::Mutex;
use strum::IntoEnumIterator;
use tauri::{AppHandle, State};

use super::typedef::ForecastReport;
use crate::desktop::report_error;
use crate::source::ForecastHorizon;
use crate::typedef::AppState;

#[tauri::command]
pub(crate) fn get_horizons() -> Vec<ForecastHorizon> {
	ForecastHorizon::iter().collect()
}

#[tauri::command]
pub(crate) async fn get_forecast(
	app: AppHandle,
	state: State<'_, Mutex<AppState>>,
	horizon: ForecastHorizon,
) -> Result<ForecastReport, ()> {
	let (service, source) = {
		let guarded_state = match state.lock() {
			Ok(ok) => ok,
			Err(err) => {
				report_error(&app, "State Inaccessible before Forecast", err.to_string());
				return Err(());
			}
		};

		match (&guarded_state.service, &guarded_state.source) {
			(Some(service), Some(source)) => (service.clone(), source.clone()),
			_ => {
				report_error(
					&app,
					"Forecast Unavailable",
					String::from("The model, the scaler or the forecast source failed to load"),
				);
				return Err(());
			}
		}
	};

	match service.forecast(&source, horizon).await {
		Ok(ok) => Ok(ok),
		Err(err) => {
			report_error(&app, "Prediction Failed", err.to_string());
			Err(())
		}
	}
}
