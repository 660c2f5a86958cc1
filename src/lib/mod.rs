#![recursion_limit = "256"]

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

pub mod archive;
pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod pipeline;
pub mod source;

#[cfg(feature = "desktop")]
mod event;
#[cfg(feature = "desktop")]
mod typedef;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
	use std::{borrow::Cow, path::PathBuf, sync::Mutex};
	use tauri::{AppHandle, Emitter, Manager};
	use tracing::{error, info};
	use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

	use crate::archive::command::*;
	use crate::config::AppConfig;
	use crate::forecast::command::*;
	use crate::forecast::ForecastService;
	use crate::model::load_artifacts;
	use crate::source::ForecastSource;
	use crate::typedef::{AppState, ErrorInfo};

	pub(crate) fn report_error(app: &AppHandle, title: impl Into<Cow<'static, str>>, message: String) {
		let title = title.into();
		error!(%title, %message);
		let _ = app.emit::<ErrorInfo>(crate::event::DIALOG_ERROR, ErrorInfo { title, message });
	}

	// Artifacts are loaded once here, a failure leaves the forecast commands disabled
	fn initial_state(app: &AppHandle) -> AppState {
		let config_path = app
			.path()
			.app_config_dir()
			.map(|found| found.join("config.json"))
			.unwrap_or_else(|_| PathBuf::from("config.json"));

		let config = AppConfig::load(&config_path).unwrap_or_else(|err| {
			error!(%err, "Falling back to the default configuration");
			AppConfig::default()
		});

		let source = ForecastSource::new(config.source.clone())
			.inspect_err(|err| error!(%err, "Forecast source unavailable"))
			.ok();

		let service = load_artifacts(&config.artifacts)
			.map(|artifacts| ForecastService::new(artifacts, config.pipeline.clone()))
			.inspect_err(|err| error!(%err, "Artifacts unavailable"))
			.ok();

		info!(
			forecast_ready = service.is_some() && source.is_some(),
			"Application state ready"
		);

		AppState {
			service,
			source,
			archive: None,
		}
	}

	#[cfg_attr(mobile, tauri::mobile_entry_point)]
	pub fn run() {
		tracing_subscriber::registry()
			.with(tracing_subscriber::fmt::layer())
			.with(
				EnvFilter::try_from_default_env()
					.unwrap_or_else(|_| "sewer_forecast_lib=info".into()),
			)
			.init();

		tauri::Builder::default()
			.plugin(tauri_plugin_opener::init())
			.plugin(tauri_plugin_dialog::init())
			.invoke_handler(tauri::generate_handler![
				get_horizons,
				get_forecast,
				load_archive,
				get_history_day,
				get_history_range
			])
			.setup(|app| {
				let state = initial_state(app.handle());
				app.manage(Mutex::new(state));
				Ok(())
			})
			.run(tauri::generate_context!())
			.expect("error while running tauri application");
	}
}
