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

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Mutex;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::{DialogExt, FilePath};

use super::helper::*;
use super::typedef::*;
use crate::desktop::report_error;
use crate::typedef::AppState;

#[tauri::command]
pub(crate) async fn load_archive(
	app: AppHandle,
	state: State<'_, Mutex<AppState>>,
	columns: Option<ArchiveColumns>,
) -> Result<Option<ArchiveInfo>, ()> {
	let (tx, mut rx) = tauri::async_runtime::channel::<Option<FilePath>>(1024);

	app.dialog()
		.file()
		.set_title("Choose a capacity archive")
		.add_filter(
			"Supported Archive File",
			&["csv", "xlsx", "xlsb", "xls", "ods"],
		)
		.add_filter("Comma-Separated Values (CSV) File", &["csv"])
		.add_filter("Microsoft Excel File", &["xlsx"])
		.add_filter("OpenDocument Spreadsheet (ODS) File", &["ods"])
		.pick_file(move |file_path| {
			let _ = tx.blocking_send(file_path);
		});

	// Dialog dismissed
	let file_path = match rx.recv().await {
		Some(Some(found)) => found,
		_ => return Ok(None),
	};

	let source_path = match file_path.into_path() {
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "Cannot Parse File Path", err.to_string());
			return Ok(None);
		}
	};

	let columns = columns.unwrap_or_default();
	let loaded = match tauri::async_runtime::spawn_blocking(move || {
		crate::archive::load_archive(&source_path, &columns)
	})
	.await
	{
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "Cannot Create New Process Thread", err.to_string());
			return Err(());
		}
	};

	let archive = match loaded {
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "Failed to Read Archive", err.to_string());
			return Err(());
		}
	};

	let info = archive.info();

	let mut guarded_state = match state.lock() {
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "State Inaccessible on Load Archive", err.to_string());
			return Err(());
		}
	};

	guarded_state.archive = Some(archive);
	let _ = app.emit(crate::event::ARCHIVE_LOADED, info.clone());

	Ok(Some(info))
}

#[tauri::command]
pub(crate) fn get_history_day(
	app: AppHandle,
	state: State<'_, Mutex<AppState>>,
	date: NaiveDate,
) -> Vec<HistoryPoint> {
	let guarded_state = match state.lock() {
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "State Inaccessible while Reading History", err.to_string());
			return Default::default();
		}
	};

	guarded_state
		.archive
		.as_ref()
		.map(|found| select_day(&found.points, date))
		.unwrap_or_default()
}

#[tauri::command]
pub(crate) fn get_history_range(
	app: AppHandle,
	state: State<'_, Mutex<AppState>>,
	start: NaiveDateTime,
	end: NaiveDateTime,
) -> Vec<HistoryPoint> {
	let guarded_state = match state.lock() {
		Ok(ok) => ok,
		Err(err) => {
			report_error(&app, "State Inaccessible while Reading History", err.to_string());
			return Default::default();
		}
	};

	guarded_state
		.archive
		.as_ref()
		.map(|found| filter_range(&found.points, start, end))
		.unwrap_or_default()
}
