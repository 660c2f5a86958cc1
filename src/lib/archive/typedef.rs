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

use std::{fs::File, io::BufReader};

use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveColumns {
	pub timestamp: String,
	pub percentage: String,
	pub precipitation: String,
}

impl Default for ArchiveColumns {
	fn default() -> Self {
		Self {
			timestamp: String::from("timestamp"),
			percentage: String::from("percentage"),
			precipitation: String::from("precipitation"),
		}
	}
}

impl ArchiveColumns {
	// Layout of a previously exported prediction sheet
	pub fn prediction_export() -> Self {
		Self {
			timestamp: String::from("timestamp"),
			percentage: String::from("percentage_current"),
			precipitation: String::from("rainfall_current"),
		}
	}
}

#[derive(Default, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
	pub timestamp: NaiveDateTime,
	pub percentage: f64,
	pub precipitation: f64,
}

#[derive(Default, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
	pub name: String,
	pub points: Vec<HistoryPoint>,
	pub skipped_rows: usize,
}

#[derive(Default, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
	pub name: String,
	pub point_count: usize,
	pub skipped_rows: usize,
	pub first: Option<NaiveDateTime>,
	pub last: Option<NaiveDateTime>,
}

impl Archive {
	pub fn info(&self) -> ArchiveInfo {
		ArchiveInfo {
			name: self.name.clone(),
			point_count: self.points.len(),
			skipped_rows: self.skipped_rows,
			first: self.points.first().map(|found| found.timestamp),
			last: self.points.last().map(|found| found.timestamp),
		}
	}
}

pub(super) enum ArchiveFile {
	Csv(csv::Reader<File>),
	Spreadsheet(calamine::Sheets<BufReader<File>>),
	Parquet {
		headers: Vec<String>,
		batches: ParquetRecordBatchReader,
	},
}

pub(super) struct ColumnIndices {
	pub timestamp: usize,
	pub percentage: usize,
	pub precipitation: usize,
}
