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

use std::{fs::File, path::Path};

use arrow::{
	array::{Array, ArrayRef, AsArray},
	compute::cast,
	datatypes::{DataType as ArrowType, Float64Type, TimeUnit, TimestampMicrosecondType},
};
use calamine::{Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{info, warn};

use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::source::parse_timestamp;

fn open_archive(path: &Path) -> Result<ArchiveFile> {
	let extension = path
		.extension()
		.and_then(|found| found.to_str())
		.map(|found| found.to_lowercase())
		.ok_or_else(|| {
			ForecastError::Archive(format!(
				"\"{}\" file has no extension",
				path.to_string_lossy()
			))
		})?;

	match extension.as_str() {
		"csv" => csv::Reader::from_path(path)
			.map(ArchiveFile::Csv)
			.map_err(|err| ForecastError::Archive(err.to_string())),
		"xlsx" | "xls" | "xlsb" | "ods" => calamine::open_workbook_auto(path)
			.map(ArchiveFile::Spreadsheet)
			.map_err(|err| ForecastError::Archive(err.to_string())),
		"parquet" => open_parquet(path),
		_ => Err(ForecastError::Archive(format!(
			"Cannot parse \"{}\" file extension",
			extension
		))),
	}
}

fn open_parquet(path: &Path) -> Result<ArchiveFile> {
	let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)
		.map_err(|err| ForecastError::Archive(err.to_string()))?;
	let headers = builder
		.schema()
		.fields()
		.iter()
		.map(|field| field.name().to_string())
		.collect::<Vec<_>>();
	let batches = builder
		.build()
		.map_err(|err| ForecastError::Archive(err.to_string()))?;

	Ok(ArchiveFile::Parquet { headers, batches })
}

fn locate_columns(headers: &[String], columns: &ArchiveColumns) -> Result<ColumnIndices> {
	let lookup = |wanted: &str| {
		headers
			.iter()
			.position(|each| each.trim().eq_ignore_ascii_case(wanted))
			.ok_or_else(|| ForecastError::Archive(format!("Column \"{}\" not found", wanted)))
	};

	Ok(ColumnIndices {
		timestamp: lookup(&columns.timestamp)?,
		percentage: lookup(&columns.percentage)?,
		precipitation: lookup(&columns.precipitation)?,
	})
}

fn spreadsheet_timestamp(cell: &Data) -> Option<NaiveDateTime> {
	match cell {
		Data::String(text) => parse_timestamp(text),
		other => other.as_datetime(),
	}
}

// Text columns go through the same parser as CSV cells, temporal ones are
// read as naive wall-clock time
fn parquet_timestamps(column: &ArrayRef) -> Result<Vec<Option<NaiveDateTime>>> {
	match column.data_type() {
		ArrowType::Utf8 | ArrowType::LargeUtf8 | ArrowType::Utf8View => {
			let text = cast(column, &ArrowType::Utf8)
				.map_err(|err| ForecastError::Archive(err.to_string()))?;
			Ok(text
				.as_string::<i32>()
				.iter()
				.map(|each| each.and_then(parse_timestamp))
				.collect())
		}
		_ => {
			let instants = cast(column, &ArrowType::Timestamp(TimeUnit::Microsecond, None))
				.map_err(|err| ForecastError::Archive(err.to_string()))?;
			let instants = instants.as_primitive::<TimestampMicrosecondType>();
			Ok((0..instants.len())
				.map(|index| {
					if instants.is_null(index) {
						None
					} else {
						instants.value_as_datetime(index)
					}
				})
				.collect())
		}
	}
}

// Non-numeric text turns into nulls, which the row reader skips
fn parquet_values(column: &ArrayRef) -> Result<Vec<Option<f64>>> {
	let values = cast(column, &ArrowType::Float64)
		.map_err(|err| ForecastError::Archive(err.to_string()))?;
	Ok(values.as_primitive::<Float64Type>().iter().collect())
}

// Rows with an unreadable cell are dropped, the count of them is kept
fn read_rows(file: &mut ArchiveFile, columns: &ArchiveColumns) -> Result<(Vec<HistoryPoint>, usize)> {
	let mut skipped_rows = 0usize;

	let points = match file {
		ArchiveFile::Csv(reader) => {
			let headers = reader
				.headers()
				.map_err(|err| ForecastError::Archive(err.to_string()))?
				.iter()
				.map(|each| each.to_string())
				.collect::<Vec<_>>();
			let indices = locate_columns(&headers, columns)?;

			reader
				.records()
				.filter_map(|each| {
					let parsed = each.ok().and_then(|row| {
						Some(HistoryPoint {
							timestamp: parse_timestamp(row.get(indices.timestamp)?)?,
							percentage: row.get(indices.percentage)?.trim().parse::<f64>().ok()?,
							precipitation: row
								.get(indices.precipitation)?
								.trim()
								.parse::<f64>()
								.ok()?,
						})
					});

					if parsed.is_none() {
						skipped_rows += 1;
					}
					parsed
				})
				.collect::<Vec<_>>()
		}
		ArchiveFile::Spreadsheet(sheets) => {
			let tab_name = sheets
				.sheet_names()
				.first()
				.cloned()
				.ok_or_else(|| ForecastError::Archive(String::from("Spreadsheet has no sheet")))?;
			let sheet = sheets
				.worksheet_range(&tab_name)
				.map_err(|err| ForecastError::Archive(err.to_string()))?;
			let headers = sheet.headers().ok_or_else(|| {
				ForecastError::Archive(format!("Sheet \"{}\" has no header", tab_name))
			})?;
			let indices = locate_columns(&headers, columns)?;

			sheet
				.rows()
				.skip(1) // Skip header row
				.filter_map(|row| {
					let parsed = (|| {
						Some(HistoryPoint {
							timestamp: spreadsheet_timestamp(row.get(indices.timestamp)?)?,
							percentage: row.get(indices.percentage)?.as_f64()?,
							precipitation: row.get(indices.precipitation)?.as_f64()?,
						})
					})();

					if parsed.is_none() {
						skipped_rows += 1;
					}
					parsed
				})
				.collect::<Vec<_>>()
		}
		ArchiveFile::Parquet { headers, batches } => {
			let indices = locate_columns(headers.as_slice(), columns)?;
			let mut points = Vec::new();

			for batch in batches {
				let batch = batch.map_err(|err| ForecastError::Archive(err.to_string()))?;
				let timestamps = parquet_timestamps(batch.column(indices.timestamp))?;
				let percentages = parquet_values(batch.column(indices.percentage))?;
				let precipitations = parquet_values(batch.column(indices.precipitation))?;

				for ((timestamp, percentage), precipitation) in
					timestamps.into_iter().zip(percentages).zip(precipitations)
				{
					match (timestamp, percentage, precipitation) {
						(Some(timestamp), Some(percentage), Some(precipitation)) => {
							points.push(HistoryPoint {
								timestamp,
								percentage,
								precipitation,
							})
						}
						_ => skipped_rows += 1,
					}
				}
			}

			points
		}
	};

	Ok((points, skipped_rows))
}

pub fn load_archive(path: &Path, columns: &ArchiveColumns) -> Result<Archive> {
	let mut file = open_archive(path)?;
	let (mut points, skipped_rows) = read_rows(&mut file, columns)?;

	points.sort_unstable_by_key(|each| each.timestamp);

	if skipped_rows > 0 {
		warn!(
			path = %path.display(),
			skipped_rows,
			"Archive rows dropped because of unreadable cells"
		);
	}
	info!(path = %path.display(), points = points.len(), "Archive loaded");

	let name = path
		.file_name()
		.and_then(|name| Some(name.to_str()?.to_string()))
		.unwrap_or(String::from("(unknown)"));

	Ok(Archive {
		name,
		points,
		skipped_rows,
	})
}

// Half-open window, `start` included and `end` excluded
pub fn filter_range(
	points: &[HistoryPoint],
	start: NaiveDateTime,
	end: NaiveDateTime,
) -> Vec<HistoryPoint> {
	points
		.iter()
		.filter(|each| each.timestamp >= start && each.timestamp < end)
		.cloned()
		.collect()
}

pub fn select_day(points: &[HistoryPoint], date: NaiveDate) -> Vec<HistoryPoint> {
	points
		.iter()
		.filter(|each| each.timestamp.date() == date)
		.cloned()
		.collect()
}
