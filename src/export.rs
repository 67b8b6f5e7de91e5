//! Xlsx export.
//!
//! Builds a two-sheet workbook from the store's contents: `log` with one row
//! per (week, day, exercise) and `progress` with the bodyweight series. The
//! column layout is stable so downstream spreadsheets keep working; the
//! `amrap` column carries the derived AMRAP count for tagged rows.

use std::io::Cursor;

use umya_spreadsheet::*;

use crate::domain::{LogRow, ProgressEntry};
use crate::error::ExportError;
use crate::store::Store;

const LOG_HEADER: [&str; 16] = [
    "week",
    "day",
    "day_title",
    "exercise",
    "sets",
    "rep_low",
    "rep_high",
    "category",
    "increment",
    "load_used",
    "s1",
    "s2",
    "s3",
    "amrap",
    "new_load",
    "notes",
];

/// Builds the export workbook straight from the store's contents.
pub fn export_workbook(store: &Store) -> Result<Vec<u8>, ExportError> {
    let rows = store.all_rows()?;
    let progress = store.progress_list()?;
    build_workbook(&rows, &progress)
}

/// Builds the export workbook and returns it as xlsx bytes.
pub fn build_workbook(rows: &[LogRow], progress: &[ProgressEntry]) -> Result<Vec<u8>, ExportError> {
    let mut book = new_file();

    {
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| ExportError::Workbook("default sheet missing".to_string()))?;
        sheet.set_name("log");
        write_log_sheet(sheet, rows);
    }

    {
        let sheet = book
            .new_sheet("progress")
            .map_err(|e| ExportError::Workbook(e.to_string()))?;
        write_progress_sheet(sheet, progress);
    }

    let mut cursor = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut cursor)
        .map_err(|e| ExportError::Workbook(format!("{e:?}")))?;
    Ok(cursor.into_inner())
}

fn write_log_sheet(sheet: &mut Worksheet, rows: &[LogRow]) {
    for (col, name) in LOG_HEADER.iter().enumerate() {
        sheet.get_cell_mut((col as u32 + 1, 1)).set_value(*name);
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 2;
        sheet.get_cell_mut((1, r)).set_value_number(row.week);
        sheet.get_cell_mut((2, r)).set_value_number(row.day);
        sheet.get_cell_mut((3, r)).set_value(row.day_title.as_str());
        sheet.get_cell_mut((4, r)).set_value(row.exercise.as_str());
        sheet.get_cell_mut((5, r)).set_value_number(row.sets);
        sheet.get_cell_mut((6, r)).set_value_number(row.rep_low);
        sheet.get_cell_mut((7, r)).set_value_number(row.rep_high);
        sheet.get_cell_mut((8, r)).set_value(row.category.as_str());
        sheet.get_cell_mut((9, r)).set_value_number(row.increment);
        set_opt_number(sheet, 10, r, row.load_used);
        set_opt_number(sheet, 11, r, row.s1.map(f64::from));
        set_opt_number(sheet, 12, r, row.s2.map(f64::from));
        set_opt_number(sheet, 13, r, row.s3.map(f64::from));
        set_opt_number(sheet, 14, r, row.amrap_reps().map(f64::from));
        set_opt_number(sheet, 15, r, row.new_load);
        if let Some(notes) = row.notes.as_deref() {
            sheet.get_cell_mut((16, r)).set_value(notes);
        }
    }
}

fn write_progress_sheet(sheet: &mut Worksheet, progress: &[ProgressEntry]) {
    sheet.get_cell_mut((1, 1)).set_value("week");
    sheet.get_cell_mut((2, 1)).set_value("bodyweight");
    for (idx, entry) in progress.iter().enumerate() {
        let r = idx as u32 + 2;
        sheet.get_cell_mut((1, r)).set_value_number(entry.week);
        sheet.get_cell_mut((2, r)).set_value_number(entry.bodyweight_kg);
    }
}

fn set_opt_number(sheet: &mut Worksheet, col: u32, row: u32, value: Option<f64>) {
    if let Some(v) = value {
        sheet.get_cell_mut((col, row)).set_value_number(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    fn sample_rows() -> Vec<LogRow> {
        vec![
            LogRow {
                week: 1,
                day: 1,
                day_title: "Day 1 – Push (Chest/Shoulders/Triceps)".to_string(),
                exercise: "Flat Barbell Bench Press".to_string(),
                sets: 3,
                rep_low: 6,
                rep_high: 8,
                category: Category::Compound,
                increment: 2.5,
                load_used: Some(100.0),
                s1: Some(8),
                s2: Some(8),
                s3: Some(8),
                last_set_is_amrap: false,
                new_load: Some(102.5),
                notes: Some("felt strong".to_string()),
            },
            LogRow {
                week: 1,
                day: 4,
                day_title: "Day 4 – Lower (Quads/Hams/Glutes/Calves)".to_string(),
                exercise: "Standing Calf Raise".to_string(),
                sets: 3,
                rep_low: 12,
                rep_high: 15,
                category: Category::Accessory,
                increment: 1.25,
                load_used: Some(40.0),
                s1: Some(15),
                s2: Some(15),
                s3: Some(26),
                last_set_is_amrap: true,
                new_load: Some(41.25),
                notes: None,
            },
        ]
    }

    #[test]
    fn test_workbook_layout() {
        let progress = vec![ProgressEntry {
            week: 1,
            bodyweight_kg: 82.4,
        }];
        let bytes = build_workbook(&sample_rows(), &progress).unwrap();
        assert!(!bytes.is_empty());

        let book = reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let log = book.get_sheet_by_name("log").unwrap();
        assert_eq!(log.get_value((1, 1)), "week");
        assert_eq!(log.get_value((16, 1)), "notes");
        assert_eq!(log.get_value((4, 2)), "Flat Barbell Bench Press");
        assert_eq!(log.get_value((8, 3)), "accessory");
        // The tagged accessory's AMRAP count lands in the amrap column.
        assert_eq!(log.get_value((14, 3)), "26");
        // The untagged compound leaves it empty.
        assert_eq!(log.get_value((14, 2)), "");

        let prog = book.get_sheet_by_name("progress").unwrap();
        assert_eq!(prog.get_value((1, 2)), "1");
        assert_eq!(prog.get_value((2, 2)), "82.4");
    }

    #[test]
    fn test_empty_store_still_exports_headers() {
        let bytes = build_workbook(&[], &[]).unwrap();
        let book = reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let log = book.get_sheet_by_name("log").unwrap();
        assert_eq!(log.get_value((10, 1)), "load_used");
        assert!(book.get_sheet_by_name("progress").is_some());
    }

    #[test]
    fn test_export_from_store() {
        let mut store = Store::open_in_memory().unwrap();
        store.save_rows(&sample_rows()).unwrap();
        store.upsert_bodyweight(1, 82.4).unwrap();

        let bytes = export_workbook(&store).unwrap();
        let book = reader::xlsx::read_reader(Cursor::new(bytes), true).unwrap();
        let log = book.get_sheet_by_name("log").unwrap();
        assert_eq!(log.get_value((4, 2)), "Flat Barbell Bench Press");
        assert_eq!(log.get_value((4, 3)), "Standing Calf Raise");
        let prog = book.get_sheet_by_name("progress").unwrap();
        assert_eq!(prog.get_value((2, 2)), "82.4");
    }
}
