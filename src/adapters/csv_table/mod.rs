// CSV table adapter - Label table and labeled export files

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::FieldCoercion;
use crate::error::{LabelerError, LabelerResult};
use crate::ports::*;

/// Header of the editable table file
pub const TABLE_HEADER: [&str; 10] = [
    "start_time",
    "end_time",
    "exercise",
    "orientation",
    "min_reps",
    "reps",
    "rule",
    "is_valid",
    "reps_to_judge",
    "notes",
];

/// One table line as text; columns missing from the file stay blank
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TableLine {
    start_time: String,
    end_time: String,
    exercise: String,
    orientation: String,
    min_reps: String,
    reps: String,
    rule: String,
    is_valid: String,
    reps_to_judge: String,
    notes: String,
}

impl TableLine {
    fn is_blank(&self) -> bool {
        [
            &self.start_time,
            &self.end_time,
            &self.exercise,
            &self.orientation,
            &self.min_reps,
            &self.reps,
            &self.rule,
            &self.is_valid,
            &self.reps_to_judge,
            &self.notes,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }

    fn into_row(self) -> Result<SegmentRow, DomainError> {
        Ok(SegmentRow {
            start_time: self.start_time.trim().to_string(),
            end_time: self.end_time.trim().to_string(),
            exercise: FieldCoercion::text(&self.exercise),
            orientation: Orientation::parse(&self.orientation)?,
            min_reps: FieldCoercion::count(&self.min_reps)?,
            reps: FieldCoercion::count(&self.reps)?,
            rule: FieldCoercion::text(&self.rule),
            is_valid: Validity::parse(&self.is_valid)?,
            reps_to_judge: FieldCoercion::text(&self.reps_to_judge),
            notes: FieldCoercion::text(&self.notes),
        })
    }

    fn from_row(row: &SegmentRow) -> Self {
        Self {
            start_time: row.start_time.clone(),
            end_time: row.end_time.clone(),
            exercise: row.exercise.clone(),
            orientation: row.orientation.to_string(),
            min_reps: row.min_reps.to_string(),
            reps: row.reps.to_string(),
            rule: row.rule.clone(),
            is_valid: row.is_valid.to_string(),
            reps_to_judge: row.reps_to_judge.clone(),
            notes: row.notes.clone(),
        }
    }
}

/// CSV-backed table file adapter
#[derive(Debug, Default)]
pub struct CsvTableAdapter;

impl CsvTableAdapter {
    pub fn new() -> Self {
        Self
    }

    fn table_error(path: &Path, message: impl Into<String>) -> LabelerError {
        LabelerError::TableFile {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    fn read(path: &Path) -> LabelerResult<LabelTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        if !headers.iter().any(|h| h == "start_time") || !headers.iter().any(|h| h == "end_time") {
            return Err(Self::table_error(
                path,
                "missing start_time/end_time header columns",
            ));
        }

        let mut table = LabelTable::new();
        for (index, line) in reader.deserialize::<TableLine>().enumerate() {
            // Header is line 1
            let line_no = index + 2;
            let line = line?;
            if line.is_blank() {
                continue;
            }
            let row = line
                .into_row()
                .map_err(|e| Self::table_error(path, format!("line {}: {}", line_no, e)))?;
            table.append(row);
        }

        debug!(path = %path.display(), rows = table.len(), "Table read");
        Ok(table)
    }

    /// Serialize rows into a temporary sibling file and move it into place
    fn write_atomically<T: Serialize>(
        path: &Path,
        header: Option<&[&str]>,
        rows: impl Iterator<Item = T>,
    ) -> LabelerResult<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut file = NamedTempFile::new_in(parent)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(header.is_none())
                .from_writer(file.as_file_mut());
            if let Some(header) = header {
                writer.write_record(header)?;
            }
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        file.as_file_mut().flush()?;
        file.persist(path).map_err(|e| LabelerError::Io(e.error))?;
        Ok(())
    }
}

impl TableFilePort for CsvTableAdapter {
    fn read_table(&self, path: &Path) -> Result<LabelTable, DomainError> {
        Ok(Self::read(path)?)
    }

    fn write_table(&self, path: &Path, table: &LabelTable) -> Result<(), DomainError> {
        // Header written explicitly so an empty table still yields one
        Self::write_atomically(
            path,
            Some(&TABLE_HEADER[..]),
            table.rows().iter().map(TableLine::from_row),
        )?;
        info!(path = %path.display(), rows = table.len(), "Table written");
        Ok(())
    }

    fn write_labels(&self, path: &Path, labels: &LabelSet) -> Result<(), DomainError> {
        Self::write_atomically(path, None, labels.iter())?;
        info!(path = %path.display(), labels = labels.len(), "Labels written");
        Ok(())
    }
}
