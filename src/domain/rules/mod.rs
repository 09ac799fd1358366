// Domain rules - Label derivation and field coercion policies

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Length of generated identifiers for records without a label
pub const RANDOM_LABEL_LEN: usize = 16;

/// Derives per-exercise label ids for runs of rows sharing a start frame
pub struct LabelIdAssigner;

impl LabelIdAssigner {
    /// Assign `{exercise}_{n}` labels in place.
    ///
    /// Rows are visited exercise by exercise (first-appearance order), each
    /// exercise's rows in table order. The counter advances whenever the
    /// start frame differs from the previous row of the same exercise, so a
    /// run of equal starts shares one id even when other exercises sit
    /// between its rows.
    pub fn assign(set: &mut LabelSet) {
        let labels = Self::derive(set.records());
        for (record, label) in set.records_mut().iter_mut().zip(labels) {
            record.label = label;
        }
    }

    /// Compute the labels without mutating the records
    pub fn derive(records: &[LabelRecord]) -> Vec<String> {
        let mut labels = vec![String::new(); records.len()];

        let mut exercises: Vec<&str> = Vec::new();
        for record in records {
            if !exercises.contains(&record.exercise.as_str()) {
                exercises.push(&record.exercise);
            }
        }

        for exercise in exercises {
            let mut previous_start: Option<u64> = None;
            let mut counter = 0u32;

            for (index, record) in records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.exercise == exercise)
            {
                if previous_start != Some(record.start_frame) {
                    counter += 1;
                }
                previous_start = Some(record.start_frame);
                labels[index] = format!("{}_{}", exercise, counter);
            }
        }

        labels
    }
}

/// Fallbacks for blank or malformed user-entered fields
pub struct FieldCoercion;

impl FieldCoercion {
    /// Repetition counts: blank and NaN become 0, decimals are truncated
    pub fn count(value: &str) -> Result<u32, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Ok(0);
        }
        if let Ok(count) = trimmed.parse::<u32>() {
            return Ok(count);
        }

        // Spreadsheets round-trip integers as "3.0"
        match trimmed.parse::<f64>() {
            Ok(count) if count.is_finite() && count >= 0.0 => Ok(count as u32),
            _ => Err(DomainError::Format(format!(
                "Invalid repetition count: {}",
                trimmed
            ))),
        }
    }

    /// Free text: NaN markers become empty
    pub fn text(value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("nan") {
            String::new()
        } else {
            trimmed.to_string()
        }
    }

    /// Label name used remotely; a blank label gets a random identifier
    pub fn label_name(label: &str) -> String {
        let trimmed = Self::text(label);
        if trimmed.is_empty() {
            random_label()
        } else {
            trimmed
        }
    }
}

/// Random alphanumeric identifier for records that lost their label
pub fn random_label() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LABEL_LEN)
        .map(char::from)
        .collect()
}

/// Remote representation of a record
pub fn remote_label_for(record: &LabelRecord, key: VideoResultKey) -> RemoteLabel {
    RemoteLabel {
        id: None,
        video_result_id: key.video_result_id,
        user_id: key.user_id,
        name: FieldCoercion::label_name(&record.label),
        start_frame: record.start_frame,
        end_frame: record.end_frame,
        exercise: FieldCoercion::text(&record.exercise),
        view: record.orientation,
        min_reps: record.min_reps,
        reps: record.reps,
        rules: FieldCoercion::text(&record.rule),
        reps_to_judge: FieldCoercion::text(&record.reps_to_judge),
        notes: FieldCoercion::text(&record.notes),
        is_valid: record.is_valid,
    }
}

#[cfg(test)]
mod tests;
