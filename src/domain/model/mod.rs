// Domain models - Core types and data structures

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::DomainError;
use crate::domain::rules::LabelIdAssigner;

/// Wall-clock position inside a video with one-second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: u64,
}

impl Timestamp {
    /// Create a timestamp from elapsed seconds
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Create a timestamp from hours, minutes and seconds
    pub fn from_components(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self {
            seconds: hours * 3600 + minutes * 60 + seconds,
        }
    }

    /// Parse an `H:MM:SS` string; hours may exceed 23, minutes and seconds are two digits below 60
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        let invalid = |reason: &str| {
            DomainError::Format(format!("'{}' is not a HH:MM:SS timestamp ({})", trimmed, reason))
        };

        let parts: Vec<&str> = trimmed.split(':').collect();
        let [hours, minutes, seconds] = parts.as_slice() else {
            return Err(invalid("expected three fields"));
        };

        let field = |text: &str, width: Option<usize>| -> Result<u64, DomainError> {
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("fields must be digits"));
            }
            if width.is_some_and(|w| text.len() != w) {
                return Err(invalid("minutes and seconds take two digits"));
            }
            text.parse::<u64>().map_err(|_| invalid("hours out of range"))
        };

        let hours = field(hours, None)?;
        let minutes = field(minutes, Some(2))?;
        let seconds = field(seconds, Some(2))?;
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid("minutes and seconds must be below 60"));
        }
        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .map(Self::from_seconds)
            .ok_or_else(|| invalid("hours out of range"))
    }

    /// Elapsed seconds
    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }

    /// Milliseconds, as used by media player positions
    pub fn as_millis(&self) -> u64 {
        self.seconds * 1000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

impl FromStr for Timestamp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Frames per second of a video, always finite and positive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FrameRate(f64);

impl FrameRate {
    /// Create a frame rate
    pub fn new(fps: f64) -> Result<Self, DomainError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Frame rate must be a positive number, got {}",
                fps
            )));
        }
        Ok(Self(fps))
    }

    /// Frames per second
    pub fn fps(&self) -> f64 {
        self.0
    }

    /// Frame index at a timestamp, truncated toward zero
    pub fn to_frame(&self, timestamp: Timestamp) -> u64 {
        (timestamp.as_seconds() as f64 * self.0) as u64
    }

    /// Timestamp of a frame, rounded to the nearest second
    pub fn to_timestamp(&self, frame: u64) -> Timestamp {
        Timestamp::from_seconds((frame as f64 / self.0).round() as u64)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Convert an `HH:MM:SS` timestamp to a frame index
pub fn to_frame(timestamp: &str, fps: f64) -> Result<u64, DomainError> {
    let rate = FrameRate::new(fps)?;
    Ok(rate.to_frame(Timestamp::parse(timestamp)?))
}

/// Convert a frame index to an `HH:MM:SS` timestamp
pub fn to_timestamp(frame: u64, fps: f64) -> Result<String, DomainError> {
    let rate = FrameRate::new(fps)?;
    Ok(rate.to_timestamp(frame).to_string())
}

/// Camera angle of the exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Front,
    Side,
    Diagonal,
}

impl Orientation {
    /// Parse orientation; blank input falls back to `front`
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "" | "front" => Ok(Orientation::Front),
            "side" => Ok(Orientation::Side),
            "diagonal" => Ok(Orientation::Diagonal),
            other => Err(DomainError::Format(format!(
                "Invalid orientation: {}. Valid orientations: front, side, diagonal",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Front => "front",
            Orientation::Side => "side",
            Orientation::Diagonal => "diagonal",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the segment was judged as a valid execution.
///
/// Serialized as a boolean, or the string `"N/A"` when not judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Validity {
    Valid,
    Invalid,
    #[default]
    NotApplicable,
}

impl Validity {
    /// Parse validity; blank input falls back to `N/A`
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim() {
            "true" | "True" | "TRUE" | "1" => Ok(Validity::Valid),
            "false" | "False" | "FALSE" | "0" => Ok(Validity::Invalid),
            "" | "N/A" | "n/a" | "nan" | "NaN" => Ok(Validity::NotApplicable),
            other => Err(DomainError::Format(format!(
                "Invalid validity flag: {}. Expected true, false or N/A",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Validity::Valid => "true",
            Validity::Invalid => "false",
            Validity::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Validity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Validity::Valid => serializer.serialize_bool(true),
            Validity::Invalid => serializer.serialize_bool(false),
            Validity::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Validity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValidityVisitor)
    }
}

struct ValidityVisitor;

impl<'de> Visitor<'de> for ValidityVisitor {
    type Value = Validity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, 0/1, or \"N/A\"")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Validity, E> {
        Ok(if value { Validity::Valid } else { Validity::Invalid })
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Validity, E> {
        match value {
            1 => Ok(Validity::Valid),
            0 => Ok(Validity::Invalid),
            other => Err(E::invalid_value(de::Unexpected::Unsigned(other), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Validity, E> {
        match u64::try_from(value) {
            Ok(value) => self.visit_u64(value),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(value), &self)),
        }
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Validity, E> {
        if value.is_nan() {
            Ok(Validity::NotApplicable)
        } else if value == 1.0 {
            Ok(Validity::Valid)
        } else if value == 0.0 {
            Ok(Validity::Invalid)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Validity, E> {
        Validity::parse(value).map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Validity, E> {
        Ok(Validity::NotApplicable)
    }

    fn visit_none<E: de::Error>(self) -> Result<Validity, E> {
        Ok(Validity::NotApplicable)
    }
}

/// Column of a table row holding a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumn {
    Start,
    End,
}

impl TimeColumn {
    fn index(&self) -> usize {
        match self {
            TimeColumn::Start => 0,
            TimeColumn::End => 1,
        }
    }
}

/// One editable row of the label table, positions kept as entered
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentRow {
    pub start_time: String,
    pub end_time: String,
    pub exercise: String,
    pub orientation: Orientation,
    pub min_reps: u32,
    pub reps: u32,
    pub rule: String,
    pub is_valid: Validity,
    pub reps_to_judge: String,
    pub notes: String,
}

impl SegmentRow {
    /// Raw text of a time column
    pub fn time_cell(&self, column: TimeColumn) -> &str {
        match column {
            TimeColumn::Start => &self.start_time,
            TimeColumn::End => &self.end_time,
        }
    }
}

/// Ordered label rows being edited before export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    rows: Vec<SegmentRow>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<SegmentRow>) -> Self {
        Self { rows }
    }

    /// Index the next appended row will occupy
    pub fn cursor(&self) -> usize {
        self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SegmentRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&SegmentRow> {
        self.rows.get(index)
    }

    /// Append a row at the cursor and return the new cursor
    pub fn append(&mut self, row: SegmentRow) -> usize {
        self.rows.push(row);
        self.cursor()
    }

    /// Copy the last row into the cursor slot
    pub fn duplicate_last(&mut self) -> Result<usize, DomainError> {
        let last = self
            .rows
            .last()
            .cloned()
            .ok_or_else(|| DomainError::BadArgs("No row to copy, the table is empty".to_string()))?;
        Ok(self.append(last))
    }

    /// Remove the given rows, ignoring out-of-range indices; returns how many were removed
    pub fn remove(&mut self, indices: &[usize]) -> usize {
        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.rows.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        for &index in sorted.iter().rev() {
            self.rows.remove(index);
        }
        sorted.len()
    }

    /// Drop every row
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Read a time cell as a position to seek the player to
    pub fn seek_position(&self, index: usize, column: TimeColumn) -> Result<Timestamp, DomainError> {
        let row = self
            .rows
            .get(index)
            .ok_or_else(|| DomainError::BadArgs(format!("Row {} does not exist", index)))?;
        let value = row.time_cell(column);

        Timestamp::parse(value).map_err(|_| DomainError::Unparseable {
            row: index,
            column: column.index(),
            value: value.to_string(),
        })
    }

    /// Convert every row to frames and derive label ids
    pub fn to_label_set(&self, rate: FrameRate) -> Result<LabelSet, DomainError> {
        let mut records = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let start = self.seek_position(index, TimeColumn::Start)?;
            let end = self.seek_position(index, TimeColumn::End)?;
            records.push(LabelRecord::new(
                rate.to_frame(start),
                rate.to_frame(end),
                row,
            )?);
        }

        let mut set = LabelSet::from_records(records);
        LabelIdAssigner::assign(&mut set);
        Ok(set)
    }
}

/// Labeled segment in frame units, ready for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub start_frame: u64,
    pub end_frame: u64,
    pub exercise: String,
    pub orientation: Orientation,
    pub min_reps: u32,
    pub reps: u32,
    pub rule: String,
    pub is_valid: Validity,
    pub reps_to_judge: String,
    pub notes: String,
    pub label: String,
}

impl LabelRecord {
    /// Build a record from a table row; the label is assigned later
    pub fn new(start_frame: u64, end_frame: u64, row: &SegmentRow) -> Result<Self, DomainError> {
        if start_frame > end_frame {
            return Err(DomainError::Format(format!(
                "Segment for '{}' ends ({}) before it starts ({})",
                row.exercise, row.end_time, row.start_time
            )));
        }

        Ok(Self {
            start_frame,
            end_frame,
            exercise: row.exercise.clone(),
            orientation: row.orientation,
            min_reps: row.min_reps,
            reps: row.reps,
            rule: row.rule.clone(),
            is_valid: row.is_valid,
            reps_to_judge: row.reps_to_judge.clone(),
            notes: row.notes.clone(),
            label: String::new(),
        })
    }

    /// Convert back to an editable row
    pub fn to_row(&self, rate: FrameRate) -> SegmentRow {
        SegmentRow {
            start_time: rate.to_timestamp(self.start_frame).to_string(),
            end_time: rate.to_timestamp(self.end_frame).to_string(),
            exercise: self.exercise.clone(),
            orientation: self.orientation,
            min_reps: self.min_reps,
            reps: self.reps,
            rule: self.rule.clone(),
            is_valid: self.is_valid,
            reps_to_judge: self.reps_to_judge.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Ordered label records for one video result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    records: Vec<LabelRecord>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<LabelRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: LabelRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LabelRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [LabelRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelRecord> {
        self.records.iter()
    }

    /// Convert to an editable table
    pub fn to_table(&self, rate: FrameRate) -> LabelTable {
        LabelTable::from_rows(self.records.iter().map(|r| r.to_row(rate)).collect())
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a LabelRecord;
    type IntoIter = std::slice::Iter<'a, LabelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Owner of a set of remote labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoResultKey {
    pub user_id: i64,
    pub video_result_id: i64,
}

impl VideoResultKey {
    pub fn new(user_id: i64, video_result_id: i64) -> Result<Self, DomainError> {
        if user_id < 0 || video_result_id < 0 {
            return Err(DomainError::BadArgs(
                "Both user ID and video result ID are required".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            video_result_id,
        })
    }

    /// Object storage key of a file belonging to this video result
    pub fn object_key(&self, filename: &str) -> String {
        format!("{}/{}/{}", self.user_id, self.video_result_id, filename)
    }
}

impl fmt::Display for VideoResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} / video result {}", self.user_id, self.video_result_id)
    }
}

/// Label as stored by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub video_result_id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    pub start_frame: u64,
    pub end_frame: u64,
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub view: Orientation,
    #[serde(default)]
    pub min_reps: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub rules: String,
    #[serde(default)]
    pub reps_to_judge: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_valid: Validity,
}

impl RemoteLabel {
    /// Map the remote fields onto a local record
    pub fn to_record(&self) -> LabelRecord {
        LabelRecord {
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            exercise: self.exercise.clone(),
            orientation: self.view,
            min_reps: self.min_reps,
            reps: self.reps,
            rule: self.rules.clone(),
            is_valid: self.is_valid,
            reps_to_judge: self.reps_to_judge.clone(),
            notes: self.notes.clone(),
            label: self.name.clone(),
        }
    }
}

/// Video result as returned by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
}
