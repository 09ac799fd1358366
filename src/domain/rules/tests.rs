// Unit tests for label rules

use super::*;

fn record(exercise: &str, start_frame: u64) -> LabelRecord {
    LabelRecord {
        start_frame,
        end_frame: start_frame + 30,
        exercise: exercise.to_string(),
        orientation: Orientation::Front,
        min_reps: 0,
        reps: 0,
        rule: String::new(),
        is_valid: Validity::NotApplicable,
        reps_to_judge: String::new(),
        notes: String::new(),
        label: String::new(),
    }
}

#[test]
fn test_assigner_reuses_id_for_revisited_start() {
    let mut set = LabelSet::from_records(vec![
        record("squat", 10),
        record("squat", 10),
        record("squat", 20),
        record("lunge", 10),
        record("squat", 20),
    ]);

    LabelIdAssigner::assign(&mut set);

    let labels: Vec<&str> = set.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["squat_1", "squat_1", "squat_2", "lunge_1", "squat_2"]);
}

#[test]
fn test_assigner_merges_equal_starts_across_other_exercises() {
    let records = vec![
        record("squat", 10),
        record("lunge", 40),
        record("squat", 10),
        record("squat", 50),
        record("lunge", 40),
        record("lunge", 10),
    ];

    assert_eq!(
        LabelIdAssigner::derive(&records),
        vec!["squat_1", "lunge_1", "squat_1", "squat_2", "lunge_1", "lunge_2"]
    );
}

#[test]
fn test_assigner_counts_returning_start_as_new_segment() {
    let records = vec![record("plank", 10), record("plank", 20), record("plank", 10)];
    assert_eq!(
        LabelIdAssigner::derive(&records),
        vec!["plank_1", "plank_2", "plank_3"]
    );
}

#[test]
fn test_assigner_on_empty_set() {
    let mut set = LabelSet::new();
    LabelIdAssigner::assign(&mut set);
    assert!(set.is_empty());
}

#[test]
fn test_count_coercion() {
    assert_eq!(FieldCoercion::count("").unwrap(), 0);
    assert_eq!(FieldCoercion::count("NaN").unwrap(), 0);
    assert_eq!(FieldCoercion::count("12").unwrap(), 12);
    assert_eq!(FieldCoercion::count("3.0").unwrap(), 3);
    assert!(FieldCoercion::count("-2").is_err());
    assert!(FieldCoercion::count("many").is_err());
}

#[test]
fn test_text_coercion() {
    assert_eq!(FieldCoercion::text(" nan "), "");
    assert_eq!(FieldCoercion::text(" knees out "), "knees out");
}

#[test]
fn test_random_label_shape() {
    let label = random_label();
    assert_eq!(label.len(), RANDOM_LABEL_LEN);
    assert!(label.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_remote_label_for_fills_missing_label() {
    let key = VideoResultKey::new(3, 9).unwrap();
    let mut labeled = record("squat", 0);
    labeled.label = "squat_1".to_string();
    assert_eq!(remote_label_for(&labeled, key).name, "squat_1");

    let remote = remote_label_for(&record("squat", 0), key);
    assert_eq!(remote.name.len(), RANDOM_LABEL_LEN);
    assert_eq!(remote.video_result_id, 9);
    assert_eq!(remote.user_id, 3);
}
