use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use exercise_labeler::adapters::*;
use exercise_labeler::app::*;
use exercise_labeler::domain::rules::LabelIdAssigner;
use exercise_labeler::ports::*;
use exercise_labeler::*;

/// Test utilities for label tables and videos
mod test_utils {
    use super::*;

    pub const HEADER: &str =
        "start_time,end_time,exercise,orientation,min_reps,reps,rule,is_valid,reps_to_judge,notes";

    /// Write a table file with the given data lines
    pub fn write_table(path: &Path, lines: &[&str]) {
        let mut content = String::from(HEADER);
        for line in lines {
            content.push('\n');
            content.push_str(line);
        }
        content.push('\n');
        std::fs::write(path, content).expect("Failed to write table");
    }

    /// Create a 30 fps test video using the ffmpeg command line, if available
    pub fn create_test_video(output_path: &Path) -> bool {
        std::process::Command::new("ffmpeg")
            .args(["-f", "lavfi", "-i", "testsrc=duration=2:size=160x120:rate=30"])
            .args(["-c:v", "mpeg4", "-y"])
            .arg(output_path)
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    pub fn labeler() -> Command {
        let mut cmd = Command::cargo_bin("labeler").expect("labeler binary");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

// ============================================================================
// LIBRARY TESTS
// ============================================================================

#[test]
fn test_time_frame_conversion() {
    assert_eq!(to_frame("00:00:10", 30.0).unwrap(), 300);
    assert_eq!(to_frame("01:00:00", 25.0).unwrap(), 90_000);
    assert_eq!(to_timestamp(300, 30.0).unwrap(), "00:00:10");
    assert!(to_frame("10", 30.0).is_err());
    assert!(to_timestamp(10, 0.0).is_err());
}

#[test]
fn test_round_trip_on_whole_seconds() {
    for fps in [24.0, 25.0, 30.0, 60.0] {
        for seconds in [0u64, 1, 59, 61, 3599, 7322] {
            let frame = seconds * fps as u64;
            let back = to_frame(&to_timestamp(frame, fps).unwrap(), fps).unwrap();
            assert!(back.abs_diff(frame) <= 1, "fps {} frame {}", fps, frame);
        }
    }
}

#[test]
fn test_label_ids_follow_first_appearance() {
    let rows: Vec<SegmentRow> = [
        ("squat", "00:00:10"),
        ("squat", "00:00:10"),
        ("squat", "00:00:20"),
        ("lunge", "00:00:10"),
        ("squat", "00:00:20"),
    ]
    .iter()
    .map(|(exercise, start)| SegmentRow {
        start_time: start.to_string(),
        end_time: "00:00:30".to_string(),
        exercise: exercise.to_string(),
        ..SegmentRow::default()
    })
    .collect();

    let labels = LabelTable::from_rows(rows)
        .to_label_set(FrameRate::new(30.0).unwrap())
        .unwrap();
    let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(names, vec!["squat_1", "squat_1", "squat_2", "lunge_1", "squat_2"]);
    assert_eq!(LabelIdAssigner::derive(labels.records()), names);
}

#[tokio::test]
async fn test_push_then_pull_round_trip() {
    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("session.csv");
    test_utils::write_table(
        &table_path,
        &[
            "00:00:05,00:00:15,squat,front,3,5,depth,true,all,good form",
            "00:00:20,00:00:25,squat,front,3,5,knees,false,all,",
            "00:01:00,00:01:30,plank,side,0,1,,N/A,,",
        ],
    );

    let api = Arc::new(InMemoryLabelApi::new());
    api.add_video_result(42);
    let store = Arc::new(InMemoryObjectStore::new());
    store.insert("7/42/full_video.ts", b"ts");
    let rate = FrameRate::new(30.0).unwrap();

    let settings_dir = dir.path().join("work");
    let config = TomlConfigAdapter::new().unwrap();
    config
        .set_config("work_dir", &settings_dir.to_string_lossy())
        .await
        .unwrap();
    let settings = exercise_labeler::config_initialization::AppSettings::from_config(&config)
        .await
        .unwrap();

    let container = DefaultAppContainer::with_ports(
        Ports {
            api: api.clone(),
            store,
            table: Arc::new(CsvTableAdapter::new()),
            probe: Arc::new(FixedRateProbe::new(rate)),
            report: None,
            log: Arc::new(TracingLogAdapter::default()),
        },
        &settings,
    );

    let key = VideoResultKey::new(7, 42).unwrap();
    let table = container
        .export_interactor()
        .import_table(&table_path)
        .await
        .unwrap();
    let labels = table.to_label_set(rate).unwrap();
    let report = container.sync_interactor().sync(key, &labels).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.created, 3);

    let pulled = container
        .pull_interactor()
        .pull(key, None, &settings.work_dir)
        .await
        .unwrap();
    assert_eq!(pulled.table, table);
    assert!(container.report_interactor().is_err());
}

#[test]
fn test_real_video_frame_rate() {
    let dir = TempDir::new().unwrap();
    let video = dir.path().join("clip.mp4");

    // Skip test if ffmpeg is not installed
    if !test_utils::create_test_video(&video) {
        println!("Skipping real video test - ffmpeg not available");
        return;
    }

    let probe = ProbeLibavAdapter::new().unwrap();
    let rate = probe.probe_frame_rate(&video).unwrap();
    assert_eq!(rate.fps(), 30.0);
}

// ============================================================================
// CLI TESTS
// ============================================================================

#[test]
fn test_cli_convert_to_frame() {
    test_utils::labeler()
        .args(["convert", "to-frame", "--time", "00:00:10", "--fps", "30"])
        .assert()
        .success()
        .stdout("300\n");
}

#[test]
fn test_cli_convert_to_time() {
    test_utils::labeler()
        .args(["convert", "to-time", "--frame", "5400", "--fps", "30"])
        .assert()
        .success()
        .stdout("00:03:00\n");
}

#[test]
fn test_cli_convert_rejects_bad_time() {
    test_utils::labeler()
        .args(["convert", "to-frame", "--time", "1:2", "--fps", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1:2"));
}

#[test]
fn test_cli_export_with_fps() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("session.csv");
    let output = dir.path().join("labeled.csv");
    test_utils::write_table(
        &input,
        &["00:00:10,00:00:12,squat,,2,4,depth,1,,", "00:00:20,00:00:25,lunge,side,,,,,,"],
    );

    test_utils::labeler()
        .current_dir(dir.path())
        .arg("export")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--fps", "30"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "start_frame,end_frame,exercise,orientation,min_reps,reps,rule,is_valid,reps_to_judge,notes,label"
    );
    assert_eq!(lines.next().unwrap(), "300,360,squat,front,2,4,depth,true,,,squat_1");
    assert_eq!(lines.next().unwrap(), "600,750,lunge,side,0,0,,N/A,,,lunge_1");
}

#[test]
fn test_cli_export_requires_rate_source() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("session.csv");
    test_utils::write_table(&input, &["00:00:10,00:00:12,squat,,,,,,,"]);

    test_utils::labeler()
        .current_dir(dir.path())
        .arg("export")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--video or --fps"));
}

#[test]
fn test_cli_export_reports_bad_cell() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("session.csv");
    test_utils::write_table(&input, &["00:00:10,later,squat,,,,,,,"]);

    test_utils::labeler()
        .current_dir(dir.path())
        .arg("export")
        .arg("--input")
        .arg(&input)
        .args(["--fps", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("later"));
}

#[test]
fn test_cli_config_show_masks_secrets() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("labeler.toml");
    std::fs::write(
        &config,
        "[labeler]\napi_username = \"coach\"\napi_password = \"hunter2\"\n",
    )
    .unwrap();

    test_utils::labeler()
        .current_dir(dir.path())
        .env_remove("LABELER_API_PASSWORD")
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api_username = coach"))
        .stdout(predicate::str::contains("api_password = ********"))
        .stdout(predicate::str::contains("hunter2").not());
}
