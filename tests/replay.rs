use std::path::PathBuf;
use std::time::Duration;

use cropview::history::CropRecord;
use cropview::playback::ManualClock;
use cropview::replay::{run_script_with_clock, ReplayScript};
use cropview::session::SessionError;
use cropview::AppError;

fn script(json: &str) -> ReplayScript {
    serde_json::from_str(json).expect("replay script should parse")
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("cropview-replay-tests");
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir.join(name)
}

#[test]
fn aspect_locked_commit_on_wide_source_writes_cropped_frame() {
    let output = temp_path("aspect-locked.png");
    let mut script = script(
        r#"{
            "config": {"mod_x": 4, "mod_y": 4},
            "sources": [{"width": 160, "height": 90}],
            "events": [
                {"pointer": "down", "x": 0, "y": 0},
                {"pointer": "move", "x": 123, "y": 50, "shift": true},
                {"pointer": "up", "x": 123, "y": 50, "shift": true},
                {"command": "commitCrop"}
            ]
        }"#,
    );
    script.output = Some(output.clone());

    let clock = ManualClock::new();
    let report = run_script_with_clock(&script, &clock).expect("replay should run");

    assert_eq!(
        report.history,
        vec![CropRecord::full_frame(160, 90), CropRecord::new(64, 36, 0, 0)]
    );
    assert_eq!(report.frames_presented, 5);
    assert_eq!(
        report.status.last().map(String::as_str),
        Some("cropped_clip1 = Crop(clip1, width=64, height=36, left=0, top=0)  #mods(4,4) #subs(2,2)")
    );
    let written = image::open(&output).expect("output frame should decode");
    assert_eq!((written.width(), written.height()), (64, 36));
    std::fs::remove_file(&output).expect("output should be removable");
}

#[test]
fn quick_zoom_then_zoom_out_returns_to_full_frame() {
    let script = script(
        r#"{
            "config": {},
            "sources": [{"width": 200, "height": 100}],
            "events": [
                {"pointer": "doubleClick", "x": 80, "y": 20},
                {"command": "cancelZoom"},
                {"command": "cancelZoom"}
            ]
        }"#,
    );

    let clock = ManualClock::new();
    let report = run_script_with_clock(&script, &clock).expect("replay should run");

    assert_eq!(report.history, vec![CropRecord::full_frame(200, 100)]);
    let zoomed = "cropped_clip1 = Crop(clip1, width=100, height=50, left=30, top=0)";
    assert!(report.status.iter().any(|line| line.starts_with(zoomed)));
    assert_eq!(
        report.status.last().map(String::as_str),
        Some("clip1 = Crop(clip1, width=200, height=100, left=0, top=0)")
    );
}

#[test]
fn failing_source_rolls_back_commit() {
    let script = script(
        r#"{
            "config": {},
            "sources": [
                {"width": 100, "height": 100},
                {"width": 100, "height": 100, "fail_crop": true}
            ],
            "events": [
                {"pointer": "down", "x": 10, "y": 10},
                {"pointer": "move", "x": 51, "y": 73},
                {"pointer": "up", "x": 51, "y": 73},
                {"pointer": "secondaryDown", "x": 51, "y": 73}
            ]
        }"#,
    );

    let clock = ManualClock::new();
    let report = run_script_with_clock(&script, &clock).expect("replay should run");

    assert_eq!(report.history, vec![CropRecord::full_frame(100, 100)]);
    assert!(report.status.iter().any(|line| line.contains("crop failed")));
    let last = report.last_frame.expect("a frame should be presented");
    assert_eq!(last.dimensions(), (100, 100));
}

#[test]
fn playback_is_paced_and_stops_at_range_end() {
    let script = script(
        r#"{
            "config": {"play": true, "frames": [0, 2], "delay_ms": 20},
            "sources": [{"width": 32, "height": 32, "frames": 10}],
            "events": [{"idle": 3}]
        }"#,
    );

    let clock = ManualClock::new();
    let report = run_script_with_clock(&script, &clock).expect("replay should run");

    assert_eq!(report.frames_presented, 4);
    assert_eq!(clock.total_slept(), Duration::from_millis(40));
    let last = report.last_frame.expect("a frame should be presented");
    assert_eq!(last.get_pixel(0, 0).0[2], 1);
}

#[test]
fn script_without_loadable_source_fails() {
    let script = script(
        r#"{
            "config": {},
            "sources": [{"width": 32, "height": 32, "fail_load": true}]
        }"#,
    );

    let clock = ManualClock::new();
    let result = run_script_with_clock(&script, &clock);
    assert!(matches!(result, Err(AppError::Session(SessionError::NoSources))));
}

#[test]
fn run_reads_script_from_disk() {
    let path = temp_path("pick-source.json");
    std::fs::write(
        &path,
        r#"{
            "config": {},
            "sources": [{"width": 64, "height": 64}, {"width": 64, "height": 64}],
            "events": [{"command": "pickSource", "source": 1}]
        }"#,
    )
    .expect("script should be writable");

    let report = cropview::run(&path).expect("replay should run");
    assert_eq!(
        report.status.last().map(String::as_str),
        Some("clip2 = Crop(clip2, width=64, height=64, left=0, top=0)")
    );
    std::fs::remove_file(&path).expect("script should be removable");

    let missing = cropview::run(&temp_path("missing.json"));
    assert!(matches!(missing, Err(AppError::Config(_))));
}
