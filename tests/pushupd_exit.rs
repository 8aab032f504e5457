//! pushupd process behaviour when its landmark source breaks.

use std::process::Command;

use pushup_kernel::SessionSummary;

#[test]
fn unreadable_source_still_prints_summary() {
    // A directory opens fine but every read fails.
    let dir = tempfile::tempdir().expect("temp dir");

    let output = Command::new(env!("CARGO_BIN_EXE_pushupd"))
        .env_remove("PUSHUP_CONFIG")
        .env_remove("PUSHUP_HYSTERESIS")
        .env_remove("PUSHUP_SIDE")
        .env_remove("PUSHUP_FRAME_INTERVAL_MS")
        .env_remove("PUSHUP_FPS")
        .env("PUSHUP_SOURCE", dir.path())
        .env("RUST_LOG", "off")
        .output()
        .expect("run pushupd");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unhealthy"), "{stderr}");

    let summary: SessionSummary =
        serde_json::from_slice(&output.stdout).expect("summary on stdout");
    assert_eq!(summary.reps, 0);
    assert_eq!(summary.frames_seen, 0);
}
