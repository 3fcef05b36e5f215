use std::io::Write;

use sweepstat_analyzer::AnalysisConfig;
use sweepstat_cli::{Flow, Session};
use tempfile::{NamedTempFile, TempDir};

// ===========================================================================
// Helpers
// ===========================================================================

/// 6 кадров по 3 выборки, средние -90, -70, -70, -50, -90, -70.
fn write_capture() -> NamedTempFile {
    let averages = [-90.0, -70.0, -70.0, -50.0, -90.0, -70.0];
    let mut tmp = NamedTempFile::new().unwrap();

    write!(
        tmp,
        "Type;FSVR-7;\nSWT;0.005;s\nx-Unit;Hz;\ny-Unit;dBm;\nValues;3;\nFrames;6;\n"
    )
    .unwrap();

    for (i, avg) in averages.iter().enumerate() {
        write!(
            tmp,
            "Frame;{};\nTimestamp;12.Apr 17;17:56:{:02}.500;\n1000;{};\n2000;{};\n3000;{};\n",
            i + 1,
            i * 2,
            avg - 5.0,
            avg,
            avg + 5.0
        )
        .unwrap();
    }
    tmp.flush().unwrap();

    tmp
}

fn session(dir: &TempDir) -> Session<Vec<u8>> {
    Session::new(AnalysisConfig::default(), Vec::new(), dir.path())
}

fn run(
    session: &mut Session<Vec<u8>>,
    script: &str,
) -> String {
    let before = session.output().len();
    session.run_script(script);
    String::from_utf8_lossy(&session.output()[before..]).into_owned()
}

// ===========================================================================
// Сценарии
// ===========================================================================

#[test]
fn test_open_clamps_default_points() {
    let capture = write_capture();
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    let out = run(&mut s, &format!("open {}", capture.path().display()));

    assert!(out.contains("6 frames, analysing 6"), "{out}");
    assert_eq!(s.engine().unwrap().frame_count(), 6);
}

#[test]
fn test_open_missing_file_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    let out = run(&mut s, "open /no/such/file.DAT; info");

    assert!(out.contains("error: Capture error: Capture file not found"), "{out}");
    assert!(out.contains("error: No capture file is open"), "{out}");
    assert!(s.engine().is_none());
}

#[test]
fn test_analysis_commands() {
    let capture = write_capture();
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    run(&mut s, &format!("open {}", capture.path().display()));

    let out = run(&mut s, "thresholds -80,-60; avg");
    assert_eq!(out, "0;-90\n1;-70\n2;-70\n3;-50\n4;-90\n5;-70\n");

    let out = run(&mut s, "max");
    assert_eq!(out, "3000;-65\n");

    let out = run(&mut s, "occupancy");
    assert_eq!(out, "occupancy: 66.67% of frames at or above -80\n");

    let out = run(&mut s, "markov");
    assert!(out.starts_with("from\\to"));
    assert_eq!(out.lines().count(), 4);

    let out = run(&mut s, "info");
    assert!(out.contains("carrier     : 2000 Hz"), "{out}");
    assert!(out.contains("duration    : 10 s"), "{out}");
}

#[test]
fn test_not_computed_is_a_warning() {
    let capture = write_capture();
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    run(&mut s, &format!("open {}", capture.path().display()));

    let out = run(&mut s, "favg; points 1; avg; points 6; avg");

    assert!(out.contains("warning: Filter mask selects no samples"), "{out}");
    assert!(out.contains("warning: Insufficient frames"), "{out}");
    assert!(out.ends_with("5;-70\n"), "{out}");
}

#[test]
fn test_plots_and_exports() {
    let capture = write_capture();
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    run(&mut s, &format!("open {}", capture.path().display()));

    let out = run(&mut s, "lfp");
    assert!(out.contains("error: Capture error: No frame has been read yet"), "{out}");

    let results = dir.path().join("results.txt");
    let report = dir.path().join("report.json");
    let script = format!(
        "threshold -75; add_filter 2kHz; avgp; fsp; tdp; fp 2; lfp; export {}; report {}",
        results.display(),
        report.display()
    );
    let out = run(&mut s, &script);

    assert!(!out.contains("error"), "{out}");
    for name in [
        "avg_6.png",
        "threshold_statistic_6.png",
        "time_delta_eval_6.png",
        "figure_3.png",
    ] {
        assert!(dir.path().join(name).exists(), "{name} missing: {out}");
    }

    let text = std::fs::read_to_string(&results).unwrap();
    assert!(text.starts_with("thresholds;-75\n"));
    assert!(text.contains("frequency_resolution;1000\n"));

    let json = std::fs::read_to_string(&report).unwrap();
    assert!(json.contains("\"occupancy\""));
}

#[test]
fn test_exit_ends_script() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(&dir);

    assert_eq!(s.run_script("help; exit; points 3"), Flow::Exit);
    assert_eq!(s.config().frame_count, 10);
}
