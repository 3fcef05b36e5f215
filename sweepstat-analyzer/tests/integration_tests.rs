use std::{fs::File, io::Write};

use approx::assert_relative_eq;
use sweepstat_analyzer::{
    AnalysisConfig, AnalysisError, ClassifyMode, OccupancyEngine, PlotRenderer, PlotSpec,
    ResultExporter,
};
use sweepstat_core::{CaptureError, CaptureFile};
use tempfile::NamedTempFile;

// ===========================================================================
// Helpers
// ===========================================================================

/// Средние уровни кадров: полосы 0,1,1,2,0,1 для порогов [-80, -60].
const AVERAGES: [f64; 6] = [-90.0, -70.0, -70.0, -50.0, -90.0, -70.0];

/// Файл захвата с двумя выборками на кадр: `avg - 10` на 100 Гц и
/// `avg + 10` на 200 Гц, кадры через 1 с.
fn write_capture(averages: &[f64]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();

    write!(
        tmp,
        "Type;FSVR-7;\nSWT;0.005;s\nx-Unit;Hz;\ny-Unit;dBm;\nValues;2;\nFrames;{};\n",
        averages.len()
    )
    .unwrap();

    for (i, avg) in averages.iter().enumerate() {
        write!(
            tmp,
            "Frame;{};\nTimestamp;12.Apr 17;17:55:{:02}.000;\n100;{};\n200;{};\n",
            i + 1,
            10 + i,
            avg - 10.0,
            avg + 10.0
        )
        .unwrap();
    }
    tmp.flush().unwrap();

    tmp
}

fn band_config(active_index: usize) -> AnalysisConfig {
    AnalysisConfig {
        frame_count: AVERAGES.len(),
        thresholds: vec![-80.0, -60.0],
        active_index,
        ..AnalysisConfig::default()
    }
}

// ===========================================================================
// Открытие
// ===========================================================================

#[test]
fn test_open_missing_file() {
    let err = OccupancyEngine::open("/no/such/capture.DAT", &AnalysisConfig::default())
        .err()
        .unwrap();

    assert!(matches!(
        err,
        AnalysisError::Capture(CaptureError::FileNotFound(_))
    ));
}

#[test]
fn test_incomplete_header_then_not_initialized() {
    let mut tmp = NamedTempFile::new().unwrap();
    for i in 0..40 {
        writeln!(tmp, "Key{i};value;").unwrap();
    }
    tmp.flush().unwrap();

    let mut capture = CaptureFile::new(File::open(tmp.path()).unwrap(), "broken");

    assert!(matches!(
        capture.read_header(30),
        Err(CaptureError::HeaderIncomplete(_))
    ));
    assert!(matches!(capture.rewind(), Err(CaptureError::NotInitialized)));
    assert!(matches!(capture.read_frame(), Err(CaptureError::NotInitialized)));
}

// ===========================================================================
// Анализ
// ===========================================================================

#[test]
fn test_frame_count_clamped_to_file() {
    let averages = vec![-70.0; 50];
    let tmp = write_capture(&averages);
    let mut engine = OccupancyEngine::open(tmp.path(), &AnalysisConfig::default()).unwrap();

    assert_eq!(engine.frame_count(), 10);
    assert_eq!(engine.set_frame_count(1000).unwrap(), 50);
    assert_eq!(engine.average_per_frame().unwrap().len(), 50);
    assert_relative_eq!(engine.compute_info().unwrap().duration, 49.0);
}

#[test]
fn test_averages_and_peaks() {
    let tmp = write_capture(&AVERAGES);
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    assert_eq!(engine.average_per_frame().unwrap(), AVERAGES.to_vec());

    // Все пики на 200 Гц: остаётся уровень последнего кадра
    let max = engine.max_per_frame().unwrap();
    assert_eq!(max.points(), vec![(200.0, -60.0)]);

    let peaks = engine.peaks_per_frame().unwrap();
    assert_eq!(peaks.len(), 6);
    assert_eq!(peaks[3].level, -40.0);
    assert_eq!(peaks[3].frame, "4");

    engine.add_filter(100.0);
    assert_eq!(
        engine.filtered_average_per_frame().unwrap(),
        AVERAGES.iter().map(|a| a - 10.0).collect::<Vec<_>>()
    );
}

#[test]
fn test_markov_zero_state() {
    let tmp = write_capture(&AVERAGES);
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    let states = engine.classify_series().unwrap();
    assert_eq!(
        states,
        vec![Some(0), Some(1), Some(1), Some(2), Some(0), Some(1)]
    );

    let m = engine.transition_matrix().unwrap();
    assert_eq!(m.size(), 3);
    assert_eq!(m.get(0, 1), 2);
    assert_eq!(m.get(1, 1), 1);
    assert_eq!(m.get(1, 2), 1);
    assert_eq!(m.get(2, 0), 1);
    assert_eq!(m.total(), 5);
}

#[test]
fn test_markov_exclude_below() {
    let tmp = write_capture(&AVERAGES);
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    engine.set_mode(ClassifyMode::ExcludeBelow);

    let m = engine.transition_matrix().unwrap();
    assert_eq!(m.get(1, 1), 1);
    assert_eq!(m.get(1, 2), 1);
    assert_eq!(m.get(2, 1), 1);
    assert_eq!(m.total(), 3);
}

#[test]
fn test_occupancy_and_cdf() {
    let tmp = write_capture(&AVERAGES);
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    // Активный порог -80: кадры 2, 3, 4, 6
    assert_relative_eq!(engine.occupancy().unwrap(), 4.0 / 6.0);

    let cdf = engine.inter_arrival_cdf().unwrap();
    assert_eq!(cdf.gaps, vec![1.0, 1.0, 2.0]);
    assert_relative_eq!(cdf.cdf[0], 0.25);
    assert_relative_eq!(cdf.cdf[1], 0.5);
    assert_relative_eq!(cdf.cdf[2], 1.0);

    // Активный порог -60: только кадр 4
    engine.set_thresholds(&[-80.0, -60.0], 1).unwrap();
    assert_relative_eq!(engine.occupancy().unwrap(), 1.0 / 6.0);

    let err = engine.inter_arrival_cdf().unwrap_err();
    assert!(err.is_not_computed());
}

#[test]
fn test_values_over_threshold() {
    let tmp = write_capture(&AVERAGES);
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    engine.set_threshold(-65.0).unwrap();
    assert_eq!(engine.values_over_threshold().unwrap().points(), vec![(200.0, -60.0)]);

    engine.set_threshold(-59.0).unwrap();
    assert!(engine.values_over_threshold().unwrap().is_empty());
}

// ===========================================================================
// Экспорт
// ===========================================================================

#[test]
fn test_export_and_plot_pipeline() {
    let tmp = write_capture(&AVERAGES);
    let dir = tempfile::tempdir().unwrap();
    let mut engine = OccupancyEngine::open(tmp.path(), &band_config(0)).unwrap();

    let info = engine.compute_info().unwrap().clone();
    let matrix = engine.transition_matrix().unwrap();
    let results = dir.path().join("results.txt");

    ResultExporter::export_results(engine.thresholds(), &info, &matrix, &results).unwrap();

    let text = std::fs::read_to_string(&results).unwrap();
    assert!(text.contains("carrier_frequency;200\n"));
    assert!(text.contains("frequency_resolution;100\n"));
    assert!(text.contains("frames;6\n"));

    let summary = engine.summary().unwrap();
    let report = dir.path().join("report.json");
    ResultExporter::export_session_report(&summary, &report).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["transitions"]["total"], 5);
    assert_eq!(json["info"]["duration"], 5.0);

    let averages = engine.average_per_frame().unwrap();
    let points: Vec<(f64, f64)> = info.timeline.iter().copied().zip(averages).collect();
    let spec = PlotSpec::new("avg", "s", "dBm").with_threshold(-80.0);
    let png = PlotRenderer::default()
        .render(&points, &spec, Some(&dir.path().join(spec.default_file_name())))
        .unwrap();

    assert!(png.ends_with("avg.png"));
    assert!(png.exists());
}
