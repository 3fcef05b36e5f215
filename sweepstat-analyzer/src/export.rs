use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde_json::json;

use crate::{AnalysisResult, CaptureInfo, OccupancySummary, ThresholdSet, TransitionMatrix};

/// Разделитель полей в текстовом экспорте (как в файлах захвата).
pub const EXPORT_SEPARATOR: char = ';';

pub struct ResultExporter;

impl ResultExporter {
    /// Экспорт порогов, параметров оси и матрицы переходов в `;`-файл.
    pub fn export_results(
        thresholds: &ThresholdSet,
        info: &CaptureInfo,
        matrix: &TransitionMatrix,
        path: &Path,
    ) -> AnalysisResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        Self::write_results(&mut writer, thresholds, info, matrix)?;

        writer.flush()?;
        Ok(())
    }

    /// То же, что [`ResultExporter::export_results`], в произвольный поток.
    pub fn write_results<W: Write>(
        writer: &mut W,
        thresholds: &ThresholdSet,
        info: &CaptureInfo,
        matrix: &TransitionMatrix,
    ) -> AnalysisResult<()> {
        let sep = EXPORT_SEPARATOR;

        write!(writer, "thresholds")?;
        for t in thresholds.levels() {
            write!(writer, "{sep}{t}")?;
        }
        writeln!(writer)?;

        writeln!(writer, "active_threshold{sep}{}", thresholds.active())?;
        writeln!(writer, "carrier_frequency{sep}{}", info.carrier_frequency)?;
        writeln!(writer, "frequency_resolution{sep}{}", info.resolution)?;
        writeln!(writer, "frames{sep}{}", info.frame_count)?;
        writeln!(writer, "duration{sep}{}", info.duration)?;

        writeln!(writer, "# transitions from\\to")?;
        for row in matrix.rows() {
            let line: Vec<String> = row.iter().map(u64::to_string).collect();
            writeln!(writer, "{}", line.join(&sep.to_string()))?;
        }

        Ok(())
    }

    /// JSON-отчёт по сессии.
    pub fn export_session_report(
        summary: &OccupancySummary,
        path: &Path,
    ) -> AnalysisResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &Self::session_report(summary))?;
        writer.flush()?;

        Ok(())
    }

    pub fn session_report(summary: &OccupancySummary) -> serde_json::Value {
        json!({
            "source": summary.source,
            "units": {
                "x": summary.x_unit,
                "y": summary.y_unit,
            },
            "sweep_time_s": summary.sweep_time,
            "start_timestamp": summary.start_timestamp,
            "info": summary.info,
            "classification": {
                "thresholds": summary.thresholds.levels(),
                "active_threshold": summary.thresholds.active(),
                "mode": summary.mode.to_string(),
            },
            "occupancy": summary.occupancy,
            "transitions": summary.transitions.as_ref().map(|m| json!({
                "counts": m.rows(),
                "probabilities": m.probabilities(),
                "total": m.total(),
            })),
        })
    }
}
