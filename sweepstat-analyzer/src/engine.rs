use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use log::{debug, info, warn};
use serde::Serialize;
use sweepstat_core::CaptureFile;
use sweepstat_types::{seconds_between, CaptureError, Frame, Sample};

use crate::{
    round_to_millis, stats, AnalysisConfig, AnalysisError, AnalysisResult, ClassifyMode,
    InterArrivalCdf, ThresholdSet, TransitionMatrix,
};

/// Скаляры, полученные из первых `frame_count` кадров.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureInfo {
    /// Количество проанализированных кадров
    pub frame_count: usize,
    /// Несущая: частота в середине оси первого кадра
    pub carrier_frequency: f64,
    /// Ширина обзора `|f_first - f_last|`
    pub span: f64,
    /// Шаг по частоте `|f_1 - f_0|`
    pub resolution: f64,
    /// `|ts(last) - ts(first)|` в секундах, округлено до мс
    pub duration: f64,
    /// Время каждого кадра от начала, `frame_count` точек от 0 до `duration`
    pub timeline: Vec<f64>,
}

/// Пик одного кадра (без потерь, в отличие от [`PeakMap`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramePeak {
    pub frame: String,
    pub frequency: f64,
    pub level: f64,
}

/// Упорядоченное отображение частота → уровень пика.
///
/// Повторная вставка той же частоты перезаписывает уровень на прежнем месте:
/// если у двух кадров пик на одной частоте, остаётся уровень более позднего.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakMap {
    entries: Vec<Sample>,
}

/// Итоговая сводка сессии для экспорта.
#[derive(Debug, Clone, Serialize)]
pub struct OccupancySummary {
    pub source: String,
    pub x_unit: String,
    pub y_unit: String,
    pub sweep_time: f64,
    pub start_timestamp: Option<f64>,
    pub info: CaptureInfo,
    pub thresholds: ThresholdSet,
    pub mode: ClassifyMode,
    pub occupancy: Option<f64>,
    pub transitions: Option<TransitionMatrix>,
}

#[derive(Debug, Clone)]
enum EngineState {
    Uninitialized,
    Ready(CaptureInfo),
}

/// Движок анализа занятости канала.
///
/// Каждая операция агрегирования перематывает источник и читает
/// `frame_count` кадров. Перед первой такой операцией (и после смены числа
/// кадров) автоматически выполняется [`OccupancyEngine::compute_info`].
pub struct OccupancyEngine<R: Read + Seek> {
    source: CaptureFile<R>,
    thresholds: ThresholdSet,
    mode: ClassifyMode,
    filter_mask: Vec<f64>,
    frame_count: usize,
    state: EngineState,
}

////////////////////////////////////////////////////////////////////////////////
// PeakMap
////////////////////////////////////////////////////////////////////////////////

impl PeakMap {
    pub fn insert(
        &mut self,
        frequency: f64,
        level: f64,
    ) {
        match self.entries.iter_mut().find(|s| s.frequency == frequency) {
            Some(existing) => existing.level = level,
            None => self.entries.push(Sample { frequency, level }),
        }
    }

    pub fn get(
        &self,
        frequency: f64,
    ) -> Option<f64> {
        self.entries
            .iter()
            .find(|s| s.frequency == frequency)
            .map(|s| s.level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.entries.iter()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.entries.iter().map(|s| (s.frequency, s.level)).collect()
    }
}

impl FromIterator<Sample> for PeakMap {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut map = PeakMap::default();
        for s in iter {
            map.insert(s.frequency, s.level);
        }
        map
    }
}

////////////////////////////////////////////////////////////////////////////////
// OccupancyEngine
////////////////////////////////////////////////////////////////////////////////

impl OccupancyEngine<File> {
    /// Открывает файл захвата и применяет конфигурацию.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: &AnalysisConfig,
    ) -> AnalysisResult<Self> {
        let source = CaptureFile::open_with_limit(path, config.header_line_limit)?;
        Self::new(source, config)
    }
}

impl<R: Read + Seek> OccupancyEngine<R> {
    /// Создаёт движок над источником с уже прочитанным заголовком.
    pub fn new(
        source: CaptureFile<R>,
        config: &AnalysisConfig,
    ) -> AnalysisResult<Self> {
        source.header()?;

        let mut engine = Self {
            source,
            thresholds: ThresholdSet::new(&config.thresholds, config.active_index)?,
            mode: config.mode,
            filter_mask: config.filter_mask.clone(),
            frame_count: 1,
            state: EngineState::Uninitialized,
        };

        engine.set_frame_count(config.frame_count)?;

        Ok(engine)
    }

    // ---------------------------------------------------------------------
    // Конфигурация
    // ---------------------------------------------------------------------

    /// Задаёт число кадров, прижимая его к `[1, available]`.
    ///
    /// Возвращает фактически установленное значение.
    pub fn set_frame_count(
        &mut self,
        requested: usize,
    ) -> AnalysisResult<usize> {
        let available = self.source.frame_count()?;
        let effective = requested.clamp(1, available.max(1));

        if effective != requested {
            warn!(
                "{}: requested {requested} frames, using {effective} ({available} available)",
                self.source.source()
            );
        }

        self.frame_count = effective;
        self.state = EngineState::Uninitialized;

        Ok(effective)
    }

    /// Задаёт набор порогов; активный выбирается по индексу во входном списке.
    pub fn set_thresholds(
        &mut self,
        values: &[f64],
        active_index: usize,
    ) -> AnalysisResult<()> {
        if active_index >= values.len() && !values.is_empty() {
            warn!(
                "active threshold index {active_index} out of range, using {}",
                values.len() - 1
            );
        }

        self.thresholds = ThresholdSet::new(values, active_index)?;

        Ok(())
    }

    /// Один порог, он же активный.
    pub fn set_threshold(
        &mut self,
        level: f64,
    ) -> AnalysisResult<()> {
        self.thresholds = ThresholdSet::single(level)?;
        Ok(())
    }

    pub fn set_mode(
        &mut self,
        mode: ClassifyMode,
    ) {
        self.mode = mode;
    }

    pub fn set_filter_mask(
        &mut self,
        mask: Vec<f64>,
    ) {
        self.filter_mask = mask;
    }

    pub fn add_filter(
        &mut self,
        frequency: f64,
    ) {
        self.filter_mask.push(frequency);
    }

    pub fn clear_filter(&mut self) {
        self.filter_mask.clear();
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn mode(&self) -> ClassifyMode {
        self.mode
    }

    pub fn filter_mask(&self) -> &[f64] {
        &self.filter_mask
    }

    pub fn source(&self) -> &CaptureFile<R> {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut CaptureFile<R> {
        &mut self.source
    }

    /// Результат последнего [`OccupancyEngine::compute_info`], если он актуален.
    pub fn info(&self) -> Option<&CaptureInfo> {
        match &self.state {
            EngineState::Ready(info) => Some(info),
            EngineState::Uninitialized => None,
        }
    }

    // ---------------------------------------------------------------------
    // Анализ
    // ---------------------------------------------------------------------

    /// Вычисляет несущую, обзор, шаг, длительность и временную шкалу.
    pub fn compute_info(&mut self) -> AnalysisResult<&CaptureInfo> {
        let n = self.frame_count;
        let available = self.source.frame_count()?;

        if available == 0 {
            return Err(AnalysisError::InsufficientFrames {
                required: 1,
                available,
            });
        }

        self.source.rewind()?;

        let first = self.source.read_frame()?;
        let axis: Vec<f64> = first.frequencies().collect();

        if axis.is_empty() {
            return Err(AnalysisError::EmptyFrame(first.index.clone()));
        }

        let carrier_frequency = axis[axis.len() / 2];
        let span = (axis[0] - axis[axis.len() - 1]).abs();
        let resolution = axis.get(1).map_or(0.0, |f1| (f1 - axis[0]).abs());
        let first_ts = first.timestamp;
        let mut last_ts = first_ts;

        for _ in 1..n {
            last_ts = self.source.read_frame()?.timestamp;
        }

        let duration = round_to_millis(seconds_between(first_ts, last_ts).abs());

        let info = CaptureInfo {
            frame_count: n,
            carrier_frequency,
            span,
            resolution,
            duration,
            timeline: stats::linspace(0.0, duration, n),
        };

        info!(
            "{}: {n} frames, carrier {carrier_frequency}, span {span}, step {resolution}, duration {duration} s",
            self.source.source()
        );

        self.state = EngineState::Ready(info);

        self.ready_info()
    }

    /// Средний уровень каждого кадра.
    pub fn average_per_frame(&mut self) -> AnalysisResult<Vec<f64>> {
        self.require_series()?;

        self.scan(|frame| {
            frame
                .mean_level()
                .ok_or_else(|| AnalysisError::EmptyFrame(frame.index.clone()))
        })
    }

    /// Средний уровень по частотам из маски фильтра.
    pub fn filtered_average_per_frame(&mut self) -> AnalysisResult<Vec<f64>> {
        if self.filter_mask.is_empty() {
            return Err(AnalysisError::EmptyFilterMask(None));
        }

        self.require_series()?;

        let mask = self.filter_mask.clone();

        self.scan(move |frame| {
            let selected: Vec<f64> = frame
                .samples
                .iter()
                .filter(|s| mask.contains(&s.frequency))
                .map(|s| s.level)
                .collect();

            stats::mean(&selected).ok_or_else(|| {
                warn!("frame {}: filter mask matches no frequency", frame.index);
                AnalysisError::EmptyFilterMask(Some(frame.index.clone()))
            })
        })
    }

    /// Пик каждого кадра, сведённый в отображение частота → уровень.
    pub fn max_per_frame(&mut self) -> AnalysisResult<PeakMap> {
        Ok(self
            .peaks_per_frame()?
            .into_iter()
            .map(|p| Sample {
                frequency: p.frequency,
                level: p.level,
            })
            .collect())
    }

    /// Пик каждого кадра без слияния по частоте.
    pub fn peaks_per_frame(&mut self) -> AnalysisResult<Vec<FramePeak>> {
        self.scan(|frame| {
            let peak = frame
                .peak()
                .ok_or_else(|| AnalysisError::EmptyFrame(frame.index.clone()))?;

            Ok(FramePeak {
                frame: frame.index.clone(),
                frequency: peak.frequency,
                level: peak.level,
            })
        })
    }

    /// Пики не ниже активного порога.
    pub fn values_over_threshold(&mut self) -> AnalysisResult<PeakMap> {
        let active = self.thresholds.active();

        Ok(self
            .max_per_frame()?
            .iter()
            .filter(|s| s.level >= active)
            .copied()
            .collect())
    }

    /// Полоса уровня в текущем режиме классификации.
    pub fn classify(
        &self,
        level: f64,
    ) -> Option<usize> {
        self.thresholds.classify(level, self.mode)
    }

    /// Состояния кадров по среднему уровню.
    pub fn classify_series(&mut self) -> AnalysisResult<Vec<Option<usize>>> {
        let averages = self.average_per_frame()?;

        Ok(averages.into_iter().map(|v| self.classify(v)).collect())
    }

    /// Матрица переходов между полосами по средним уровням кадров.
    pub fn transition_matrix(&mut self) -> AnalysisResult<TransitionMatrix> {
        let states = self.classify_series()?;
        let skipped = states.iter().filter(|s| s.is_none()).count();

        if skipped > 0 {
            debug!("{skipped} frames are unclassifiable and skipped");
        }

        Ok(TransitionMatrix::from_states(
            &states,
            self.thresholds.band_count(),
        ))
    }

    /// CDF интервалов между кадрами, достигшими активного порога.
    pub fn inter_arrival_cdf(&mut self) -> AnalysisResult<InterArrivalCdf> {
        let averages = self.average_per_frame()?;
        let timeline = self.ready_info()?.timeline.clone();

        let times: Vec<f64> = averages
            .iter()
            .zip(&timeline)
            .filter(|&(&v, _)| self.thresholds.is_active(v))
            .map(|(_, &t)| t)
            .collect();

        InterArrivalCdf::from_gaps(stats::gaps(&times))
    }

    /// Доля кадров, средний уровень которых не ниже активного порога.
    pub fn occupancy(&mut self) -> AnalysisResult<f64> {
        let averages = self.average_per_frame()?;
        let active = averages
            .iter()
            .filter(|&&v| self.thresholds.is_active(v))
            .count();

        Ok(active as f64 / averages.len() as f64)
    }

    /// Время между соседними кадрами (первый элемент — 0).
    pub fn time_deltas(&mut self) -> AnalysisResult<Vec<f64>> {
        let stamps = self.scan(|frame| Ok(frame.timestamp))?;
        let mut deltas = Vec::with_capacity(stamps.len());

        deltas.push(0.0);
        deltas.extend(stamps.windows(2).map(|w| seconds_between(w[0], w[1])));

        Ok(deltas)
    }

    /// Сводка для экспорта. Не посчитанные величины остаются `None`.
    pub fn summary(&mut self) -> AnalysisResult<OccupancySummary> {
        self.ensure_ready()?;

        let info = self.ready_info()?.clone();
        let occupancy = self.not_computed_as_none(Self::occupancy)?;
        let transitions = self.not_computed_as_none(Self::transition_matrix)?;
        let start_timestamp = match self.source.seek_frame(0) {
            Ok(frame) => Some(frame.timestamp_secs()),
            Err(e) => {
                warn!("{}: start timestamp unavailable: {e}", self.source.source());
                None
            }
        };
        let header = self.source.header()?;

        Ok(OccupancySummary {
            source: self.source.source().to_string(),
            x_unit: header.x_unit.clone(),
            y_unit: header.y_unit.clone(),
            sweep_time: header.sweep_time,
            start_timestamp,
            info,
            thresholds: self.thresholds.clone(),
            mode: self.mode,
            occupancy,
            transitions,
        })
    }

    // ---------------------------------------------------------------------
    // Внутреннее
    // ---------------------------------------------------------------------

    fn ensure_ready(&mut self) -> AnalysisResult<()> {
        if matches!(self.state, EngineState::Uninitialized) {
            self.compute_info()?;
        }
        Ok(())
    }

    fn ready_info(&self) -> AnalysisResult<&CaptureInfo> {
        self.info()
            .ok_or(AnalysisError::Capture(CaptureError::NotInitialized))
    }

    fn require_series(&self) -> AnalysisResult<()> {
        if self.frame_count < 2 {
            return Err(AnalysisError::InsufficientFrames {
                required: 2,
                available: self.frame_count,
            });
        }
        Ok(())
    }

    /// Перематывает источник и применяет `f` к каждому из `frame_count` кадров.
    fn scan<T>(
        &mut self,
        mut f: impl FnMut(&Frame) -> AnalysisResult<T>,
    ) -> AnalysisResult<Vec<T>> {
        self.ensure_ready()?;
        self.source.rewind()?;

        let mut out = Vec::with_capacity(self.frame_count);

        for _ in 0..self.frame_count {
            let frame = self.source.read_frame()?;
            out.push(f(frame)?);
        }

        Ok(out)
    }

    fn not_computed_as_none<T>(
        &mut self,
        op: fn(&mut Self) -> AnalysisResult<T>,
    ) -> AnalysisResult<Option<T>> {
        match op(self) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_computed() => {
                debug!("summary: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
