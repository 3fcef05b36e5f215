use log::warn;
use serde::Serialize;

use crate::{AnalysisError, AnalysisResult};

/// Как трактовать уровни не выше нижнего порога.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassifyMode {
    /// Уровни `<= t0` попадают в отдельное состояние 0.
    ZeroState,
    /// Уровни `<= t0` не классифицируются и исключаются из модели.
    ExcludeBelow,
}

/// Упорядоченный набор порогов, делящий ось уровней на `len + 1` полос.
///
/// Полоса `b` — полуинтервал `(t[b-1], t[b]]`: значение, равное порогу,
/// относится к полосе ниже него.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdSet {
    levels: Vec<f64>,
    active: f64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ThresholdSet {
    /// Строит набор из неотсортированных значений.
    ///
    /// Активный порог выбирается по индексу во входном (неотсортированном)
    /// списке; индекс за пределами списка прижимается к последнему элементу.
    pub fn new(
        values: &[f64],
        active_index: usize,
    ) -> AnalysisResult<Self> {
        if values.is_empty() {
            return Err(AnalysisError::invalid_thresholds("at least one threshold is required"));
        }

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(AnalysisError::invalid_thresholds(format!(
                "threshold {bad} is not finite"
            )));
        }

        let active = values[active_index.min(values.len() - 1)];
        let mut levels = values.to_vec();

        levels.sort_by(f64::total_cmp);
        levels.dedup();

        if levels.len() < values.len() {
            warn!(
                "duplicate thresholds collapsed: {} values give {} bands",
                values.len(),
                levels.len() + 1
            );
        }

        Ok(Self { levels, active })
    }

    /// Один порог, он же активный.
    pub fn single(level: f64) -> AnalysisResult<Self> {
        Self::new(&[level], 0)
    }

    /// Пороги по возрастанию.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Активный порог для бинарной занятости.
    pub fn active(&self) -> f64 {
        self.active
    }

    /// Количество полос (состояний): `len + 1`.
    pub fn band_count(&self) -> usize {
        self.levels.len() + 1
    }

    /// Номер полосы: количество порогов строго ниже `level`.
    pub fn band_of(
        &self,
        level: f64,
    ) -> usize {
        self.levels.partition_point(|&t| t < level)
    }

    /// Классифицирует уровень.
    ///
    /// `None` — значение не классифицируется: NaN, либо значение не выше
    /// нижнего порога в режиме [`ClassifyMode::ExcludeBelow`].
    pub fn classify(
        &self,
        level: f64,
        mode: ClassifyMode,
    ) -> Option<usize> {
        if level.is_nan() {
            return None;
        }

        match self.band_of(level) {
            0 if mode == ClassifyMode::ExcludeBelow => None,
            band => Some(band),
        }
    }

    /// `true`, если уровень не ниже активного порога.
    pub fn is_active(
        &self,
        level: f64,
    ) -> bool {
        level >= self.active
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            levels: vec![0.0],
            active: 0.0,
        }
    }
}

impl std::fmt::Display for ClassifyMode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ClassifyMode::ZeroState => write!(f, "zero"),
            ClassifyMode::ExcludeBelow => write!(f, "exclude"),
        }
    }
}

impl std::str::FromStr for ClassifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" | "zero-state" | "zerostate" => Ok(ClassifyMode::ZeroState),
            "exclude" | "exclude-below" | "skip" => Ok(ClassifyMode::ExcludeBelow),
            _ => Err(format!(
                "Unknown classification mode: '{s}'. Use: zero, exclude"
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
