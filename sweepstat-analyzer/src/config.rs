use sweepstat_core::DEFAULT_HEADER_LINE_LIMIT;

use crate::ClassifyMode;

/// Количество анализируемых кадров по умолчанию.
pub const DEFAULT_FRAME_COUNT: usize = 10;

/// Полная конфигурация анализа.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Сколько кадров анализировать (прижимается к доступному числу)
    pub frame_count: usize,
    /// Пороги в порядке ввода
    pub thresholds: Vec<f64>,
    /// Индекс активного порога во входном списке
    pub active_index: usize,
    /// Трактовка уровней ниже нижнего порога
    pub mode: ClassifyMode,
    /// Частоты для усреднения с фильтром
    pub filter_mask: Vec<f64>,
    /// Лимит строк заголовка при открытии
    pub header_line_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            thresholds: vec![0.0],
            active_index: 0,
            mode: ClassifyMode::ZeroState,
            filter_mask: Vec::new(),
            header_line_limit: DEFAULT_HEADER_LINE_LIMIT,
        }
    }
}

/// Парсит строку частоты в герцы.
///
/// Поддерживает суффиксы: `GHz`, `MHz`, `kHz`, `Hz` (регистронезависимо).
///
/// # Примеры
/// ```
/// use sweepstat_analyzer::config::parse_freq_hz;
/// assert_eq!(parse_freq_hz("2433.075MHz").unwrap(), 2_433_075_000.0);
/// assert_eq!(parse_freq_hz("2433075000").unwrap(), 2_433_075_000.0);
/// ```
pub fn parse_freq_hz(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("ghz") {
        (v.trim(), 1_000_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("mhz") {
        (v.trim(), 1_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("khz") {
        (v.trim(), 1_000_f64)
    } else if let Some(v) = lower.strip_suffix("hz") {
        (v.trim(), 1_f64)
    } else {
        (lower.as_str(), 1_f64)
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid frequency '{s}': {e}"))?;

    // Множитель оставляет хвост вида 2433075000.0000005, округляем до герца
    if mult > 1.0 {
        Ok((n * mult).round())
    } else {
        Ok(n)
    }
}

/// Парсит список порогов через запятую: `-80,-60,-45`.
pub fn parse_threshold_list(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<f64>()
                .map_err(|e| format!("Invalid threshold '{v}': {e}"))
        })
        .collect()
}
