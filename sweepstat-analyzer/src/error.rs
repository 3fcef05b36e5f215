use sweepstat_types::CaptureError;
use thiserror::Error;

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Ошибка чтения файла захвата
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Для расчёта нужно больше кадров
    #[error("Insufficient frames: need at least {required}, have {available}")]
    InsufficientFrames { required: usize, available: usize },

    /// Маска фильтра пуста или не выбирает ни одной выборки кадра
    #[error("Filter mask selects no samples{}", .0.as_deref().map(|f| format!(" in frame {f}")).unwrap_or_default())]
    EmptyFilterMask(Option<String>),

    /// Ряд вырожден (нет интервалов, нулевая сумма, пустые данные)
    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    /// Кадр без выборок (`Values;0`)
    #[error("Frame {0} holds no samples")]
    EmptyFrame(String),

    /// Недопустимый набор порогов
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),

    /// Ошибка записи результатов
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка кодирования изображения
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Ошибка сериализации отчёта
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn degenerate<S: Into<String>>(s: S) -> Self {
        Self::DegenerateSeries(s.into())
    }

    pub fn invalid_thresholds<S: Into<String>>(s: S) -> Self {
        Self::InvalidThresholds(s.into())
    }

    /// `true` для исходов «не посчитано из-за нехватки данных».
    ///
    /// Такие исходы не должны завершать интерактивную сессию.
    pub fn is_not_computed(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFrames { .. }
                | Self::EmptyFilterMask(_)
                | Self::DegenerateSeries(_)
                | Self::EmptyFrame(_)
        )
    }
}
