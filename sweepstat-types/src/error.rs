use std::path::PathBuf;

use thiserror::Error;

/// Результат операций чтения файла захвата
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Ошибки разбора и чтения файлов захвата.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Путь не указывает на доступный для чтения файл
    #[error("Capture file not found: {0:?}")]
    FileNotFound(PathBuf),

    /// Операция требует прочитанного заголовка
    #[error("Capture source is not initialized: header has not been read")]
    NotInitialized,

    /// Маркер `Frames` не найден в пределах лимита строк, либо не хватает
    /// обязательного поля
    #[error("Header incomplete: {0}")]
    HeaderIncomplete(String),

    /// Поле заголовка присутствует, но не разбирается
    #[error("Invalid header field '{key}': '{value}'")]
    InvalidHeaderField { key: String, value: String },

    /// Строка выборки не является парой `frequency;level`
    #[error("Malformed sample line {line:?}: {reason}")]
    MalformedSampleLine { line: String, reason: String },

    /// Дата/время кадра не соответствуют формату `DD.Mon YY` + `HH:MM:SS.fff`
    #[error("Timestamp parse error for '{raw}': {reason}")]
    TimestampParseError { raw: String, reason: String },

    /// В блоке кадра нет строки `Frame` или `Timestamp`
    #[error("Frame block is missing the '{0}' line")]
    MissingFrameField(&'static str),

    /// Файл закончился посреди кадра
    #[error("Unexpected end of file: expected {expected} lines, read {read}")]
    UnexpectedEof { expected: usize, read: usize },

    /// Запрошен кадр за пределами файла
    #[error("Frame {requested} is out of range: file holds {available} frames")]
    FrameOutOfRange { requested: usize, available: usize },

    /// Ни один кадр ещё не был прочитан
    #[error("No frame has been read yet")]
    NoFrameRead,

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Удобные конструкторы
    pub fn header_incomplete<S: Into<String>>(s: S) -> Self {
        Self::HeaderIncomplete(s.into())
    }

    pub fn invalid_header_field<K: Into<String>, V: Into<String>>(
        key: K,
        value: V,
    ) -> Self {
        Self::InvalidHeaderField {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn malformed_sample<L: Into<String>, R: Into<String>>(
        line: L,
        reason: R,
    ) -> Self {
        Self::MalformedSampleLine {
            line: line.into(),
            reason: reason.into(),
        }
    }
}
