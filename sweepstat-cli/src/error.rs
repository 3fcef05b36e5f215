use sweepstat_analyzer::AnalysisError;
use thiserror::Error;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Неизвестная команда
    #[error("Command '{0}' is not found, type 'help' for the list")]
    UnknownCommand(String),

    /// Команде не хватает аргумента
    #[error("{command}: missing argument <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    /// Аргумент не разобран
    #[error("{command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    /// Команда требует открытого файла
    #[error("No capture file is open, use: open <path>")]
    NoCapture,

    /// Ошибка анализа
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// Ошибка вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn invalid<S: Into<String>>(
        command: &'static str,
        reason: S,
    ) -> Self {
        Self::InvalidArgument {
            command,
            reason: reason.into(),
        }
    }

    /// Исход «не посчитано», который сессия показывает как предупреждение.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Analysis(e) if e.is_not_computed())
    }
}

impl From<sweepstat_core::CaptureError> for CliError {
    fn from(e: sweepstat_core::CaptureError) -> Self {
        Self::Analysis(e.into())
    }
}
