//! Библиотека формата захвата FSVR
//!
//! Построчный разбор файлов экспорта анализатора спектра R&S FSVR: заголовок
//! до строки `Frames`, затем повторяющиеся блоки кадров фиксированной длины.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use sweepstat_core::CaptureFile;
//!
//! let mut capture = CaptureFile::open("252MKS_001.DAT")?;
//! println!("{} frames", capture.frame_count()?);
//!
//! capture.rewind()?;
//! let frame = capture.read_frame()?;
//! println!("frame #{} at {}", frame.index, frame.timestamp);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod format;
pub mod reader;

pub use format::*;
pub use reader::*;
pub use sweepstat_types::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
