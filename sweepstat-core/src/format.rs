//! Текстовый формат экспорта R&S FSVR (`.DAT`)
//!
//! Файл построчный, поля разделены `;`:
//!
//! ```text
//! Type;FSVR-7;
//! SWT;0.005;s
//! x-Unit;Hz;
//! y-Unit;dBm;
//! Values;501;
//! Frames;50;              <- конец заголовка
//! Frame;1;                <- блок кадра: Values + 2 строки
//! Timestamp;12.Apr 17;17:55:58.470;
//! 2432000000;-82.31;
//! ...
//! ```

use chrono::NaiveDateTime;
use sweepstat_types::{CaptureError, CaptureResult, Frame, Header, Sample};

/// Разделитель полей
pub const FIELD_SEPARATOR: char = ';';

/// Ключ строки идентификатора кадра
pub const KEY_FRAME: &str = "Frame";

/// Ключ строки метки времени кадра
pub const KEY_TIMESTAMP: &str = "Timestamp";

/// Лимит строк заголовка по умолчанию. Заголовок FSVR занимает ~20 строк.
pub const DEFAULT_HEADER_LINE_LIMIT: usize = 30;

/// Формат склеенной даты и времени: `12.Apr 17T17:55:58.470`
pub const TIMESTAMP_FORMAT: &str = "%d.%b %yT%H:%M:%S%.f";

/// Разбивает строку на ключ и значения, отбрасывая перевод строки.
pub fn split_line(line: &str) -> (&str, Vec<&str>) {
    let mut parts = line.trim_end_matches(['\r', '\n']).split(FIELD_SEPARATOR);
    let key = parts.next().unwrap_or_default();

    (key, parts.collect())
}

/// Разбирает дату `DD.Mon YY` и время `HH:MM:SS.fff` в метку времени.
pub fn parse_timestamp(
    date: &str,
    time: &str,
) -> CaptureResult<NaiveDateTime> {
    let raw = format!("{}T{}", date.trim(), time.trim());

    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| {
        CaptureError::TimestampParseError {
            raw,
            reason: e.to_string(),
        }
    })
}

/// Декодер блока кадра. Не хранит состояния между кадрами.
pub struct FrameDecoder;

impl FrameDecoder {
    /// Декодирует ровно `header.lines_per_frame()` строк в [`Frame`].
    pub fn decode<S: AsRef<str>>(
        header: &Header,
        lines: &[S],
    ) -> CaptureResult<Frame> {
        let expected = header.lines_per_frame();

        if lines.len() != expected {
            return Err(CaptureError::UnexpectedEof {
                expected,
                read: lines.len(),
            });
        }

        let mut index = None;
        let mut stamp = None;
        let mut samples = Vec::with_capacity(lines.len() - 2);

        for line in lines {
            let line = line.as_ref();
            let (key, values) = split_line(line);

            match key {
                KEY_FRAME => {
                    index = Some(values.first().copied().unwrap_or_default().to_string());
                }
                KEY_TIMESTAMP => {
                    let date = values.first().copied().unwrap_or_default();
                    let time = values.get(1).copied().unwrap_or_default();
                    let timestamp = parse_timestamp(date, time)?;
                    stamp = Some((date.to_string(), time.to_string(), timestamp));
                }
                _ => samples.push(parse_sample(line, key, &values)?),
            }
        }

        let index = index.ok_or(CaptureError::MissingFrameField(KEY_FRAME))?;
        let (date, time, timestamp) = stamp.ok_or(CaptureError::MissingFrameField(KEY_TIMESTAMP))?;

        Ok(Frame {
            index,
            date,
            time,
            timestamp,
            samples,
        })
    }
}

fn parse_sample(
    line: &str,
    frequency: &str,
    values: &[&str],
) -> CaptureResult<Sample> {
    let frequency = frequency
        .trim()
        .parse::<f64>()
        .map_err(|e| CaptureError::malformed_sample(line, format!("frequency: {e}")))?;

    let level = values
        .first()
        .ok_or_else(|| CaptureError::malformed_sample(line, "missing level field"))?
        .trim()
        .parse::<f64>()
        .map_err(|e| CaptureError::malformed_sample(line, format!("level: {e}")))?;

    Ok(Sample { frequency, level })
}
