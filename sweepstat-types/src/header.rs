use std::collections::BTreeMap;

use crate::{CaptureError, CaptureResult};

/// Ключ, завершающий заголовок: после строки `Frames;<n>` начинаются кадры
pub const KEY_FRAMES: &str = "Frames";
/// Количество выборок в одном кадре
pub const KEY_VALUES: &str = "Values";
/// Время развёртки (секунды)
pub const KEY_SWEEP_TIME: &str = "SWT";
/// Единица оси частот
pub const KEY_X_UNIT: &str = "x-Unit";
/// Единица оси уровней
pub const KEY_Y_UNIT: &str = "y-Unit";
/// Максимальное допустимое значение `Values` (выборок в кадре)
pub const MAX_VALUES_PER_FRAME: usize = 1_000_000;

/// Сырые поля заголовка: ключ → значения в порядке следования в строке.
pub type HeaderFields = BTreeMap<String, Vec<String>>;

/// Проверенный заголовок файла захвата.
///
/// Строится из сырых полей один раз; обязательные ключи разобраны в типы,
/// остальные доступны через [`Header::field`].
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Общее количество кадров в файле
    pub frames: usize,
    /// Количество выборок `frequency;level` в кадре
    pub values: usize,
    /// Время развёртки в секундах
    pub sweep_time: f64,
    /// Единица оси X (обычно `Hz`)
    pub x_unit: String,
    /// Единица оси Y (обычно `dBm`)
    pub y_unit: String,
    fields: HeaderFields,
}

impl Header {
    /// Валидирует сырые поля и строит заголовок.
    pub fn from_fields(fields: HeaderFields) -> CaptureResult<Self> {
        let frames = parse_field::<usize>(&fields, KEY_FRAMES)?;
        let values = parse_field::<usize>(&fields, KEY_VALUES)?;
        if values > MAX_VALUES_PER_FRAME {
            return Err(CaptureError::invalid_header_field(
                KEY_VALUES,
                values.to_string(),
            ));
        }
        let sweep_time = parse_field::<f64>(&fields, KEY_SWEEP_TIME)?;
        let x_unit = first_value(&fields, KEY_X_UNIT)?.to_string();
        let y_unit = first_value(&fields, KEY_Y_UNIT)?.to_string();

        Ok(Self {
            frames,
            values,
            sweep_time,
            x_unit,
            y_unit,
            fields,
        })
    }

    /// Все значения произвольного ключа заголовка.
    pub fn field(
        &self,
        key: &str,
    ) -> Option<&[String]> {
        self.fields.get(key).map(Vec::as_slice)
    }

    /// Количество строк в одном блоке кадра: `Frame`, `Timestamp` и выборки.
    pub fn lines_per_frame(&self) -> usize {
        self.values + 2
    }

    pub fn fields(&self) -> &HeaderFields {
        &self.fields
    }
}

fn first_value<'a>(
    fields: &'a HeaderFields,
    key: &str,
) -> CaptureResult<&'a str> {
    fields
        .get(key)
        .and_then(|v| v.first())
        .map(|s| s.trim())
        .ok_or_else(|| CaptureError::header_incomplete(format!("missing required key '{key}'")))
}

fn parse_field<T: std::str::FromStr>(
    fields: &HeaderFields,
    key: &str,
) -> CaptureResult<T> {
    let raw = first_value(fields, key)?;

    raw.parse::<T>()
        .map_err(|_| CaptureError::invalid_header_field(key, raw))
}
