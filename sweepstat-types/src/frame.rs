use chrono::NaiveDateTime;

/// Одна точка развёртки: частота и уровень на ней.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Частота (в единицах `x-Unit`)
    pub frequency: f64,
    /// Уровень (в единицах `y-Unit`)
    pub level: f64,
}

/// Один кадр развёртки (sweep).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Идентификатор кадра, присвоенный прибором (как в файле)
    pub index: String,
    /// Дата из строки `Timestamp` (например `12.Apr 17`)
    pub date: String,
    /// Время из строки `Timestamp` (например `17:55:58.470`)
    pub time: String,
    /// Восстановленная метка времени
    pub timestamp: NaiveDateTime,
    /// Выборки в порядке следования в файле
    pub samples: Vec<Sample>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.frequency)
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.level)
    }

    /// Уровень на точно заданной частоте.
    pub fn level_at(
        &self,
        frequency: f64,
    ) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.frequency == frequency)
            .map(|s| s.level)
    }

    /// Среднее арифметическое всех уровней кадра (`None` для пустого кадра).
    pub fn mean_level(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }

        Some(self.levels().sum::<f64>() / self.samples.len() as f64)
    }

    /// Выборка с максимальным уровнем. При равенстве побеждает первая.
    pub fn peak(&self) -> Option<Sample> {
        let mut iter = self.samples.iter().copied();
        let first = iter.next()?;

        Some(iter.fold(first, |best, s| if s.level > best.level { s } else { best }))
    }

    /// Метка времени в секундах от эпохи (время файла трактуется как UTC).
    pub fn timestamp_secs(&self) -> f64 {
        let utc = self.timestamp.and_utc();

        utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9
    }

    /// Знаковая разница `self - earlier` в секундах.
    pub fn seconds_since(
        &self,
        earlier: &Frame,
    ) -> f64 {
        seconds_between(earlier.timestamp, self.timestamp)
    }
}

/// Знаковая разница `later - earlier` в секундах с микросекундной точностью.
pub fn seconds_between(
    earlier: NaiveDateTime,
    later: NaiveDateTime,
) -> f64 {
    let delta = later - earlier;

    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn frame(
        secs: u32,
        millis: u32,
        levels: &[f64],
    ) -> Frame {
        let timestamp = NaiveDate::from_ymd_opt(2017, 4, 12)
            .unwrap()
            .and_hms_milli_opt(17, 55, secs, millis)
            .unwrap();

        Frame {
            index: "1".to_string(),
            date: "12.Apr 17".to_string(),
            time: format!("17:55:{secs:02}.{millis:03}"),
            timestamp,
            samples: levels
                .iter()
                .enumerate()
                .map(|(i, &level)| Sample {
                    frequency: 100.0 * (i + 1) as f64,
                    level,
                })
                .collect(),
        }
    }

    #[test]
    fn test_mean_and_peak() {
        let f = frame(0, 0, &[-80.0, -60.0, -70.0]);

        assert_eq!(f.mean_level(), Some(-70.0));
        assert_eq!(
            f.peak(),
            Some(Sample {
                frequency: 200.0,
                level: -60.0
            })
        );
        assert_eq!(f.level_at(300.0), Some(-70.0));
        assert_eq!(f.level_at(250.0), None);
    }

    #[test]
    fn test_peak_tie_prefers_first() {
        let f = frame(0, 0, &[-50.0, -90.0, -50.0]);

        assert_eq!(f.peak().unwrap().frequency, 100.0);
    }

    #[test]
    fn test_empty_frame() {
        let f = frame(0, 0, &[]);

        assert!(f.is_empty());
        assert_eq!(f.mean_level(), None);
        assert_eq!(f.peak(), None);
    }

    #[test]
    fn test_seconds_since() {
        let a = frame(58, 470, &[0.0]);
        let b = frame(59, 720, &[0.0]);

        assert!((b.seconds_since(&a) - 1.25).abs() < 1e-9);
        assert!((a.seconds_since(&b) + 1.25).abs() < 1e-9);
        assert!((b.timestamp_secs() - a.timestamp_secs() - 1.25).abs() < 1e-6);
    }
}
