use serde::Serialize;

use crate::{AnalysisError, AnalysisResult};

/// Эмпирическая функция распределения интервалов между «включениями».
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterArrivalCdf {
    /// Интервалы в секундах по возрастанию
    pub gaps: Vec<f64>,
    /// Накопленная доля суммарной длительности, последний элемент = 1.0
    pub cdf: Vec<f64>,
}

impl InterArrivalCdf {
    /// Строит CDF по интервалам: сортировка, нормировка на сумму, накопление.
    pub fn from_gaps(mut gaps: Vec<f64>) -> AnalysisResult<Self> {
        if gaps.is_empty() {
            return Err(AnalysisError::degenerate(
                "fewer than two frames reach the active threshold",
            ));
        }

        gaps.sort_by(f64::total_cmp);

        let total: f64 = gaps.iter().sum();

        if total <= 0.0 || !total.is_finite() {
            return Err(AnalysisError::degenerate(format!(
                "inter-arrival gaps sum to {total}"
            )));
        }

        let cdf = gaps
            .iter()
            .scan(0.0, |acc, g| {
                *acc += g / total;
                Some(*acc)
            })
            .collect();

        Ok(Self { gaps, cdf })
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Пары `(интервал, доля)` для построения графика.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.gaps.iter().copied().zip(self.cdf.iter().copied()).collect()
    }
}

/// `n` равноотстоящих точек от `start` до `end` включительно.
pub fn linspace(
    start: f64,
    end: f64,
    n: usize,
) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Округление секунд до миллисекунд.
pub fn round_to_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Интервалы между соседними моментами.
pub fn gaps(times: &[f64]) -> Vec<f64> {
    times.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Среднее арифметическое; `None` для пустого ряда.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.0, 2.5, 1), vec![0.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());

        let t = linspace(0.0, 12.345, 7);
        assert_eq!(t.len(), 7);
        assert_eq!(*t.last().unwrap(), 12.345);
    }

    #[test]
    fn test_round_to_millis() {
        assert_eq!(round_to_millis(1.23456), 1.235);
        assert_eq!(round_to_millis(0.0004), 0.0);
    }

    #[test]
    fn test_cdf_ends_at_one() {
        let cdf = InterArrivalCdf::from_gaps(vec![3.0, 1.0, 2.0, 2.0]).unwrap();

        assert_eq!(cdf.gaps, vec![1.0, 2.0, 2.0, 3.0]);
        assert!(cdf.cdf.windows(2).all(|w| w[1] >= w[0]));
        assert_relative_eq!(cdf.cdf[0], 0.125);
        assert_relative_eq!(*cdf.cdf.last().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(cdf.points().len(), 4);
    }

    #[test]
    fn test_cdf_degenerate() {
        assert!(matches!(
            InterArrivalCdf::from_gaps(vec![]),
            Err(AnalysisError::DegenerateSeries(_))
        ));
        assert!(matches!(
            InterArrivalCdf::from_gaps(vec![0.0, 0.0]),
            Err(AnalysisError::DegenerateSeries(_))
        ));
    }

    #[test]
    fn test_gaps_and_mean() {
        assert_eq!(gaps(&[0.0, 0.5, 2.0]), vec![0.5, 1.5]);
        assert!(gaps(&[1.0]).is_empty());
        assert_eq!(mean(&[-80.0, -60.0]), Some(-70.0));
        assert_eq!(mean(&[]), None);
    }
}
