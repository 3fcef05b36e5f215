use serde::Serialize;

/// Матрица переходов между полосами уровня (марковская модель занятости).
///
/// `counts[i][j]` — сколько раз за классифицируемым состоянием `i` следовало
/// классифицируемое состояние `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionMatrix {
    counts: Vec<Vec<u64>>,
}

impl TransitionMatrix {
    /// Пустая матрица `states × states`.
    pub fn new(states: usize) -> Self {
        Self {
            counts: vec![vec![0; states]; states],
        }
    }

    /// Считает переходы по ряду состояний.
    ///
    /// `None` (неклассифицируемый кадр) пропускается: предыдущим состоянием
    /// остаётся последнее классифицированное.
    pub fn from_states(
        states: &[Option<usize>],
        size: usize,
    ) -> Self {
        let mut matrix = Self::new(size);
        let mut previous = None;

        for current in states.iter().flatten().copied() {
            if let Some(prev) = previous {
                matrix.record(prev, current);
            }
            previous = Some(current);
        }

        matrix
    }

    /// Учитывает один переход. Состояния вне матрицы игнорируются.
    pub fn record(
        &mut self,
        from: usize,
        to: usize,
    ) {
        if let Some(cell) = self.counts.get_mut(from).and_then(|row| row.get_mut(to)) {
            *cell += 1;
        }
    }

    /// Размерность (число состояний).
    pub fn size(&self) -> usize {
        self.counts.len()
    }

    pub fn get(
        &self,
        from: usize,
        to: usize,
    ) -> u64 {
        self.counts
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn row_sum(
        &self,
        from: usize,
    ) -> u64 {
        self.counts.get(from).map(|r| r.iter().sum()).unwrap_or(0)
    }

    /// Общее количество переходов.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Вероятности переходов: строки, нормированные на их сумму.
    /// Строка без переходов остаётся нулевой.
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let sum: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if sum == 0 { 0.0 } else { c as f64 / sum as f64 })
                    .collect()
            })
            .collect()
    }
}

impl std::fmt::Display for TransitionMatrix {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "from\\to")?;
        for j in 0..self.size() {
            write!(f, " {j:>8}")?;
        }
        writeln!(f)?;

        for (i, row) in self.counts.iter().enumerate() {
            write!(f, "{i:>7}")?;
            for c in row {
                write!(f, " {c:>8}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
