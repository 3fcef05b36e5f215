use std::{
    fs::File,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};
use sweepstat_analyzer::{
    AnalysisConfig, OccupancyEngine, PlotRenderer, PlotSpec, ResultExporter, ThresholdSet,
};
use sweepstat_core::Frame;

use crate::{CliError, CliResult, Command, HELP};

/// Продолжать ли сессию после команды.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Интерактивная сессия анализа: текущий файл, конфигурация и вывод.
///
/// Конфигурация переживает `open`: новый файл открывается с теми же
/// порогами, режимом и маской.
pub struct Session<W: Write> {
    config: AnalysisConfig,
    engine: Option<OccupancyEngine<File>>,
    out: W,
    output_dir: PathBuf,
    renderer: PlotRenderer,
}

impl<W: Write> Session<W> {
    pub fn new<P: Into<PathBuf>>(
        config: AnalysisConfig,
        out: W,
        output_dir: P,
    ) -> Self {
        Self {
            config,
            engine: None,
            out,
            output_dir: output_dir.into(),
            renderer: PlotRenderer::default(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&OccupancyEngine<File>> {
        self.engine.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Открывает файл захвата, заменяя текущий.
    pub fn open<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> CliResult<()> {
        self.engine = None;

        let engine = OccupancyEngine::open(path.as_ref(), &self.config)?;

        writeln!(
            self.out,
            "{}: {} frames, analysing {}",
            engine.source().source(),
            engine.source().frame_count()?,
            engine.frame_count()
        )?;

        self.engine = Some(engine);

        Ok(())
    }

    /// Выполняет команды, разделённые `;`. Ошибки выводятся, выполнение
    /// продолжается до `exit`.
    pub fn run_script(
        &mut self,
        script: &str,
    ) -> Flow {
        for line in script.split(';').map(str::trim).filter(|l| !l.is_empty()) {
            if self.handle(line) == Flow::Exit {
                return Flow::Exit;
            }
        }

        Flow::Continue
    }

    /// Цикл `> ` до `exit` или конца ввода.
    pub fn run_interactive<I: BufRead>(
        &mut self,
        input: I,
    ) -> CliResult<()> {
        let mut lines = input.lines();

        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            let Some(line) = lines.next().transpose()? else {
                writeln!(self.out)?;
                break;
            };

            if line.trim().is_empty() {
                continue;
            }

            if self.handle(&line) == Flow::Exit {
                break;
            }
        }

        Ok(())
    }

    /// Выполняет одну строку и печатает ошибку, если она есть.
    pub fn handle(
        &mut self,
        line: &str,
    ) -> Flow {
        match self.execute_line(line) {
            Ok(flow) => flow,
            Err(e) => {
                let report = if e.is_warning() {
                    warn!("{e}");
                    writeln!(self.out, "warning: {e}")
                } else {
                    writeln!(self.out, "error: {e}")
                };

                if let Err(io) = report {
                    warn!("failed to write to output: {io}");
                }

                Flow::Continue
            }
        }
    }

    pub fn execute_line(
        &mut self,
        line: &str,
    ) -> CliResult<Flow> {
        let command: Command = line.parse()?;
        self.execute(command)
    }

    pub fn execute(
        &mut self,
        command: Command,
    ) -> CliResult<Flow> {
        match command {
            Command::Open(path) => self.open(path)?,
            Command::Points(n) => {
                self.config.frame_count = n;
                if let Some(engine) = self.engine.as_mut() {
                    let effective = engine.set_frame_count(n)?;
                    writeln!(self.out, "points: {effective}")?;
                }
            }
            Command::Threshold(level) => {
                ThresholdSet::single(level)?;
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_threshold(level)?;
                }
                self.config.thresholds = vec![level];
                self.config.active_index = 0;
            }
            Command::Thresholds { values, active } => {
                ThresholdSet::new(&values, active)?;
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_thresholds(&values, active)?;
                }
                self.config.thresholds = values;
                self.config.active_index = active;
            }
            Command::Mode(mode) => {
                self.config.mode = mode;
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_mode(mode);
                }
            }
            Command::AddFilter(f) => {
                self.config.filter_mask.push(f);
                if let Some(engine) = self.engine.as_mut() {
                    engine.add_filter(f);
                }
            }
            Command::ClearFilter => {
                self.config.filter_mask.clear();
                if let Some(engine) = self.engine.as_mut() {
                    engine.clear_filter();
                }
            }
            Command::Info => self.print_info()?,
            Command::Avg => {
                let values = self.engine_mut()?.average_per_frame()?;
                self.print_series(&values)?;
            }
            Command::FilteredAvg => {
                let values = self.engine_mut()?.filtered_average_per_frame()?;
                self.print_series(&values)?;
            }
            Command::Max => {
                let peaks = self.engine_mut()?.max_per_frame()?;
                self.print_points(&peaks.points())?;
            }
            Command::Over => {
                let peaks = self.engine_mut()?.values_over_threshold()?;
                self.print_points(&peaks.points())?;
            }
            Command::Occupancy => {
                let engine = self.engine_mut()?;
                let share = engine.occupancy()?;
                let active = engine.thresholds().active();
                writeln!(
                    self.out,
                    "occupancy: {:.2}% of frames at or above {active}",
                    share * 100.0
                )?;
            }
            Command::Markov => {
                let matrix = self.engine_mut()?.transition_matrix()?;
                write!(self.out, "{matrix}")?;
            }
            Command::Cdf => {
                let cdf = self.engine_mut()?.inter_arrival_cdf()?;
                self.print_points(&cdf.points())?;
            }
            Command::TimeDeltaPlot => self.plot_time_deltas()?,
            Command::FilterStatPlot => self.plot_filtered()?,
            Command::AvgPlot => self.plot_averages()?,
            Command::LastFramePlot => {
                let frame = self.engine_mut()?.source().last_frame()?.clone();
                self.plot_frame(&frame)?;
            }
            Command::FramePlot(n) => {
                let frame = self.engine_mut()?.source_mut().seek_frame(n)?.clone();
                self.plot_frame(&frame)?;
            }
            Command::Export(path) => {
                let engine = self.engine_mut()?;
                let info = engine.compute_info()?.clone();
                let matrix = engine.transition_matrix()?;
                ResultExporter::export_results(engine.thresholds(), &info, &matrix, &path)?;
                writeln!(self.out, "results written to {}", path.display())?;
            }
            Command::Report(path) => {
                let summary = self.engine_mut()?.summary()?;
                ResultExporter::export_session_report(&summary, &path)?;
                writeln!(self.out, "report written to {}", path.display())?;
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Exit => {
                writeln!(self.out, "Bye!")?;
                return Ok(Flow::Exit);
            }
        }

        Ok(Flow::Continue)
    }

    fn engine_mut(&mut self) -> CliResult<&mut OccupancyEngine<File>> {
        self.engine.as_mut().ok_or(CliError::NoCapture)
    }

    fn print_info(&mut self) -> CliResult<()> {
        let engine = self.engine.as_mut().ok_or(CliError::NoCapture)?;
        let info = engine.compute_info()?.clone();
        let (x_unit, y_unit) = engine.source().axis_units()?;
        let sweep_time = engine.source().sweep_time()?;

        writeln!(self.out, "source      : {}", engine.source().source())?;
        writeln!(self.out, "frames      : {}", info.frame_count)?;
        writeln!(self.out, "carrier     : {} {x_unit}", info.carrier_frequency)?;
        writeln!(self.out, "span        : {} {x_unit}", info.span)?;
        writeln!(self.out, "resolution  : {} {x_unit}", info.resolution)?;
        writeln!(self.out, "duration    : {} s", info.duration)?;
        writeln!(self.out, "sweep time  : {sweep_time} s")?;
        writeln!(self.out, "level unit  : {y_unit}")?;
        writeln!(
            self.out,
            "thresholds  : {:?} (active {}, mode {})",
            engine.thresholds().levels(),
            engine.thresholds().active(),
            engine.mode()
        )?;

        Ok(())
    }

    fn print_series(
        &mut self,
        values: &[f64],
    ) -> CliResult<()> {
        for (i, v) in values.iter().enumerate() {
            writeln!(self.out, "{i};{v}")?;
        }
        Ok(())
    }

    fn print_points(
        &mut self,
        points: &[(f64, f64)],
    ) -> CliResult<()> {
        for (x, y) in points {
            writeln!(self.out, "{x};{y}")?;
        }
        Ok(())
    }

    fn plot_time_deltas(&mut self) -> CliResult<()> {
        let engine = self.engine_mut()?;
        let deltas = engine.time_deltas()?;
        let n = engine.frame_count();
        let points = indexed(&deltas);

        self.save_plot(&points, PlotSpec::new(format!("time delta eval {n}"), "Frame", "s"))
    }

    fn plot_filtered(&mut self) -> CliResult<()> {
        let engine = self.engine_mut()?;
        let values = engine.filtered_average_per_frame()?;
        let n = engine.frame_count();
        let active = engine.thresholds().active();
        let points = indexed(&values);
        let spec = PlotSpec::new(format!("threshold statistic {n}"), "Frame", "Level")
            .with_threshold(active);

        self.save_plot(&points, spec)
    }

    fn plot_averages(&mut self) -> CliResult<()> {
        let engine = self.engine_mut()?;
        let values = engine.average_per_frame()?;
        let n = engine.frame_count();
        let active = engine.thresholds().active();
        let (_, y_unit) = engine.source().axis_units()?;
        let spec = PlotSpec::new(format!("avg {n}"), "Frame", y_unit).with_threshold(active);
        let points = indexed(&values);

        self.save_plot(&points, spec)
    }

    fn plot_frame(
        &mut self,
        frame: &Frame,
    ) -> CliResult<()> {
        let engine = self.engine.as_ref().ok_or(CliError::NoCapture)?;
        let (x_unit, y_unit) = engine.source().axis_units()?;
        let points: Vec<(f64, f64)> = frame
            .samples
            .iter()
            .map(|s| (s.frequency, s.level))
            .collect();
        let spec = PlotSpec::new(format!("figure {}", frame.index), x_unit, y_unit);

        info!(
            "frame #{} at {} {} ({:.3})",
            frame.index,
            frame.date,
            frame.time,
            frame.timestamp_secs()
        );

        self.save_plot(&points, spec)
    }

    fn save_plot(
        &mut self,
        points: &[(f64, f64)],
        spec: PlotSpec,
    ) -> CliResult<()> {
        let path = self.output_dir.join(spec.default_file_name());
        let written = self.renderer.render(points, &spec, Some(&path))?;

        writeln!(self.out, "plot saved to {}", written.display())?;

        Ok(())
    }
}

fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect()
}
