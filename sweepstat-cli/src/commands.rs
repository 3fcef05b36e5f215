use std::{path::PathBuf, str::FromStr};

use sweepstat_analyzer::{parse_freq_hz, parse_threshold_list, ClassifyMode};

use crate::CliError;

/// Одна команда интерактивной сессии.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `open <path>`
    Open(PathBuf),
    /// `points <n>`: число анализируемых кадров
    Points(usize),
    /// `threshold <v>`: один порог, он же активный
    Threshold(f64),
    /// `thresholds <v,...> [active]`
    Thresholds { values: Vec<f64>, active: usize },
    /// `mode <zero|exclude>`
    Mode(ClassifyMode),
    /// `add_filter <f>`
    AddFilter(f64),
    /// `clr_filter`
    ClearFilter,
    Info,
    Avg,
    FilteredAvg,
    Max,
    Over,
    Occupancy,
    Markov,
    Cdf,
    /// `tdp`: график интервалов между кадрами
    TimeDeltaPlot,
    /// `fsp`: график средних по фильтру с линией порога
    FilterStatPlot,
    /// `avgp`: график средних уровней
    AvgPlot,
    /// `lfp`: последний прочитанный кадр
    LastFramePlot,
    /// `fp <n>`: кадр с номером `n` (от 0)
    FramePlot(usize),
    /// `export <path>`
    Export(PathBuf),
    /// `report <path>`
    Report(PathBuf),
    Help,
    Exit,
}

/// Подсказка по командам.
pub const HELP: &str = "\
open <path>              open a capture file
points <n>               number of frames to analyse
threshold <v>            single threshold (also the active one)
thresholds <v,...> [i]   threshold set, i-th value is active
mode <zero|exclude>      treatment of levels at or below the lowest threshold
add_filter <f>           add a frequency to the filter mask (Hz, kHz, MHz, GHz)
clr_filter               clear the filter mask
info                     carrier, span, resolution, duration
avg | favg               per-frame average, unfiltered or over the filter mask
max | over               per-frame peaks, all or at/above the active threshold
occupancy                share of frames at/above the active threshold
markov                   transition matrix between threshold bands
cdf                      inter-arrival CDF of active frames
tdp | fsp | avgp         plots: time deltas, filtered averages, averages
lfp | fp <n>             plots: last read frame, frame n
export <path>            thresholds, axis and matrix as ';' rows
report <path>            JSON session report
help | exit";

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((line, ""));
        let mut args = rest.split_whitespace();

        let command = match name.to_lowercase().as_str() {
            "open" => Command::Open(path_arg("open", rest)?),
            "points" => Command::Points(parse_arg("points", "n", args.next())?),
            "threshold" => Command::Threshold(parse_arg("threshold", "v", args.next())?),
            "thresholds" => {
                let list = args.next().ok_or(CliError::MissingArgument {
                    command: "thresholds",
                    argument: "v,...",
                })?;
                let values =
                    parse_threshold_list(list).map_err(|e| CliError::invalid("thresholds", e))?;
                let active = match args.next() {
                    Some(raw) => parse_arg("thresholds", "active", Some(raw))?,
                    None => 0,
                };

                Command::Thresholds { values, active }
            }
            "mode" => {
                let raw = args.next().ok_or(CliError::MissingArgument {
                    command: "mode",
                    argument: "zero|exclude",
                })?;

                Command::Mode(
                    raw.parse::<ClassifyMode>()
                        .map_err(|e| CliError::invalid("mode", e))?,
                )
            }
            "add_filter" => {
                let raw = args.next().ok_or(CliError::MissingArgument {
                    command: "add_filter",
                    argument: "f",
                })?;

                Command::AddFilter(
                    parse_freq_hz(raw).map_err(|e| CliError::invalid("add_filter", e))?,
                )
            }
            "clr_filter" => Command::ClearFilter,
            "info" => Command::Info,
            "avg" => Command::Avg,
            "favg" => Command::FilteredAvg,
            "max" => Command::Max,
            "over" => Command::Over,
            "occupancy" => Command::Occupancy,
            "markov" => Command::Markov,
            "cdf" => Command::Cdf,
            "tdp" => Command::TimeDeltaPlot,
            "fsp" => Command::FilterStatPlot,
            "avgp" => Command::AvgPlot,
            "lfp" => Command::LastFramePlot,
            "fp" => Command::FramePlot(parse_arg("fp", "n", args.next())?),
            "export" => Command::Export(path_arg("export", rest)?),
            "report" => Command::Report(path_arg("report", rest)?),
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Exit,
            _ => return Err(CliError::UnknownCommand(name.to_string())),
        };

        Ok(command)
    }
}

fn parse_arg<T: FromStr>(
    command: &'static str,
    argument: &'static str,
    raw: Option<&str>,
) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    let raw = raw.ok_or(CliError::MissingArgument { command, argument })?;

    raw.parse()
        .map_err(|e| CliError::invalid(command, format!("'{raw}': {e}")))
}

fn path_arg(
    command: &'static str,
    rest: &str,
) -> Result<PathBuf, CliError> {
    if rest.is_empty() {
        return Err(CliError::MissingArgument {
            command,
            argument: "path",
        });
    }

    Ok(PathBuf::from(rest))
}
