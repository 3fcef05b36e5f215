use std::{io, path::PathBuf};

use clap::Parser;
use log::{error, info};
use sweepstat_analyzer::{
    parse_freq_hz, parse_threshold_list, AnalysisConfig, ClassifyMode, DEFAULT_FRAME_COUNT,
};
use sweepstat_cli::Session;

#[derive(Parser, Debug)]
#[command(
    name = "sweepstat",
    version = env!("CARGO_PKG_VERSION"),
    about = "Channel occupancy analysis of R&S FSVR sweep captures",
    long_about = None,
)]
struct Cli {
    /// Файл захвата (.DAT), открывается до первой команды
    file: Option<PathBuf>,
    /// Число анализируемых кадров
    #[arg(short, long, default_value_t = DEFAULT_FRAME_COUNT)]
    points: usize,
    /// Один порог (он же активный)
    #[arg(short, long, allow_hyphen_values = true, conflicts_with = "thresholds")]
    threshold: Option<f64>,
    /// Набор порогов через запятую: -80,-60,-45
    #[arg(long, allow_hyphen_values = true)]
    thresholds: Option<String>,
    /// Индекс активного порога в --thresholds
    #[arg(long, default_value = "0")]
    active: usize,
    /// Частоты маски фильтра (2433.075MHz, 2433075000); можно повторять
    #[arg(long)]
    filter: Vec<String>,
    /// Уровни не выше нижнего порога: zero, exclude
    #[arg(short, long, default_value = "zero")]
    mode: String,
    /// Каталог для графиков
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Команды через `;` вместо интерактивного режима
    #[arg(short, long)]
    exec: Option<String>,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let thresholds = match (&cli.thresholds, cli.threshold) {
        (Some(list), _) => match parse_threshold_list(list) {
            Ok(v) => v,
            Err(e) => {
                error!("--thresholds: {e}");
                std::process::exit(1);
            }
        },
        (None, Some(t)) => vec![t],
        (None, None) => AnalysisConfig::default().thresholds,
    };

    let mode: ClassifyMode = match cli.mode.parse() {
        Ok(m) => m,
        Err(e) => {
            error!("--mode: {e}");
            std::process::exit(1);
        }
    };

    let filter_mask = match cli
        .filter
        .iter()
        .map(|f| parse_freq_hz(f))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(mask) => mask,
        Err(e) => {
            error!("--filter: {e}");
            std::process::exit(1);
        }
    };

    let config = AnalysisConfig {
        frame_count: cli.points,
        thresholds,
        active_index: cli.active,
        mode,
        filter_mask,
        ..AnalysisConfig::default()
    };

    info!(
        "frames {}, thresholds {:?} (active #{}), mode {}, filter {:?}",
        config.frame_count, config.thresholds, config.active_index, config.mode, config.filter_mask
    );

    let mut session = Session::new(config, io::stdout(), cli.out_dir.clone());

    if let Some(file) = &cli.file {
        if let Err(e) = session.open(file) {
            error!("Failed to open {}: {e}", file.display());
            std::process::exit(1);
        }
    }

    if let Some(script) = &cli.exec {
        session.run_script(script);
    } else if let Err(e) = session.run_interactive(io::stdin().lock()) {
        error!("Session failed: {e}");
        std::process::exit(1);
    }
}
