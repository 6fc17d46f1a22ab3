//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart;
use crate::adapters::text_report::TextReport;
use crate::domain::backtest::{BacktestConfig, BacktestResult, BacktestSpan, RecordMode, run_backtest};
use crate::domain::baseline::buy_and_hold_plan;
use crate::domain::config_validation::{
    DEFAULT_BUY_THRESHOLD, DEFAULT_INITIAL_CAPITAL, DEFAULT_SELL_THRESHOLD, DEFAULT_SWEEP_WINDOWS,
    DEFAULT_WINDOW, parse_date, validate_backtest_config, validate_data_config,
    validate_strategy_config, validate_sweep_config,
};
use crate::domain::contribution::{Contribution, Interval};
use crate::domain::error::SmacrossError;
use crate::domain::metrics::Metrics;
use crate::domain::series::TimeSeries;
use crate::domain::sma::{distance_against_sma, distance_from_sma, parse_window};
use crate::domain::sweep::{parse_windows, run_sweep};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{Baseline, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "SMA-crossing backtester")]
pub struct Cli {
    /// Log debug output (every transition) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// SMA window, overrides [strategy] window
        #[arg(short, long)]
        window: Option<String>,
        #[arg(long)]
        signal: Option<String>,
        #[arg(long)]
        tradable: Option<String>,
        /// Write the value trajectory as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the value trajectory as SVG
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Print the trade log
        #[arg(long)]
        trades: bool,
    },
    /// Backtest a range of SMA windows and report the best one
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        /// e.g. 50..250:5 or 50,100,200
        #[arg(long)]
        windows: Option<String>,
        #[arg(short, long)]
        jobs: Option<usize>,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Write each point's percentage distance from its SMA
    Distance {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        window: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Backtest {
            config,
            window,
            signal,
            tradable,
            output,
            chart,
            trades,
        } => run_backtest_cmd(&BacktestArgs {
            config,
            window,
            signal,
            tradable,
            output,
            chart,
            trades,
        }),
        Command::Sweep {
            config,
            windows,
            jobs,
            chart,
        } => run_sweep_cmd(&config, windows.as_deref(), jobs, chart.as_deref()),
        Command::Distance {
            config,
            window,
            output,
        } => run_distance_cmd(&config, window.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "smacross=debug" } else { "smacross=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. several runs in one test process) is a no-op.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SmacrossError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    let start_date = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let window = match config.get_string("strategy", "window") {
        Some(w) => parse_window(&w)?,
        None => DEFAULT_WINDOW,
    };

    let record = match config.get_string("backtest", "record") {
        Some(mode) => mode
            .parse::<RecordMode>()
            .map_err(|reason| SmacrossError::ConfigInvalid {
                section: "backtest".into(),
                key: "record".into(),
                reason,
            })?,
        None => RecordMode::default(),
    };

    let amount = config.try_get_double("contribution", "amount", 0.0)?;
    let contribution = if amount > 0.0 {
        let interval = match config.get_string("contribution", "interval") {
            Some(i) => i
                .parse::<Interval>()
                .map_err(|reason| SmacrossError::ConfigInvalid {
                    section: "contribution".into(),
                    key: "interval".into(),
                    reason,
                })?,
            None => Interval::Monthly,
        };
        Some(Contribution { amount, interval })
    } else {
        None
    };

    Ok(BacktestConfig {
        window,
        start_date,
        end_date,
        sell_threshold: config.try_get_double(
            "strategy",
            "sell_threshold",
            DEFAULT_SELL_THRESHOLD,
        )?,
        buy_threshold: config.try_get_double("strategy", "buy_threshold", DEFAULT_BUY_THRESHOLD)?,
        initial_capital: config.try_get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        )?,
        contribution,
        record,
    })
}

/// Signal and tradable file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub signal: String,
    pub tradable: String,
}

impl Sources {
    pub fn is_single(&self) -> bool {
        self.signal == self.tradable
    }
}

/// Resolve data paths: CLI overrides as given, config paths relative to
/// the config file's directory. Tradable defaults to the signal.
pub fn resolve_sources(
    config: &dyn ConfigPort,
    config_dir: Option<&Path>,
    signal_override: Option<&str>,
    tradable_override: Option<&str>,
) -> Result<Sources, SmacrossError> {
    let from_config = |key: &str| {
        config.get_string("data", key).map(|p| match config_dir {
            Some(dir) if Path::new(&p).is_relative() => dir.join(&p).display().to_string(),
            _ => p,
        })
    };

    let signal = signal_override
        .map(str::to_string)
        .or_else(|| from_config("signal"))
        .ok_or_else(|| SmacrossError::ConfigMissing {
            section: "data".into(),
            key: "signal".into(),
        })?;
    let tradable = tradable_override
        .map(str::to_string)
        .or_else(|| from_config("tradable"))
        .unwrap_or_else(|| signal.clone());

    Ok(Sources { signal, tradable })
}

pub fn load_series_pair(
    data: &dyn DataPort,
    sources: &Sources,
) -> Result<(TimeSeries, TimeSeries), SmacrossError> {
    info!(source = %sources.signal, "loading signal series");
    let signal = data.load_series(&sources.signal)?;
    let tradable = if sources.is_single() {
        signal.clone()
    } else {
        info!(source = %sources.tradable, "loading tradable series");
        data.load_series(&sources.tradable)?
    };
    Ok((signal, tradable))
}

/// Buy-and-hold over the span the backtest actually covered, with the
/// same contribution schedule.
pub fn baseline_for(
    signal: &TimeSeries,
    tradable: &TimeSeries,
    config: &BacktestConfig,
) -> Result<Baseline, SmacrossError> {
    let span = BacktestSpan::resolve(signal, tradable, config.start_date, config.end_date)?;
    let (final_value, invested) =
        buy_and_hold_plan(&span.tradable, config.initial_capital, config.contribution)?;
    Ok(Baseline {
        final_value,
        invested,
    })
}

fn config_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_sweep_config(config)?;
    Ok(())
}

pub struct BacktestArgs {
    pub config: PathBuf,
    pub window: Option<String>,
    pub signal: Option<String>,
    pub tradable: Option<String>,
    pub output: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub trades: bool,
}

pub fn run_backtest_cmd(args: &BacktestArgs) -> Result<(), SmacrossError> {
    let adapter = load_config(&args.config)?;
    if args.signal.is_none() {
        validate_data_config(&adapter)?;
    }
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let mut bt_config = build_backtest_config(&adapter)?;
    if let Some(w) = &args.window {
        bt_config.window = parse_window(w)?;
    }
    if (args.output.is_some() || args.chart.is_some()) && bt_config.record == RecordMode::None {
        warn!("record = none, trajectory output will be empty");
    }

    let sources = resolve_sources(
        &adapter,
        config_dir(&args.config),
        args.signal.as_deref(),
        args.tradable.as_deref(),
    )?;
    let data = CsvAdapter::from_config(&adapter);
    let (signal, tradable) = load_series_pair(&data, &sources)?;

    let result = run_backtest(&signal, &tradable, &bt_config)?;
    let baseline = baseline_for(&signal, &tradable, &bt_config)?;
    let metrics = Metrics::compute(&result);

    let report = TextReport::new(args.trades || adapter.get_bool("report", "trades", false));
    report.write_backtest(&mut io::stdout().lock(), &result, &metrics, &baseline)?;

    write_backtest_outputs(&result, &baseline, args.output.as_deref(), args.chart.as_deref())
}

fn write_backtest_outputs(
    result: &BacktestResult,
    baseline: &Baseline,
    output: Option<&Path>,
    chart: Option<&Path>,
) -> Result<(), SmacrossError> {
    if let Some(path) = output {
        csv_adapter::write_trajectory_file(path, &result.trajectory)?;
        info!(path = %path.display(), points = result.trajectory.len(), "trajectory written");
    }
    if let Some(path) = chart {
        fs::write(path, svg_chart::trajectory_chart(&result.trajectory, baseline.final_value))?;
        info!(path = %path.display(), "chart written");
    }
    Ok(())
}

pub fn run_sweep_cmd(
    config_path: &Path,
    windows_override: Option<&str>,
    jobs_override: Option<usize>,
    chart: Option<&Path>,
) -> Result<(), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let mut base = build_backtest_config(&adapter)?;
    // Only final values matter here.
    base.record = RecordMode::None;

    let spec = windows_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("sweep", "windows"))
        .unwrap_or_else(|| DEFAULT_SWEEP_WINDOWS.to_string());
    let windows = parse_windows(&spec)?;
    let jobs = match jobs_override {
        Some(jobs) => jobs,
        None => adapter.try_get_int("sweep", "jobs", 0)?.max(0) as usize,
    };

    let sources = resolve_sources(&adapter, config_dir(config_path), None, None)?;
    let data = CsvAdapter::from_config(&adapter);
    let (signal, tradable) = load_series_pair(&data, &sources)?;

    info!(candidates = windows.len(), jobs, "starting sweep");
    let result = run_sweep(&signal, &tradable, &base, &windows, jobs)?;
    let baseline = baseline_for(&signal, &tradable, &base)?;

    TextReport::default().write_sweep(&mut io::stdout().lock(), &result, &baseline)?;

    if let Some(path) = chart {
        fs::write(path, svg_chart::sweep_chart(&result, baseline.final_value))?;
        info!(path = %path.display(), "chart written");
    }
    Ok(())
}

pub fn run_distance_cmd(
    config_path: &Path,
    window_override: Option<&str>,
    output: Option<&Path>,
) -> Result<(), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let window = match window_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("strategy", "window"))
    {
        Some(w) => parse_window(&w)?,
        None => DEFAULT_WINDOW,
    };

    let sources = resolve_sources(&adapter, config_dir(config_path), None, None)?;
    let data = CsvAdapter::from_config(&adapter);
    let series = data.load_series(&sources.signal)?;
    if window > series.len() {
        return Err(SmacrossError::InsufficientData {
            series: "signal".into(),
            points: series.len(),
            minimum: window,
        });
    }
    let points = match adapter.get_string("distance", "value_column") {
        Some(column) => {
            info!(%column, "measuring column against the signal SMA");
            let measured = data.with_value_column(&column).load_series(&sources.signal)?;
            distance_against_sma(&measured, &series, window)
        }
        None => distance_from_sma(&series, window),
    };

    match output {
        Some(path) => {
            csv_adapter::write_distance_file(path, &points)?;
            info!(path = %path.display(), points = points.len(), "distance written");
        }
        None => csv_adapter::write_distance(io::stdout().lock(), &points).map_err(|e| {
            SmacrossError::Data {
                source_name: "<stdout>".into(),
                reason: e.to_string(),
            }
        })?,
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), SmacrossError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let sources = resolve_sources(&adapter, config_dir(config_path), None, None)?;

    println!("signal:     {}", sources.signal);
    println!("tradable:   {}", sources.tradable);
    println!("period:     {} .. {}", bt_config.start_date, bt_config.end_date);
    println!("window:     {}", bt_config.window);
    println!(
        "thresholds: sell <= {} x SMA, buy > {} x SMA",
        bt_config.sell_threshold, bt_config.buy_threshold
    );
    if let Some(c) = bt_config.contribution {
        println!("contribute: {:.2} {}", c.amount, c.interval);
    }
    println!("Configuration is valid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const CONFIG: &str = r#"
[data]
signal = msci_world.csv
tradable = momentum.csv

[backtest]
start_date = 2015-01-01
end_date = 2024-12-31
initial_capital = 10000
record = every

[strategy]
window = 150
sell_threshold = 0.98

[contribution]
amount = 250
interval = quarterly
"#;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_backtest_config_reads_all_sections() {
        let bt = build_backtest_config(&config(CONFIG)).unwrap();
        assert_eq!(bt.window, 150);
        assert_eq!(bt.start_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(bt.sell_threshold, 0.98);
        assert_eq!(bt.buy_threshold, DEFAULT_BUY_THRESHOLD);
        assert_eq!(bt.record, RecordMode::Every);
        assert_eq!(
            bt.contribution,
            Some(Contribution {
                amount: 250.0,
                interval: Interval::Quarterly
            })
        );
    }

    #[test]
    fn build_backtest_config_defaults() {
        let bt = build_backtest_config(&config(
            "[backtest]\nstart_date = 2020-01-01\nend_date = 2020-12-31\n",
        ))
        .unwrap();
        assert_eq!(bt.window, DEFAULT_WINDOW);
        assert_eq!(bt.initial_capital, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(bt.record, RecordMode::Monthly);
        assert_eq!(bt.contribution, None);
    }

    #[test]
    fn build_backtest_config_missing_date() {
        let err = build_backtest_config(&config("[backtest]\nstart_date = 2020-01-01\n")).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn build_backtest_config_rejects_malformed_numbers() {
        let dates = "[backtest]\nstart_date = 2020-01-01\nend_date = 2020-12-31\n";
        for (extra, bad_key) in [
            ("initial_capital = 10k\n", "initial_capital"),
            ("[strategy]\nsell_threshold = 0,90\n", "sell_threshold"),
            ("[strategy]\nbuy_threshold = abc\n", "buy_threshold"),
            ("[contribution]\namount = 1.000,50\n", "amount"),
        ] {
            let err = build_backtest_config(&config(&format!("{dates}{extra}"))).unwrap_err();
            assert!(
                matches!(&err, SmacrossError::ConfigInvalid { key, .. } if key == bad_key),
                "{extra:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn sources_relative_to_config_dir() {
        let sources =
            resolve_sources(&config(CONFIG), Some(Path::new("/data")), None, None).unwrap();
        assert_eq!(sources.signal, "/data/msci_world.csv");
        assert_eq!(sources.tradable, "/data/momentum.csv");
        assert!(!sources.is_single());
    }

    #[test]
    fn tradable_defaults_to_signal() {
        let sources =
            resolve_sources(&config("[data]\nsignal = /abs/ndx.csv\n"), Some(Path::new("/x")), None, None)
                .unwrap();
        assert_eq!(sources.tradable, "/abs/ndx.csv");
        assert!(sources.is_single());
    }

    #[test]
    fn overrides_win_over_config() {
        let sources = resolve_sources(
            &config(CONFIG),
            None,
            Some("other.csv"),
            Some("etf.csv"),
        )
        .unwrap();
        assert_eq!(sources.signal, "other.csv");
        assert_eq!(sources.tradable, "etf.csv");
    }

    #[test]
    fn missing_signal_source() {
        let err = resolve_sources(&config("[data]\n"), None, None, None).unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigMissing { key, .. } if key == "signal"));
    }

    #[test]
    fn cli_parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "smacross", "-v", "backtest", "-c", "run.ini", "--window", "100", "--trades",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Backtest {
                config,
                window,
                trades,
                ..
            } => {
                assert_eq!(config, PathBuf::from("run.ini"));
                assert_eq!(window.as_deref(), Some("100"));
                assert!(trades);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_sweep_flags() {
        let cli = Cli::try_parse_from([
            "smacross", "sweep", "-c", "run.ini", "--windows", "50..100:10", "-j", "4",
        ])
        .unwrap();
        match cli.command {
            Command::Sweep { windows, jobs, .. } => {
                assert_eq!(windows.as_deref(), Some("50..100:10"));
                assert_eq!(jobs, Some(4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
