/// hazmon daemon
///
/// Drives the monitor from the sensor simulator on a fixed poll interval,
/// refreshing weather from Open-Meteo every few ticks.
///
/// Environment (loaded from .env when present):
/// - `HAZMON_CONFIG`   - path to the TOML config (default ./hazards.toml)
/// - `HAZMON_LOG_FILE` - overrides `[logging] file`
/// - `DATABASE_URL`    - PostgreSQL alert store; in-memory store when unset
///
/// Usage: hazmon [--ticks N] [--seed N] [--offline]

use chrono::Utc;
use std::env;
use std::process;
use std::thread;
use std::time::Duration;

use hazmon_service::analysis::heat::{predict_heat_wave, HeatWaveOutlook};
use hazmon_service::analysis::risk::RandomJitter;
use hazmon_service::config::{self, ServiceConfig};
use hazmon_service::hazards::GaugeBand;
use hazmon_service::ingest::open_meteo::{OpenMeteoClient, WeatherSource};
use hazmon_service::logging::{self, Component};
use hazmon_service::model::WeatherSnapshot;
use hazmon_service::monitor::Monitor;
use hazmon_service::simulate::SensorSimulator;
use hazmon_service::store::{AlertStore, MemoryAlertStore, PgAlertStore};

struct RunOptions {
    ticks: Option<usize>,
    seed: u64,
    offline: bool,
}

fn parse_args(args: &[String]) -> Result<RunOptions, String> {
    let mut options = RunOptions {
        ticks: None,
        seed: 42,
        offline: false,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ticks" => {
                let value = iter.next().ok_or("--ticks needs a value")?;
                let ticks = value
                    .parse()
                    .map_err(|_| format!("invalid tick count '{}'", value))?;
                options.ticks = Some(ticks);
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                options.seed = value.parse().map_err(|_| format!("invalid seed '{}'", value))?;
            }
            "--offline" => options.offline = true,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(options)
}

fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\nUsage: hazmon [--ticks N] [--seed N] [--offline]", e);
            process::exit(2);
        }
    };

    let config_path =
        env::var("HAZMON_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let config = match config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            process::exit(1);
        }
    };

    let log_file = env::var("HAZMON_LOG_FILE").ok().or_else(|| config.logging.file.clone());
    logging::init_logger(
        config.logging.min_level(),
        log_file.as_deref(),
        config.logging.timestamps,
    );
    logging::info(Component::System, None, &format!("hazmon starting (config: {})", config_path));

    match env::var("DATABASE_URL") {
        Ok(url) => {
            let mut store = match PgAlertStore::connect(&url) {
                Ok(store) => store,
                Err(e) => {
                    let message = format!("Cannot open alert store: {}", e);
                    logging::error(Component::Store, None, &message);
                    process::exit(1);
                }
            };
            if let Err(e) = store.ensure_schema() {
                logging::error(Component::Store, None, &format!("Schema setup failed: {}", e));
                process::exit(1);
            }
            logging::info(Component::Store, None, "Using PostgreSQL alert store");
            run(store, &config, &options);
        }
        Err(_) => {
            logging::warn(
                Component::Store,
                None,
                "DATABASE_URL not set, alerts kept in memory only",
            );
            run(MemoryAlertStore::new(), &config, &options);
        }
    }
}

fn run<S: AlertStore>(store: S, config: &ServiceConfig, options: &RunOptions) {
    let mut monitor = Monitor::new(
        config.thresholds.clone(),
        store,
        Box::new(RandomJitter::seeded(options.seed)),
        config.monitor.max_weather_age_minutes,
    );
    let mut simulator = SensorSimulator::calm(Utc::now(), options.seed);
    simulator.update_interval = chrono::Duration::seconds(config.monitor.poll_interval_secs as i64);

    let weather_client = if options.offline {
        None
    } else {
        match OpenMeteoClient::new() {
            Ok(client) => Some(client),
            Err(e) => {
                logging::log_weather_failure("client setup", &e);
                None
            }
        }
    };

    let weather_every = config.monitor.weather_every_ticks.max(1) as usize;
    let mut weather: Option<WeatherSnapshot> = None;
    let mut heat_outlook: Option<HeatWaveOutlook> = None;
    let mut tick = 0usize;

    loop {
        if options.ticks.is_some_and(|limit| tick >= limit) {
            break;
        }

        if let Some(client) = &weather_client {
            if tick % weather_every == 0 {
                let (lat, lon) = (config.monitor.latitude, config.monitor.longitude);
                match client.current(lat, lon) {
                    Ok(snapshot) => weather = Some(snapshot),
                    Err(e) => logging::log_weather_failure("forecast fetch", &e),
                }
                match client.daily_max_temperatures(lat, lon) {
                    Ok(days) => {
                        let outlook = predict_heat_wave(&days);
                        if heat_outlook.as_ref() != Some(&outlook) {
                            log_heat_outlook(&outlook);
                            heat_outlook = Some(outlook);
                        }
                    }
                    Err(e) => logging::log_weather_failure("heat outlook fetch", &e),
                }
            }
        }

        let reading = simulator.step();
        if let Ok(report) = monitor.tick(&reading, weather.clone()) {
            for (hazard, band) in &report.bands {
                if *band == GaugeBand::Watch {
                    logging::debug(Component::Monitor, Some(*hazard), "approaching threshold");
                }
            }
            for prediction in &report.assessment.predictions {
                logging::debug(
                    Component::Scorer,
                    Some(prediction.hazard),
                    &format!(
                        "{}% {} within {}",
                        prediction.probability, prediction.severity, prediction.timeframe
                    ),
                );
            }
        }

        tick += 1;
        thread::sleep(Duration::from_secs(config.monitor.poll_interval_secs));
    }

    let stats = monitor.stats();
    logging::log_run_summary(stats.ticks, stats.alerts_created, stats.store_failures);
}

fn log_heat_outlook(outlook: &HeatWaveOutlook) {
    if outlook.is_clear() {
        logging::info(Component::Weather, None, &outlook.advice);
        return;
    }
    for warning in &outlook.warnings {
        logging::warn(Component::Weather, None, warning);
    }
    logging::warn(Component::Weather, None, &outlook.advice);
}
