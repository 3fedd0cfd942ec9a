use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

use crate::config::LoggingConfig;
use crate::utils::devlog::QUERY_TARGET;

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Initializes logging from a log4rs config file (YAML/TOML/JSON).
///
/// # Errors
/// Returns an error if the file cannot be read or the logger is already set.
pub fn init_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Build the gateway's log4rs configuration:
/// - `gateway.log` at the configured level for everything;
/// - `query.log` for per-query timing lines (`telemetry_gateway::query`, debug).
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender fails to build.
pub fn build_config(cfg: &LoggingConfig) -> Result<Config, Box<dyn std::error::Error>> {
    let base = cfg
        .dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(cfg.retention.unwrap_or(7)).unwrap_or(7);
    let lvl = parse_level(cfg.level.as_deref());

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "gateway", keep)?)))
        .appender(Appender::builder().build("query", Box::new(rolling(&base, "query", keep)?)))
        .logger(
            Logger::builder()
                .appender("query")
                .additive(false)
                .build(QUERY_TARGET, LevelFilter::Debug),
        )
        .build(Root::builder().appender("app").build(lvl))?;
    Ok(config)
}

/// Configure logging globally for the process. A second call is ignored.
///
/// # Errors
/// Returns an error if the configuration cannot be built.
pub fn configure_logging(cfg: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(cfg)?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already initialized");
    }
    Ok(())
}

/// Overlay environment variables onto a logging config:
/// - TELEMETRY_GATEWAY_LOG_DIR
/// - TELEMETRY_GATEWAY_LOG_LEVEL
/// - TELEMETRY_GATEWAY_LOG_RETENTION
#[must_use]
pub fn logging_from_env(mut cfg: LoggingConfig) -> LoggingConfig {
    if let Ok(dir) = std::env::var("TELEMETRY_GATEWAY_LOG_DIR") {
        cfg.dir = Some(PathBuf::from(dir));
    }
    if let Ok(level) = std::env::var("TELEMETRY_GATEWAY_LOG_LEVEL") {
        cfg.level = Some(level);
    }
    if let Some(keep) =
        std::env::var("TELEMETRY_GATEWAY_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok())
    {
        cfg.retention = Some(keep);
    }
    cfg
}
