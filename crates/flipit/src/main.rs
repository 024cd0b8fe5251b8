use flipit::{ClockConfig, ClockMode};
use flipit_engine::logging::{init_logging, LoggingConfig};

fn main() -> anyhow::Result<()> {
    let config = ClockConfig::from_env();

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &config.log_filter {
        logging = logging.with_filter(filter.clone());
    }
    init_logging(logging);

    flipit::run(ClockMode::Fullscreen, config)
}
