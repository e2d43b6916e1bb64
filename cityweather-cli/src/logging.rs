use tracing_subscriber::{EnvFilter, fmt};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` from the config,
/// raised to debug/trace by `-v`/`-vv`.
pub fn init(default_level: &str, verbose: u8) {
    let level = match verbose {
        0 => default_level,
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("cityweather_core={level},cityweather={level},warn"))
    });

    // Ignore the error if a subscriber is already set.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
