//! Logger setup for the CLI.

use std::io::Write;

use log::LevelFilter;

/// Install the `env_logger` backend.
///
/// `RUST_LOG` wins when it is set. Otherwise gtdraw logs at `info`, or
/// `debug` when `verbose` is true, and every other crate is silenced.
pub fn init(verbose: bool) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        builder.filter(None, LevelFilter::Off);
        builder.filter(Some("gtdraw"), level);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{:<5} {}] {}",
            record.level(),
            record.module_path().unwrap_or("gtdraw"),
            record.args()
        )
    });

    // A logger may already be installed when embedded in tests.
    let _ = builder.try_init();
}
