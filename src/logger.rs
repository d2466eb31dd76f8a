use log::LevelFilter;
use env_logger::Builder;
use std::io::Write;
use chrono::Local;

/// `level` is the default; `RUST_LOG` still wins when set.
pub fn init(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .filter(Some("html5ever"), LevelFilter::Warn)
        .filter(Some("selectors"), LevelFilter::Warn)
        .parse_default_env()
        .init();

    log::debug!("Logger initialized at {}.", level);
}
