use anyhow::Result;
use simple_logger::init_with_level;

pub fn init(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };

    init_with_level(level)?;

    Ok(())
}
