use std::time::Duration;

use tether_core::init_logging;

mod app;
mod commands;
mod terminal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    // Extract verbose flag before initializing logging
    let verbose = matches.get_flag("verbose");
    init_logging(!verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(commands::run_command(&matches));

    // A pending stdin read sits on a blocking thread and cannot be cancelled.
    runtime.shutdown_timeout(Duration::from_millis(100));

    result
}
