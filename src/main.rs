//! MC Server Termux installer binary

use clap::Parser;
use log::error;

use mc_server_installer::cli::Cli;
use mc_server_installer::install::run_install;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    let code = match rt.block_on(run_install(&cli)) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("❌ {e:#}");
            1
        }
    };
    // An interrupted prompt may still be blocked on stdin; don't wait for it
    rt.shutdown_background();
    std::process::exit(code);
}
