//! Command-line arguments for mcst-install

use clap::Parser;
use clap::builder::FalseyValueParser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mcst-install")]
#[command(version, about = "Install MC Server Termux and its dependencies")]
pub struct Cli {
    /// TOML file overriding installer defaults
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where to install the manager (default: ~/mc-server-termux)
    #[arg(long, env = "MCST_INSTALL_ROOT", value_name = "PATH")]
    pub install_root: Option<PathBuf>,

    /// Show internal paths and computed values
    #[arg(long, env = "MCST_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Delete this installer after a successful installation
    #[arg(long)]
    pub remove_installer: bool,

    /// Do not offer to start the manager when done
    #[arg(long)]
    pub no_launch: bool,
}
