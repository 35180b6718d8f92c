use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Clone)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(
        short = 'b',
        long = "bind",
        value_name = "ADDR",
        default_value = "0.0.0.0:3000",
        help = "Listen address for the prediction endpoint"
    )]
    pub bind: SocketAddr,

    /// Enable verbose logging
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v for debug, -vv for trace)"
    )]
    pub verbose: u8,

    /// Path to the YAML configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "CONFIG_PATH",
        default_value = "config.yaml",
        help = "Configuration file path"
    )]
    pub config_path: PathBuf,
}
