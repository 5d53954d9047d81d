#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use std::path::PathBuf;
use structopt::{clap::crate_version, StructOpt};

use r53ddns::config::Config;
use r53ddns::provider::Route53;
use r53ddns::resolver::OpenDns;
use r53ddns::state::StateFile;
use r53ddns::updater::Updater;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "r53ddns",
    about = "Point a Route53 A record at this machine's public IPv4 address"
)]
struct Opts {
    #[structopt(help = "Route53 hosted zone ID")]
    hosted_zone_id: String,

    #[structopt(help = "Fully qualified name of the A record to update")]
    domain: String,

    #[structopt(
        long = "log-level",
        short = "l",
        default_value = "info",
        env = "LOG_LEVEL",
        help = "Enables different levels of log messages"
    )]
    log_level: String,

    #[structopt(
        long = "state-dir",
        short = "s",
        default_value = ".",
        env = "STATE_DIR",
        parse(from_os_str),
        help = "Directory holding the last published address for each domain"
    )]
    state_dir: PathBuf,

    #[structopt(
        long = "config-file",
        short = "c",
        env = "CONFIG_FILE",
        help = "Path to an optional config file overriding the echo server"
    )]
    config_file: Option<String>,
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let path = match path {
        Some(p) => p,
        None => return Ok(Config::default()),
    };

    info!("Loading configuration from {}", path);
    let f = std::fs::read_to_string(path).context("Failed to read configuration file")?;
    debug!("Raw config: {}", f);

    toml::from_str(&f).context("Failed to parse configuration file")
}

#[tokio::main(basic_scheduler)]
async fn main() -> Result<()> {
    let opts = Opts::from_args();

    std::env::set_var("LOG_LEVEL", &opts.log_level);

    env_logger::init_from_env("LOG_LEVEL");

    info!("Starting r53ddns {}", crate_version!());

    let c = load_config(opts.config_file.as_deref())?;
    debug!("Decoded config: {:?}", c);

    let state = StateFile::for_domain(&opts.state_dir, &opts.domain)?;
    debug!("Using state file {}", state.path().display());

    let source = OpenDns::new(&c.resolver).await?;
    let provider = Route53::new();
    let updater = Updater::new(&provider, &state, &opts.hosted_zone_id, &opts.domain);

    let outcome = r53ddns::run(&source, &updater).await?;
    debug!("Finished: {:?}", outcome);

    Ok(())
}
