//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::{App, Arg};
use halo_router::{RouterConfig, DEFAULT_HELLO_INTERVAL_MS, DEFAULT_LSU_INTERVAL_MS};

/// Process-wide configuration, assembled once at startup from the
/// environment and from `--ip`. Everything downstream treats this as
/// immutable.
pub struct Config {
    pub if_prefix: String,
    pub router: RouterConfig,
    pub controller_addr: Option<String>,
}

fn env_u64(name: &str, default: u64) -> Result<u64, halo_router::Error> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| halo_router::Error::Config(format!("{name} is not a valid integer: {value}"))),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(halo_router::Error::Config(format!("{name} is not valid UTF-8")))
        }
    }
}

fn env_ipv4(name: &str) -> Result<Option<Ipv4Addr>, halo_router::Error> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| halo_router::Error::Config(format!("{name} is not a dotted-quad address: {value}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(halo_router::Error::Config(format!("{name} is not valid UTF-8")))
        }
    }
}

impl Config {
    /// Parses `--ip` and the environment. `--ip`, when given, takes
    /// precedence over `ROUTER_ID_OVERRIDE`.
    pub fn from_args_and_env(args: impl IntoIterator<Item = String>) -> Result<Self, halo_router::Error> {
        let matches = App::new("halod")
            .about("PWOSPF routing agent")
            .arg(
                Arg::with_name("ip")
                    .long("ip")
                    .value_name("DOTTED_QUAD")
                    .help("overrides primary IP detection for test rigs")
                    .takes_value(true),
            )
            .get_matches_from(args);

        let if_prefix = std::env::var("HALO_IF_PREFIX").unwrap_or_else(|_| halo_iface::DEFAULT_IF_PREFIX.to_string());
        let hello_interval = Duration::from_millis(env_u64("HELLO_INTERVAL_MS", DEFAULT_HELLO_INTERVAL_MS)?);
        let lsu_interval = Duration::from_millis(env_u64("LSU_INTERVAL_MS", DEFAULT_LSU_INTERVAL_MS)?);
        let controller_addr = std::env::var("CONTROLLER_ADDR").ok();

        let router_id_override = match matches.value_of("ip") {
            Some(ip) => Some(
                ip.parse::<Ipv4Addr>()
                    .map_err(|_| halo_router::Error::Config(format!("--ip is not a dotted-quad address: {ip}")))?,
            ),
            None => env_ipv4("ROUTER_ID_OVERRIDE")?,
        };

        Ok(Config {
            if_prefix,
            router: RouterConfig { hello_interval, lsu_interval, router_id_override },
            controller_addr,
        })
    }
}
