use anyhow::{anyhow, Context, Error, Result};
use log::debug;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use trust_dns_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    AsyncResolver, TokioAsyncResolver,
};

use crate::config::{ResolverSettings, DEFAULT_SERVER};

const DEFAULT_OPENDNS_IP: Ipv4Addr = Ipv4Addr::new(208, 67, 222, 222);

/// Anything that can tell us the public IPv4 address of this machine.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AddressSource: Send + Sync {
    async fn current(&self) -> Result<Ipv4Addr>;
}

/// Asks an OpenDNS-style echo server for the A record of a magic name. The
/// answer is the address the query arrived from.
pub struct OpenDns {
    resolver: TokioAsyncResolver,
    query_name: String,
}

impl OpenDns {
    pub async fn new(settings: &ResolverSettings) -> Result<Self> {
        let server_ip = match settings.server.parse::<Ipv4Addr>() {
            Ok(ip) => ip,
            Err(_) => lookup_server(&settings.server).await?,
        };
        debug!("Using echo server {}:{}", server_ip, settings.port);

        let resolver = AsyncResolver::tokio(
            resolver_config(SocketAddr::new(IpAddr::from(server_ip), settings.port)),
            resolver_opts(),
        )
        .await
        .context("Failed to create resolver")?;

        Ok(Self {
            resolver,
            query_name: settings.query_name.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AddressSource for OpenDns {
    async fn current(&self) -> Result<Ipv4Addr> {
        let answer = self
            .resolver
            .ipv4_lookup(self.query_name.as_str())
            .await
            .map_err(|e| classify(&self.query_name, e))?;

        answer
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Answer for {} held no A record", self.query_name))
    }
}

async fn lookup_server(server: &str) -> Result<Ipv4Addr> {
    let system = AsyncResolver::tokio_from_system_conf()
        .await
        .context("Failed to load system resolver configuration")?;
    let found = match system.ipv4_lookup(server).await {
        Ok(answer) => answer.into_iter().next(),
        Err(e) => match e.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => None,
            _ => {
                return Err(e)
                    .with_context(|| format!("Failed to look up echo server {}", server))
            }
        },
    };

    server_or_fallback(server, found)
}

fn server_or_fallback(server: &str, found: Option<Ipv4Addr>) -> Result<Ipv4Addr> {
    match found {
        Some(ip) => Ok(ip),
        None if server == DEFAULT_SERVER => Ok(DEFAULT_OPENDNS_IP),
        None => Err(anyhow!("Echo server {} has no IPv4 address", server)),
    }
}

fn resolver_config(socket_addr: SocketAddr) -> ResolverConfig {
    let mut rconf = ResolverConfig::new();
    rconf.add_name_server(NameServerConfig {
        socket_addr,
        protocol: Protocol::Udp,
        tls_dns_name: None,
    });
    rconf
}

// One query, no retries. The default timeout is kept.
fn resolver_opts() -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.attempts = 1;
    opts
}

fn classify(name: &str, e: ResolveError) -> Error {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => {
            anyhow!("Unexpected response for {}: {}", name, e)
        }
        _ => anyhow!("No response for {}: {}", name, e),
    }
}
