use serde::Deserialize;

pub const DEFAULT_QUERY_NAME: &str = "myip.opendns.com";
pub const DEFAULT_SERVER: &str = "resolver1.opendns.com";
pub const DEFAULT_PORT: u16 = 53;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// Where the external address is asked for. The server echoes back the
/// address the query came from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub query_name: String,
    pub server: String,
    pub port: u16,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            query_name: DEFAULT_QUERY_NAME.to_string(),
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
