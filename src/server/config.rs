// Server configuration

use crate::constants;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    /// 0 binds an ephemeral port
    pub port: u16,
    /// Inject a script into HTML pages that stops navigation to external sites
    pub block_external_links: bool,
    pub verbose: bool,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: constants::DEFAULT_ADDRESS.to_string(),
            port: constants::DEFAULT_PORT,
            block_external_links: false,
            verbose: false,
            version: constants::VERSION.to_string(),
        }
    }
}
