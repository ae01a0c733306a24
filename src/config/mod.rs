use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chain::ClientConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    pub bridge: BridgeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub l1_lcd_endpoint: String,
    pub l1_chain_id: String,
    pub l2_lcd_endpoint: String,
    pub l2_chain_id: String,
    pub connection_timeout: u64,
    pub request_timeout: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Identifier of the bridge instance registered with the L1 output contract
    pub bridge_id: String,
    /// Wall-clock budget for confirmation waits, in seconds
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout: u64,
}

fn default_confirm_timeout() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: ChainConfig {
                l1_lcd_endpoint: "https://lcd.initiation-2.initia.xyz".to_string(),
                l1_chain_id: "initiation-2".to_string(),
                l2_lcd_endpoint: "https://lcd.minimove-2.initia.xyz".to_string(),
                l2_chain_id: "minimove-2".to_string(),
                connection_timeout: 10,
                request_timeout: 30,
                max_retries: 3,
            },
            bridge: BridgeSettings {
                bridge_id: "minimove-2".to_string(),
                confirm_timeout: default_confirm_timeout(),
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Client configuration for the settlement (L1) node
    pub fn l1_client_config(&self) -> ClientConfig {
        ClientConfig {
            lcd_endpoint: self.chain.l1_lcd_endpoint.clone(),
            chain_id: self.chain.l1_chain_id.clone(),
            connection_timeout: self.chain.connection_timeout,
            request_timeout: self.chain.request_timeout,
            max_retries: self.chain.max_retries,
        }
    }

    /// Client configuration for the rollup (L2) node
    pub fn l2_client_config(&self) -> ClientConfig {
        ClientConfig {
            lcd_endpoint: self.chain.l2_lcd_endpoint.clone(),
            chain_id: self.chain.l2_chain_id.clone(),
            connection_timeout: self.chain.connection_timeout,
            request_timeout: self.chain.request_timeout,
            max_retries: self.chain.max_retries,
        }
    }
}
