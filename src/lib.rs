// Library exports for opbridge

pub mod chain;
pub mod config;

// Re-export main types for convenience
pub use chain::{
    await_confirmation, query_bridge_config, query_coin_info, submit, BridgeConfig, ClientConfig,
    CoinInfo, LcdClient, Msg, SigningContext, SubmitOptions, TxInfo, TxSigner,
};
pub use config::Config;
