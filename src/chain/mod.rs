pub mod client;
pub mod denom;
pub mod queries;
pub mod tx;

pub use client::{AccountInfo, BroadcastResponse, ClientConfig, LcdClient, NodeInfo, TxInfo};
pub use denom::l2_denom;
pub use queries::{query_bridge_config, query_coin_info, BridgeConfig, CoinInfo};
pub use tx::{await_confirmation, submit, Msg, SigningContext, SubmitOptions, TxSigner};
