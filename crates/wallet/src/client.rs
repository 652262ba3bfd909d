//! Chain query client used by an authenticated session

use async_trait::async_trait;
use capsule_common::{ChainInfo, ChainResult, LcdClient};
use std::sync::Arc;
use tracing::{debug, warn};

/// Read access to chain state
#[async_trait]
pub trait ChainQueryClient: Send + Sync {
    async fn balance(&self, address: &str, denom: &str) -> ChainResult<u128>;
}

#[async_trait]
impl ChainQueryClient for LcdClient {
    async fn balance(&self, address: &str, denom: &str) -> ChainResult<u128> {
        LcdClient::balance(self, address, denom).await
    }
}

/// Opens query clients for a chain
#[async_trait]
pub trait ClientConnector: Send + Sync {
    async fn connect(&self, chain: &ChainInfo) -> ChainResult<Arc<dyn ChainQueryClient>>;
}

/// Connects to the chain's REST endpoint and probes it before use
#[derive(Debug, Default, Clone)]
pub struct LcdConnector;

#[async_trait]
impl ClientConnector for LcdConnector {
    async fn connect(&self, chain: &ChainInfo) -> ChainResult<Arc<dyn ChainQueryClient>> {
        let client = LcdClient::new(chain.rest.clone());
        let network = client.node_network().await?;

        if network != chain.chain_id {
            warn!(
                "Node at {} reports network {}, expected {}",
                chain.rest, network, chain.chain_id
            );
        } else {
            debug!("Connected to {} at {}", network, chain.rest);
        }

        Ok(Arc::new(client))
    }
}
