use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::pubsub::{ConnectionHandle, PubSubConnect};
use alloy::transports::{TransportErrorKind, TransportResult};
use anyhow::Result;
use pairwatch_core::config::ChainConfig;
use std::future::Future;
use tracing::info;

#[derive(Clone)]
pub struct NodeClient {
    pub ws: DynProvider,
}

impl NodeClient {
    /// Opens the single streaming connection. A dropped socket shuts the
    /// pubsub service down, so every live subscription stream ends instead of
    /// being resubscribed on a fresh socket.
    pub async fn connect(cfg: &ChainConfig) -> Result<Self> {
        info!(url = %cfg.rpc_ws, "connecting");
        let transport = OneShotWs {
            inner: WsConnect::new(cfg.rpc_ws.clone()).with_max_retries(0),
        };
        let ws = ProviderBuilder::new()
            .connect_pubsub_with(transport)
            .await?
            .erased();
        Ok(Self { ws })
    }
}

/// WebSocket connector that refuses every reconnect attempt.
#[derive(Clone, Debug)]
struct OneShotWs {
    inner: WsConnect,
}

impl PubSubConnect for OneShotWs {
    fn is_local(&self) -> bool {
        self.inner.is_local()
    }

    fn connect(&self) -> impl Future<Output = TransportResult<ConnectionHandle>> + Send {
        self.inner.connect()
    }

    fn try_reconnect(&self) -> impl Future<Output = TransportResult<ConnectionHandle>> + Send {
        async { Err(TransportErrorKind::custom_str("websocket closed; reconnect disabled")) }
    }
}

#[cfg(test)]
mod tests {
    use super::NodeClient;
    use crate::pairs::LogForwarder;
    use crate::source::{LogSubscription, WsLogSource};
    use crate::testing::{chain_config, AfterSubscribe, MockNode, FACTORY, PAIR_CREATED};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn socket_drop_ends_streams_without_reconnecting() {
        let node = MockNode::spawn(AfterSubscribe::Close).await;
        let client = NodeClient::connect(&chain_config(&node)).await.unwrap();
        let source = Arc::new(WsLogSource::new(client.ws));

        let mut logs = LogForwarder::new(
            source,
            LogSubscription::new(FACTORY, PAIR_CREATED),
            8,
            None,
        )
        .spawn()
        .await
        .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(15), logs.recv())
            .await
            .expect("factory stream still open after the socket closed");
        assert!(next.is_none());
        assert_eq!(node.connections(), 1);
    }
}
