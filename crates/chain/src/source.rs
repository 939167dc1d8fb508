use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{Filter, Log};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

pub type LogStream = BoxStream<'static, Log>;

/// One contract address and one event signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogSubscription {
    pub address: Address,
    pub event: B256,
}

impl LogSubscription {
    pub fn new(address: Address, event: B256) -> Self {
        Self { address, event }
    }

    pub fn filter(&self) -> Filter {
        Filter::new().address(self.address).event_signature(self.event)
    }

    pub fn matches(&self, log: &Log) -> bool {
        log.inner.address == self.address && log.inner.data.topics().first() == Some(&self.event)
    }
}

/// Source of live contract logs. Dropping a returned stream releases the
/// subscription behind it.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn subscribe(&self, subscription: LogSubscription) -> Result<LogStream>;
}

#[derive(Clone)]
pub struct WsLogSource {
    provider: DynProvider,
}

impl WsLogSource {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl LogSource for WsLogSource {
    async fn subscribe(&self, subscription: LogSubscription) -> Result<LogStream> {
        let sub = self.provider.subscribe_logs(&subscription.filter()).await?;
        let guard = Unsubscribe {
            provider: self.provider.clone(),
            id: *sub.local_id(),
        };
        let stream = GuardedStream {
            inner: sub.into_stream().boxed(),
            _guard: guard,
        };
        Ok(stream.boxed())
    }
}

struct Unsubscribe {
    provider: DynProvider,
    id: B256,
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        // The root provider queues `eth_unsubscribe` without awaiting.
        if let Err(err) = self.provider.root().unsubscribe(self.id) {
            debug!(?err, id = %self.id, "unsubscribe failed");
        }
    }
}

struct GuardedStream {
    inner: LogStream,
    _guard: Unsubscribe,
}

impl Stream for GuardedStream {
    type Item = Log;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Log>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::{LogSource, LogSubscription, WsLogSource};
    use crate::client::NodeClient;
    use crate::testing::{
        chain_config, AfterSubscribe, MockNode, FACTORY, PAIR_CREATED, SUBSCRIPTION_ID,
    };
    use alloy::primitives::{address, b256, Address, Log as PrimitiveLog, LogData, B256};
    use alloy::rpc::types::Log;
    use std::time::Duration;

    #[test]
    fn subscription_matches_address_and_topic0() {
        let pair = address!("0x1000000000000000000000000000000000000001");
        let other = address!("0x2000000000000000000000000000000000000002");
        let topic = b256!("0x4c209b5fc8ad50758f13e2e1088ba56a560dff690a1c6fef26394f4c03821c4f");
        let sub = LogSubscription::new(pair, topic);

        let log_at = |address: Address, topics: Vec<B256>| Log {
            inner: PrimitiveLog {
                address,
                data: LogData::new_unchecked(topics, Default::default()),
            },
            ..Default::default()
        };

        assert!(sub.matches(&log_at(pair, vec![topic])));
        assert!(!sub.matches(&log_at(other, vec![topic])));
        assert!(!sub.matches(&log_at(pair, vec![])));
    }

    #[tokio::test]
    async fn dropping_stream_sends_eth_unsubscribe() {
        let mut node = MockNode::spawn(AfterSubscribe::KeepOpen).await;
        let client = NodeClient::connect(&chain_config(&node)).await.unwrap();
        let source = WsLogSource::new(client.ws);

        let stream = source
            .subscribe(LogSubscription::new(FACTORY, PAIR_CREATED))
            .await
            .unwrap();
        let subscribe = node.next_request("eth_subscribe").await;
        assert_eq!(subscribe["params"][0], "logs");

        drop(stream);

        let unsubscribe =
            tokio::time::timeout(Duration::from_secs(5), node.next_request("eth_unsubscribe"))
                .await
                .expect("no eth_unsubscribe after the stream was dropped");
        assert_eq!(unsubscribe["params"][0], SUBSCRIPTION_ID);
    }
}
