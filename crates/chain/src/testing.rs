use alloy::primitives::{address, b256, Address, B256};
use futures_util::{SinkExt, StreamExt};
use pairwatch_core::config::ChainConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub const FACTORY: Address = address!("0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73");
pub const PAIR_CREATED: B256 =
    b256!("0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9");
pub const SUBSCRIPTION_ID: &str =
    "0xabababababababababababababababababababababababababababababababab";

#[derive(Clone, Copy)]
pub enum AfterSubscribe {
    KeepOpen,
    /// Closes the socket right after acknowledging `eth_subscribe`.
    Close,
}

/// Local JSON-RPC WebSocket node. Acknowledges `eth_subscribe` and
/// `eth_unsubscribe`, records every request it receives and counts accepted
/// connections.
pub struct MockNode {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: mpsc::UnboundedReceiver<Value>,
}

impl MockNode {
    pub async fn spawn(after_subscribe: AfterSubscribe) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let (tx, requests) = mpsc::unbounded_channel();

        let accepted = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, tx.clone(), after_subscribe));
            }
        });

        Self {
            addr,
            connections,
            requests,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Next recorded request with the given method; earlier ones are skipped.
    pub async fn next_request(&mut self, method: &str) -> Value {
        loop {
            let request = self.requests.recv().await.unwrap();
            if request["method"] == method {
                return request;
            }
        }
    }
}

pub fn chain_config(node: &MockNode) -> ChainConfig {
    ChainConfig {
        rpc_ws: node.url(),
        private_key_env: "PAIRWATCH_TEST_UNUSED_KEY".to_string(),
    }
}

async fn serve(
    stream: TcpStream,
    requests: mpsc::UnboundedSender<Value>,
    after_subscribe: AfterSubscribe,
) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let method = request["method"].as_str().unwrap_or_default().to_string();
        let result = match method.as_str() {
            "eth_subscribe" => json!(SUBSCRIPTION_ID),
            "eth_unsubscribe" => json!(true),
            _ => Value::Null,
        };
        let response = json!({
            "jsonrpc": "2.0",
            "id": request["id"].clone(),
            "result": result,
        });
        let _ = requests.send(request);
        if ws.send(Message::Text(response.to_string())).await.is_err() {
            return;
        }
        if method == "eth_subscribe" && matches!(after_subscribe, AfterSubscribe::Close) {
            let _ = ws.close(None).await;
            return;
        }
    }
}
