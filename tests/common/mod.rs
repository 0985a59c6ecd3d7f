#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use state_hub::config::HubConfig;
use state_hub::server::{self, AppState};
use state_hub::{Event, HubClient};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub struct TestHub {
    pub addr: SocketAddr,
    pub state: AppState,
    server: JoinHandle<()>,
}

impl TestHub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = AppState::new(HubConfig::default());

        let server_state = state.clone();
        let server = tokio::spawn(async move {
            let _ = server::serve_on(listener, server_state).await;
        });

        Self { addr, state, server }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Connect and consume the hello, returning it alongside the client.
    pub async fn connect(&self) -> (HubClient, Event) {
        let mut client = HubClient::connect(&self.ws_url()).await.expect("ws connect");
        let hello = next_event(&mut client).await.expect("hello");
        (client, hello)
    }

    /// Wait until the registry reaches `expected` subscribers.
    pub async fn wait_for_subscribers(&self, expected: usize) -> bool {
        for _ in 0..100 {
            if self.state.hub.registry().count() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub async fn next_event(client: &mut HubClient) -> Option<Event> {
    match timeout(Duration::from_secs(3), client.next_event()).await {
        Ok(Ok(event)) => event,
        _ => None,
    }
}

/// `None` if nothing arrives within a short quiet period.
pub async fn quiet(client: &mut HubClient) -> Option<Event> {
    match timeout(Duration::from_millis(300), client.next_event()).await {
        Ok(Ok(event)) => event,
        _ => None,
    }
}
