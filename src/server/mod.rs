//! Relay HTTP/WebSocket server
//!
//! Wires the state store and subscriber registry behind the HTTP surface:
//! ingestion (`POST /api/state`, `POST /api/select`), queries
//! (`GET /api/health`, `/api/state`, `/api/project`) and the push channel
//! (`GET /ws/state`).

pub mod config;
mod ingest;
mod push;
mod query;

pub use config::ServerConfig;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::message::{ProjectId, PushMessage};
use crate::project::ProjectDocument;
use crate::registry::{SubscriberHandle, SubscriberRegistry};
use crate::state::{StateStore, TransportState};

/// Shared state behind every request handler.
///
/// The `update_lock` serializes the three compound store-then-broadcast
/// operations. That is what makes mutation order equal broadcast order for
/// every subscriber, and what keeps a connect-time snapshot from
/// interleaving with a broadcast. Plain query reads never take it.
#[derive(Clone)]
pub struct AppState {
    store: Arc<StateStore>,
    registry: Arc<SubscriberRegistry>,
    update_lock: Arc<Mutex<()>>,
    ping_interval: Duration,
}

impl AppState {
    /// Build shared state from a configured store.
    pub fn new(store: StateStore, config: &ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            registry: Arc::new(SubscriberRegistry::with_config(config.registry.clone())),
            update_lock: Arc::new(Mutex::new(())),
            ping_interval: config.ping_interval,
        }
    }

    /// Get a reference to the state store
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Get a reference to the subscriber registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// WebSocket keepalive interval
    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Accept a state update and fan it out.
    ///
    /// Store and broadcast happen as one serialized step; every accepted
    /// update is broadcast, changed or not (the poller posts every tick and
    /// every tick goes out).
    pub async fn apply_state(&self, candidate: TransportState) -> Result<TransportState> {
        let _guard = self.update_lock.lock().await;

        let accepted = self.store.set_state(candidate).await?;
        let delivered = self.registry.broadcast(PushMessage::State(accepted)).await;

        tracing::debug!(
            bar = accepted.bar,
            beat = accepted.beat,
            playing = accepted.playing,
            delivered = delivered,
            "State update applied"
        );

        Ok(accepted)
    }

    /// Accept a project selection.
    ///
    /// Always stored; broadcast only when the stored value actually changed,
    /// so re-selecting the current project is a true no-op for subscribers.
    pub async fn apply_selection(&self, id: ProjectId) -> Result<ProjectId> {
        let _guard = self.update_lock.lock().await;

        let previous = self.store.set_selection(id.clone()).await;
        if previous.as_ref() != Some(&id) {
            let delivered = self
                .registry
                .broadcast(PushMessage::Selection {
                    project_id: id.clone(),
                })
                .await;

            tracing::info!(project_id = %id, delivered = delivered, "Project selected");
        }

        Ok(id)
    }

    /// Register a push subscriber and capture its snapshot.
    ///
    /// Done under the update lock so the snapshot equals the current state
    /// at the registration point, and every broadcast the subscriber later
    /// receives is strictly newer than it.
    pub async fn connect_subscriber(
        &self,
    ) -> (
        SubscriberHandle,
        mpsc::Receiver<PushMessage>,
        Vec<PushMessage>,
    ) {
        let _guard = self.update_lock.lock().await;

        let (handle, rx) = self.registry.register().await;

        let mut snapshot = vec![PushMessage::State(self.store.state().await)];
        if let Some(project_id) = self.store.selection().await {
            snapshot.push(PushMessage::Selection { project_id });
        }

        (handle, rx, snapshot)
    }
}

/// DAW transport-state relay server
pub struct RelayServer {
    config: ServerConfig,
    app: AppState,
}

impl RelayServer {
    /// Create a new server around a configured store.
    pub fn new(config: ServerConfig, store: StateStore) -> Self {
        let app = AppState::new(store, &config);
        Self { config, app }
    }

    /// Create a server from configuration alone.
    ///
    /// When `project_path` is set, the document is loaded and the initial
    /// transport state seeded from its metadata; otherwise the store starts
    /// with the documented defaults and `GET /api/project` reports not
    /// loaded.
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let store = match &config.project_path {
            Some(path) => {
                let document = ProjectDocument::load(path)?;
                let seed = document.seed_state();
                tracing::info!(
                    path = %path.display(),
                    bpm = seed.bpm,
                    ts = %format!("{}/{}", seed.ts_num, seed.ts_den),
                    "Project loaded"
                );
                StateStore::new()
                    .with_initial_state(seed)
                    .with_document(document)
            }
            None => StateStore::new(),
        };

        Ok(Self::new(config, store))
    }

    /// Shared handler state, for driving the relay without a socket (tests,
    /// embedding).
    pub fn app_state(&self) -> &AppState {
        &self.app
    }

    /// Build the router serving the full HTTP surface.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(query::get_health))
            .route("/api/project", get(query::get_project))
            .route("/api/state", get(query::get_state).post(ingest::post_state))
            .route("/api/select", post(ingest::post_select))
            .route("/ws/state", get(push::ws_state))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.app.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Relay server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        self.config.bind_addr
    }
}
