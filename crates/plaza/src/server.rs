//! `PlazaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → gateway → rooms.
//! Each accepted connection gets its own handler task; shared state is
//! limited to the room registry and the injected collaborators.

use std::sync::Arc;
use std::time::Duration;

use plaza_proto::{Codec, JsonCodec};
use plaza_room::{RoomConfig, RoomRegistry};
use plaza_session::IdentityVerifier;
use plaza_space::SpaceDirectory;
use plaza_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::PlazaError;

/// Timeouts applied by the connection gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How long a fresh connection gets to send its join request.
    pub handshake_timeout: Duration,

    /// Bound on each collaborator call (identity verification, space
    /// lookup). A timeout is treated as a join failure, never left
    /// pending.
    pub collaborator_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            collaborator_timeout: Duration::from_secs(3),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<V, D, C> {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) verifier: V,
    pub(crate) directory: D,
    pub(crate) codec: C,
    pub(crate) gateway: GatewayConfig,
    pub(crate) outbound_capacity: usize,
}

/// Builder for configuring and starting a Plaza server.
///
/// # Example
///
/// ```rust,ignore
/// use plaza::prelude::*;
///
/// let server = PlazaServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(verifier, directory)
///     .await?;
/// server.run().await
/// ```
pub struct PlazaServerBuilder {
    bind_addr: String,
    gateway: GatewayConfig,
    room: RoomConfig,
}

impl PlazaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            gateway: GatewayConfig::default(),
            room: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the gateway timeouts.
    pub fn gateway_config(mut self, config: GatewayConfig) -> Self {
        self.gateway = config;
        self
    }

    /// Sets the configuration applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room = config;
        self
    }

    /// Builds and binds the server with the given collaborators.
    ///
    /// Uses `JsonCodec` and the WebSocket transport.
    pub async fn build<V, D>(
        self,
        verifier: V,
        directory: D,
    ) -> Result<PlazaServer<V, D, JsonCodec>, PlazaError>
    where
        V: IdentityVerifier,
        D: SpaceDirectory,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let outbound_capacity = self.room.outbound_capacity;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(self.room),
            verifier,
            directory,
            codec: JsonCodec,
            gateway: self.gateway,
            outbound_capacity,
        });

        Ok(PlazaServer { transport, state })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Plaza server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PlazaServer<V, D, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<V, D, C>>,
}

impl<V, D, C> PlazaServer<V, D, C>
where
    V: IdentityVerifier,
    D: SpaceDirectory,
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one handler task per connection, until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), PlazaError> {
        tracing::info!("Plaza server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
