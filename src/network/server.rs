//! WebSocket Record Server
//!
//! Async WebSocket server for profile and score traffic. Handles
//! authentication, then dispatches record operations to the service.
//! Gameplay itself runs client-side; the server only ever sees
//! finished runs.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::network::auth::{validate_token, AuthConfig, AuthError};
use crate::network::protocol::{
    AuthRequest, AuthResult, ClientMessage, ErrorCode, ErrorReply, ProfileInfo, ServerMessage,
};
use crate::records::profile::PlayerId;
use crate::records::service::{RecordError, RecordService};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds.
    pub bind_addr: SocketAddr,
    /// Cap on simultaneous connections.
    pub max_connections: usize,
    /// Connections silent for longer than this get dropped.
    pub idle_timeout: Duration,
    /// Version string reported to clients on auth.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl ServerConfig {
    /// Default configuration with the bind address taken from
    /// `BIND_ADDR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(addr) = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.bind_addr = addr;
        }
        config
    }
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not bind its address.
    #[error("listener bind failed: {0}")]
    BindFailed(#[from] std::io::Error),

    /// A WebSocket operation failed.
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Per-connection bookkeeping.
struct ConnectedClient {
    /// Identity, set once `auth` succeeds.
    player_id: Option<PlayerId>,
    /// When the socket was accepted.
    connected_at: Instant,
    /// Last inbound frame.
    last_activity: Instant,
    /// Outbound channel, so tasks outside the connection can push frames.
    sender: mpsc::Sender<ServerMessage>,
}

/// The record server.
pub struct RecordServer {
    /// Server configuration.
    config: ServerConfig,
    /// Token validation configuration.
    auth: AuthConfig,
    /// Record service shared with every connection.
    service: Arc<RecordService>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl RecordServer {
    /// Create a new record server.
    pub fn new(config: ServerConfig, auth: AuthConfig, service: Arc<RecordService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            auth,
            service,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Record server listening on {}", self.config.bind_addr);

        if !self.auth.is_configured() {
            warn!("No auth key configured; every auth attempt will fail");
        }

        let sweep_clients = self.clients.clone();
        let idle_timeout = self.config.idle_timeout;
        let sweeper = tokio::spawn(async move {
            Self::sweep_idle_connections(sweep_clients, idle_timeout).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            if self.at_capacity().await {
                                warn!("At capacity, turning away {}", addr);
                                continue;
                            }
                            info!("Connection accepted from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept failed: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested, closing listener");
                    break;
                }
            }
        }

        sweeper.abort();

        Ok(())
    }

    async fn at_capacity(&self) -> bool {
        self.clients.read().await.len() >= self.config.max_connections
    }

    /// Spawn the task that owns one WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let service = self.service.clone();
        let auth = self.auth.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("Handshake with {} failed: {}", addr, e);
                    return;
                }
            };

            let (mut ws_tx, mut ws_rx) = ws_stream.split();
            let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(64);

            clients.write().await.insert(addr, ConnectedClient {
                player_id: None,
                connected_at: Instant::now(),
                last_activity: Instant::now(),
                sender: out_tx.clone(),
            });

            // Writer task: owns the sink half, everything outbound goes
            // through the channel.
            let writer = tokio::spawn(async move {
                while let Some(outbound) = out_rx.recv().await {
                    match outbound.to_json() {
                        Ok(text) => {
                            if ws_tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!("Dropping unserializable frame: {}", e),
                    }
                }
            });

            loop {
                tokio::select! {
                    frame = ws_rx.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                let inbound = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Unparseable frame from {}: {}", addr, e);
                                        let _ = out_tx.send(ServerMessage::Error(ErrorReply {
                                            code: ErrorCode::InvalidInput,
                                            message: "Invalid message format".to_string(),
                                        })).await;
                                        continue;
                                    }
                                };

                                if let Some(client) = clients.write().await.get_mut(&addr) {
                                    client.last_activity = Instant::now();
                                }

                                Self::handle_client_message(
                                    addr,
                                    inbound,
                                    &clients,
                                    &service,
                                    &auth,
                                    &config,
                                    &out_tx,
                                ).await;
                            }
                            Some(Ok(Message::Binary(data))) => {
                                if let Ok(inbound) = ClientMessage::from_bytes(&data) {
                                    Self::handle_client_message(
                                        addr,
                                        inbound,
                                        &clients,
                                        &service,
                                        &auth,
                                        &config,
                                        &out_tx,
                                    ).await;
                                }
                            }
                            Some(Ok(Message::Ping(_))) => {
                                let _ = out_tx.send(ServerMessage::Pong {
                                    timestamp: 0,
                                    server_time: unix_millis(),
                                }).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("{} closed the connection", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("Receive error on {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = out_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            writer.abort();

            let uptime = clients
                .write()
                .await
                .remove(&addr)
                .map(|c| c.connected_at.elapsed());
            if let Some(uptime) = uptime {
                info!("Connection {} closed after {:?}", addr, uptime);
            }
        });
    }

    /// Dispatch one parsed client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        clients: &Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        service: &Arc<RecordService>,
        auth: &AuthConfig,
        config: &ServerConfig,
        out: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::Auth(request) => {
                Self::handle_auth(addr, request, clients, auth, config, out).await;
            }
            ClientMessage::CreateProfile { display_name } => {
                let caller = Self::current_player(clients, addr).await;
                match service.get_or_create_profile(caller, &display_name).await {
                    Ok(profile) => {
                        let _ = out.send(ServerMessage::Profile {
                            profile: Some(ProfileInfo::from_profile(&profile)),
                        }).await;
                    }
                    Err(e) => Self::send_record_error(out, e).await,
                }
            }
            ClientMessage::Profile => {
                let caller = Self::current_player(clients, addr).await;
                let profile = service.current_profile(caller).await;
                let _ = out.send(ServerMessage::Profile {
                    profile: profile.map(|p| ProfileInfo::from_profile(&p)),
                }).await;
            }
            ClientMessage::SubmitRun(submission) => {
                let caller = Self::current_player(clients, addr).await;
                match service.submit_run(caller, submission.to_summary()).await {
                    Ok(outcome) => {
                        let _ = out.send(ServerMessage::SubmitResult(outcome)).await;
                    }
                    Err(e) => Self::send_record_error(out, e).await,
                }
            }
            ClientMessage::Leaderboard => {
                let entries = service.leaderboard().await;
                let _ = out.send(ServerMessage::Leaderboard { entries }).await;
            }
            ClientMessage::Rank => {
                let caller = Self::current_player(clients, addr).await;
                let rank = service.own_rank(caller).await;
                let _ = out.send(ServerMessage::Rank { rank }).await;
            }
            ClientMessage::SetWallet { address } => {
                let caller = Self::current_player(clients, addr).await;
                match service.set_wallet_address(caller, &address).await {
                    Ok(()) => {
                        let _ = out.send(ServerMessage::WalletUpdated).await;
                    }
                    Err(e) => Self::send_record_error(out, e).await,
                }
            }
            ClientMessage::Ping { timestamp } => {
                let _ = out.send(ServerMessage::Pong {
                    timestamp,
                    server_time: unix_millis(),
                }).await;
            }
        }
    }

    /// Validate a token and bind the identity to the connection.
    async fn handle_auth(
        addr: SocketAddr,
        request: AuthRequest,
        clients: &Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        auth: &AuthConfig,
        config: &ServerConfig,
        out: &mpsc::Sender<ServerMessage>,
    ) {
        match validate_token(&request.token, auth) {
            Ok(claims) => {
                let player_id = claims.player_id();

                if let Some(client) = clients.write().await.get_mut(&addr) {
                    client.player_id = Some(player_id);
                }

                let _ = out.send(ServerMessage::AuthResult(AuthResult {
                    success: true,
                    player_id: Some(player_id.to_uuid_string()),
                    error: None,
                    server_version: config.version.clone(),
                })).await;

                debug!(
                    "Client {} authenticated as {}",
                    addr,
                    hex::encode(&player_id.as_bytes()[..4])
                );
            }
            Err(e) => {
                warn!("Auth failed for {}: {}", addr, e);

                let _ = out.send(ServerMessage::AuthResult(AuthResult {
                    success: false,
                    player_id: None,
                    error: Some(e.to_string()),
                    server_version: config.version.clone(),
                })).await;

                let _ = out.send(ServerMessage::Error(ErrorReply {
                    code: auth_error_code(&e),
                    message: e.to_string(),
                })).await;
            }
        }
    }

    /// Look up the authenticated identity for a connection.
    async fn current_player(
        clients: &Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        addr: SocketAddr,
    ) -> Option<PlayerId> {
        clients.read().await.get(&addr).and_then(|c| c.player_id)
    }

    /// Send a record error as a protocol error reply.
    async fn send_record_error(out: &mpsc::Sender<ServerMessage>, error: RecordError) {
        let _ = out.send(ServerMessage::Error(ErrorReply {
            code: record_error_code(&error),
            message: error.to_string(),
        })).await;
    }

    /// Periodically drop connections that have gone quiet.
    ///
    /// Expired entries leave the registry under one write lock; the
    /// shutdown notices go out only after the lock is released.
    async fn sweep_idle_connections(
        clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        idle_timeout: Duration,
    ) {
        let mut ticker = interval(Duration::from_secs(60));

        loop {
            ticker.tick().await;

            let now = Instant::now();
            let dropped: Vec<(SocketAddr, mpsc::Sender<ServerMessage>)> = {
                let mut clients = clients.write().await;
                let expired: Vec<SocketAddr> = clients
                    .iter()
                    .filter(|(_, c)| now.duration_since(c.last_activity) > idle_timeout)
                    .map(|(addr, _)| *addr)
                    .collect();
                expired
                    .into_iter()
                    .filter_map(|addr| clients.remove(&addr).map(|c| (addr, c.sender)))
                    .collect()
            };

            for (addr, sender) in dropped {
                let _ = sender
                    .send(ServerMessage::Shutdown {
                        reason: "Idle timeout".to_string(),
                    })
                    .await;
                info!("Dropped idle connection {}", addr);
            }
        }
    }

    /// Signal every task to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

/// Map a record error to its wire code.
fn record_error_code(error: &RecordError) -> ErrorCode {
    match error {
        RecordError::NotAuthenticated => ErrorCode::NotAuthenticated,
        RecordError::ProfileNotFound => ErrorCode::ProfileNotFound,
        RecordError::EmptyField(_) => ErrorCode::InvalidInput,
    }
}

/// Map an auth error to its wire code.
fn auth_error_code(error: &AuthError) -> ErrorCode {
    match error {
        AuthError::Expired => ErrorCode::TokenExpired,
        AuthError::NotConfigured => ErrorCode::AuthFailed,
        AuthError::InvalidFormat
        | AuthError::InvalidSignature
        | AuthError::InvalidIssuer
        | AuthError::InvalidAudience
        | AuthError::MissingClaim(_)
        | AuthError::DecodeError(_) => ErrorCode::InvalidToken,
    }
}

/// Server wall clock in Unix milliseconds.
fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
