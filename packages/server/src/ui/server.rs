//! Server wiring and execution.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use codeduel_shared::time::{Clock, SystemClock};
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{ConnectionRegistry, CredentialVerifier, ProblemCatalog, RoomRepository},
    infrastructure::{
        connection_registry::WebSocketConnectionRegistry, repository::InMemoryRoomRepository,
    },
    usecase::{
        CleanupSweep, CreateRoomUseCase, GameClock, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LaunchGameUseCase, MembershipCoordinator, SessionProtocol,
    },
};

use super::{
    handler::{
        create_room, get_room_detail, get_rooms, health_check, join_room, launch_game, leave_room,
        submit_progress, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Code duel room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(&config, verifier, catalog);
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    /// ConnectionRegistry（シャットダウン時に破棄する）
    registry: Arc<dyn ConnectionRegistry>,
    game_clock: Arc<GameClock>,
    cleanup: Arc<CleanupSweep>,
}

impl Server {
    /// Wire the in-memory store, the connection registry and the use cases.
    pub fn new(
        config: &ServerConfig,
        verifier: Arc<dyn CredentialVerifier>,
        catalog: Arc<dyn ProblemCatalog>,
    ) -> Self {
        let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        Self::with_repository(config, repository, verifier, catalog)
    }

    pub fn with_repository(
        config: &ServerConfig,
        repository: Arc<dyn RoomRepository>,
        verifier: Arc<dyn CredentialVerifier>,
        catalog: Arc<dyn ProblemCatalog>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(WebSocketConnectionRegistry::new());

        let membership = Arc::new(MembershipCoordinator::new(repository.clone()));
        let game_clock = Arc::new(GameClock::new(
            registry.clone(),
            clock.clone(),
            config.game_tick,
        ));
        let session_protocol = Arc::new(SessionProtocol::new(
            registry.clone(),
            verifier.clone(),
            membership.clone(),
            clock.clone(),
        ));
        let state = Arc::new(AppState {
            session_protocol,
            game_clock: game_clock.clone(),
            verifier,
            create_room_usecase: Arc::new(CreateRoomUseCase::new(repository.clone(), clock)),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                repository.clone(),
                registry.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(repository.clone(), membership)),
            launch_game_usecase: Arc::new(LaunchGameUseCase::new(
                repository.clone(),
                catalog,
                game_clock.clone(),
            )),
        });
        let cleanup = Arc::new(CleanupSweep::new(repository, registry.clone()));

        Self {
            config: config.clone(),
            state,
            registry,
            game_clock,
            cleanup,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/{room_id}/join", post(join_room))
            .route("/api/rooms/{room_id}/leave", post(leave_room))
            .route("/api/rooms/{room_id}/launch", post(launch_game))
            .route("/api/rooms/{room_id}/progress", post(submit_progress))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Code duel server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?room=<room id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The cleanup sweep runs for the lifetime of the server. On shutdown,
    /// game tickers and the sweep are stopped and every connection is dropped.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_cleanup, cleanup_stop_rx) = oneshot::channel();
        let cleanup_task = self
            .cleanup
            .clone()
            .spawn(self.config.cleanup_interval, cleanup_stop_rx);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        let _ = stop_cleanup.send(());
        if let Err(e) = cleanup_task.await {
            tracing::warn!("Cleanup task ended abnormally: {}", e);
        }
        let games = self.game_clock.stop_all().await;
        let connections = self.registry.drain().await;
        tracing::info!(
            "Server shutdown complete ({} games stopped, {} connections closed)",
            games,
            connections
        );
        result
    }
}
