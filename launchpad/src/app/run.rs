//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::deploy::controller::SessionController;
use crate::deploy::phase::Phase;
use crate::deploy::session::SessionSnapshot;
use crate::errors::LaunchpadError;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::stream::connection::ConnectionManager;
use crate::stream::socket;

/// Run launchpad as a long-lived service until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), LaunchpadError> {
    info!("Initializing launchpad...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start launchpad: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

/// Submit one repository and follow it until the deployment ends.
///
/// `on_update` sees every published snapshot. Returns the terminal phase.
pub async fn deploy<F>(
    options: AppOptions,
    repo_url: String,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
    mut on_update: F,
) -> Result<Phase, LaunchpadError>
where
    F: FnMut(&SessionSnapshot),
{
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let app_state = match init(&options, &shutdown_tx, &mut shutdown_manager).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start launchpad: {}", e);
            shutdown_manager.shutdown().await?;
            return Err(e);
        }
    };

    let outcome = tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, abandoning deployment...");
            Err(LaunchpadError::ShutdownError("interrupted".to_string()))
        }
        result = follow_deployment(&app_state.controller, &repo_url, &mut on_update) => result,
    };

    drop(shutdown_tx);
    shutdown_manager.shutdown().await?;
    outcome
}

/// Submit `repo_url` and report snapshots until a terminal phase
pub async fn follow_deployment<F>(
    controller: &SessionController,
    repo_url: &str,
    on_update: &mut F,
) -> Result<Phase, LaunchpadError>
where
    F: FnMut(&SessionSnapshot),
{
    let mut updates = controller.watch();

    match controller.submit_reference(repo_url).await {
        Ok(_) | Err(LaunchpadError::Deploy(_)) => {}
        Err(e) => return Err(e),
    }

    loop {
        let snapshot = updates.borrow_and_update().clone();
        on_update(&snapshot);
        if snapshot.phase.is_terminal() {
            return Ok(snapshot.phase);
        }
        updates
            .changed()
            .await
            .map_err(|e| LaunchpadError::ShutdownError(e.to_string()))?;
    }
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, LaunchpadError> {
    let app_state = Arc::new(AppState::init(options)?);
    shutdown_manager.with_app_state(app_state.clone())?;

    init_stream_worker(
        options.stream.clone(),
        app_state.connection.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    if options.enable_server {
        init_server(options, app_state.clone(), shutdown_manager, shutdown_tx.subscribe()).await?;
    }

    Ok(app_state)
}

fn init_stream_worker(
    options: socket::Options,
    connection: Arc<ConnectionManager>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), LaunchpadError> {
    info!("Initializing stream worker...");

    let stream_handle = tokio::spawn(async move {
        socket::run(
            &options,
            connection,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_stream_worker_handle(stream_handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), LaunchpadError> {
    info!("Initializing control server...");

    let server_state = ServerState::new(app_state.controller.clone(), app_state.projects.clone());

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    server_handle: Option<JoinHandle<Result<(), LaunchpadError>>>,
    stream_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            server_handle: None,
            stream_worker_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), LaunchpadError> {
        if self.app_state.is_some() {
            return Err(LaunchpadError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_stream_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), LaunchpadError> {
        if self.stream_worker_handle.is_some() {
            return Err(LaunchpadError::ShutdownError("stream_handle already set".to_string()));
        }
        self.stream_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), LaunchpadError>>,
    ) -> Result<(), LaunchpadError> {
        if self.server_handle.is_some() {
            return Err(LaunchpadError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), LaunchpadError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), LaunchpadError> {
        info!("Shutting down launchpad...");

        // Sessions first so no subscription outlives the connection
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown();
        }

        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| LaunchpadError::ShutdownError(e.to_string()))??;
        }

        if let Some(handle) = self.stream_worker_handle.take() {
            handle.await.map_err(|e| LaunchpadError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
