use std::future::IntoFuture;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::watch;

use super::handlers::AppState;
use super::routes::create_router;
use crate::config::ServerConfig;
use crate::discovery::{AdvertisementHandle, Discovery, ServiceRecord};
use crate::error::{ControlError, Result};
use crate::registry::Registry;

/// How long the runtime waits for leftover tasks after the serve loop ends.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

/// Serves the control page for a [`Registry`] on a background thread.
///
/// A server is started at most once. After [`Server::stop`] it cannot be
/// restarted; build a new one instead.
pub struct Server {
    config: ServerConfig,
    registry: Registry,
    discovery: Option<Box<dyn Discovery>>,
    lifecycle: Lifecycle,
}

enum Lifecycle {
    Created,
    Running(Worker),
    Stopped,
}

struct Worker {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    thread: JoinHandle<()>,
    advertisement: Option<AdvertisementHandle>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let registry = Registry::from_config(&config);
        Self {
            config,
            registry,
            discovery: None,
            lifecycle: Lifecycle::Created,
        }
    }

    /// Serve an existing registry instead of a fresh one.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Announce the server through `discovery` while it runs.
    pub fn with_discovery(mut self, discovery: impl Discovery + 'static) -> Self {
        self.discovery = Some(Box::new(discovery));
        self
    }

    /// Handle to the served registry; clone it to share with other threads.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.lifecycle {
            Lifecycle::Running(worker) => Some(worker.addr),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Running(_))
    }

    /// Bind the listener and start serving on a worker thread.
    ///
    /// Bind failures are returned here rather than surfacing on the worker.
    /// Returns the bound address, which carries the real port when the
    /// configured port is 0.
    pub fn start(&mut self) -> Result<SocketAddr> {
        match self.lifecycle {
            Lifecycle::Running(_) => return Err(ControlError::AlreadyStarted),
            Lifecycle::Stopped => return Err(ControlError::Stopped),
            Lifecycle::Created => {},
        }

        let listener = std::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
            .map_err(|source| ControlError::Bind {
                addr: format!("{}:{}", self.config.host, self.config.port),
                source,
            })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown, signal) = watch::channel(false);
        let router = create_router(AppState {
            registry: self.registry.clone(),
            title: self.config.title.clone(),
        });
        let grace = self.config.shutdown_grace();

        let thread = std::thread::Builder::new()
            .name("http-control".to_string())
            .spawn(move || serve(runtime, listener, router, signal, grace))?;

        crate::log_server_operation!("start", addr);
        let advertisement = self.advertise(addr);

        self.lifecycle = Lifecycle::Running(Worker {
            addr,
            shutdown,
            thread,
            advertisement,
        });
        Ok(addr)
    }

    /// Stop serving and wait for the worker thread to exit.
    ///
    /// The port is free again once this returns. Calling `stop` on a server
    /// that never started, or a second time, does nothing beyond marking it
    /// stopped.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(worker) => {
                if let Some(handle) = worker.advertisement {
                    self.withdraw(handle);
                }

                // The worker may already be gone; then there is nobody to tell.
                let _ = worker.shutdown.send(true);
                if worker.thread.join().is_err() {
                    self.registry.warn("Server worker thread panicked");
                }
                crate::log_server_operation!("stop", worker.addr);
            },
            Lifecycle::Created => {
                tracing::debug!("Server stopped before it was started");
            },
            Lifecycle::Stopped => {},
        }
    }

    fn advertise(&self, addr: SocketAddr) -> Option<AdvertisementHandle> {
        let discovery = self.discovery.as_ref()?;
        if !self.config.advertise {
            tracing::debug!("Advertising disabled by configuration");
            return None;
        }

        let record = ServiceRecord {
            name: self.config.service_name.clone(),
            address: addr.ip(),
            port: addr.port(),
        };
        match discovery.advertise(&record) {
            Ok(handle) => {
                tracing::info!(record = %record, "Advertised server");
                Some(handle)
            },
            Err(e) => {
                self.registry
                    .warn(format!("Could not advertise {}: {}", record, e));
                None
            },
        }
    }

    fn withdraw(&self, handle: AdvertisementHandle) {
        let Some(discovery) = self.discovery.as_ref() else {
            return;
        };
        let id = handle.id().to_string();
        match discovery.withdraw(handle) {
            Ok(()) => tracing::info!(handle = %id, "Withdrew advertisement"),
            Err(e) => self
                .registry
                .warn(format!("Could not withdraw advertisement {}: {}", id, e)),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread body: serve until the stop signal, then give open
/// connections `grace` to finish before dropping them.
fn serve(
    runtime: Runtime,
    listener: std::net::TcpListener,
    router: Router,
    signal: watch::Receiver<bool>,
    grace: Duration,
) {
    runtime.block_on(async move {
        let listener = match TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("Failed to register listener with the runtime: {}", e);
                return;
            },
        };

        let server = axum::serve(listener, router)
            .with_graceful_shutdown(stop_requested(signal.clone()))
            .into_future();

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    tracing::error!("Server error: {}", e);
                }
            },
            _ = async {
                stop_requested(signal).await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(grace_ms = grace.as_millis() as u64, "Dropping connections still open after shutdown grace period");
            },
        }
    });

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}

/// Resolves once `stop()` has been called or the server handle is gone.
async fn stop_requested(mut signal: watch::Receiver<bool>) {
    let _ = signal.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn local_config() -> ServerConfig {
        ServerConfig::default().with_port(0)
    }

    #[test]
    fn test_start_returns_ephemeral_port() {
        let mut server = Server::new(local_config());
        let addr = server.start().unwrap();

        assert_ne!(addr.port(), 0);
        assert!(server.is_running());
        assert_eq!(server.local_addr(), Some(addr));

        server.stop();
        assert!(!server.is_running());
        assert_eq!(server.local_addr(), None);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut server = Server::new(local_config());
        server.start().unwrap();
        assert!(matches!(server.start(), Err(ControlError::AlreadyStarted)));
    }

    #[test]
    fn test_restart_after_stop_fails() {
        let mut server = Server::new(local_config());
        server.start().unwrap();
        server.stop();
        server.stop();
        assert!(matches!(server.start(), Err(ControlError::Stopped)));
    }

    #[test]
    fn test_stop_before_start() {
        let mut server = Server::new(local_config());
        server.stop();
        assert!(matches!(server.start(), Err(ControlError::Stopped)));
    }

    #[test]
    fn test_stop_is_bounded_while_idle() {
        let mut server = Server::new(local_config());
        server.start().unwrap();

        let began = Instant::now();
        server.stop();
        assert!(began.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_registry_shared_with_server() {
        let registry = Registry::new();
        registry.register("count", 1);
        let server = Server::new(local_config()).with_registry(registry.clone());

        server.registry().register("other", 2);
        assert!(registry.contains("other"));
    }
}
