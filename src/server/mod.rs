//! The embedded HTTP server that streams log records to the dashboard.
//!
//! The server owns a small tokio runtime so the logger can start and stop it
//! from plain threads as well as from async code.
mod queue;
mod routes;
mod stream;

pub use queue::OutboundQueue;
pub use routes::Route;
pub use stream::{StreamEvent, DEFAULT_KEEPALIVE_INTERVAL};

use crate::channel::{ChannelState, LogChannel};
use crate::error::ChannelError;
use routes::{router, ViewerState};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How long `stop` waits for the accept loop to release the listener.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// A started accept loop and the handles needed to stop it.
struct RunningServer {
    shutdown: watch::Sender<bool>,
    finished: std_mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

/// The log viewer: an HTTP server with a live event stream.
pub struct ViewerServer {
    port: u16,
    keepalive_interval: Duration,
    queue: Arc<OutboundQueue>,
    state: Arc<AtomicU8>,
    bound_port: Arc<AtomicU16>,
    running: Mutex<Option<RunningServer>>,
    runtime: Option<Runtime>,
}

impl ViewerServer {
    /// Creates a stopped server for `port`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server's runtime cannot be created.
    pub fn new(port: u16) -> Result<Self, ChannelError> {
        Self::with_keepalive(port, DEFAULT_KEEPALIVE_INTERVAL)
    }

    /// Creates a stopped server with a custom idle keepalive interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the server's runtime cannot be created.
    pub fn with_keepalive(port: u16, keepalive_interval: Duration) -> Result<Self, ChannelError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("log-viewer")
            .enable_all()
            .build()
            .map_err(ChannelError::Runtime)?;

        Ok(Self {
            port,
            keepalive_interval,
            queue: Arc::new(OutboundQueue::new()),
            state: Arc::new(AtomicU8::new(ChannelState::Stopped as u8)),
            bound_port: Arc::new(AtomicU16::new(0)),
            running: Mutex::new(None),
            runtime: Some(runtime),
        })
    }

    /// The queue live streams are fed from.
    pub fn queue(&self) -> &Arc<OutboundQueue> {
        &self.queue
    }

    fn set_state(&self, state: ChannelState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningServer>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the loopback listener inside the server runtime.
    fn bind(&self, runtime: &Runtime) -> Result<TcpListener, ChannelError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let bind_error = |source| ChannelError::Bind {
            port: self.port,
            source,
        };

        let _guard = runtime.enter();
        let socket = TcpSocket::new_v4().map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        socket.listen(1024).map_err(bind_error)
    }

    /// Signals the accept loop to stop and waits for it to let go of the
    /// listener, aborting it if it does not finish in time.
    fn shut_down(running: RunningServer) {
        let _ = running.shutdown.send(true);
        if running.finished.recv_timeout(STOP_TIMEOUT).is_err() {
            warn!("Log viewer did not stop in time, aborting accept loop");
            running.task.abort();
        }
    }
}

impl LogChannel for ViewerServer {
    fn start(&self) -> Result<(), ChannelError> {
        let mut running = self.lock_running();
        if running.is_some() && self.state() == ChannelState::Running {
            return Ok(());
        }
        if let Some(stale) = running.take() {
            Self::shut_down(stale);
        }

        let Some(runtime) = self.runtime.as_ref() else {
            return Err(ChannelError::NotRunning);
        };

        self.set_state(ChannelState::Starting);
        let listener = match self.bind(runtime) {
            Ok(listener) => listener,
            Err(e) => {
                self.set_state(ChannelState::Stopped);
                return Err(e);
            }
        };
        let local_port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.bound_port.store(local_port, Ordering::SeqCst);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (finished_tx, finished_rx) = std_mpsc::channel();
        let app = router(ViewerState {
            queue: self.queue.clone(),
            shutdown: shutdown_rx.clone(),
            keepalive_interval: self.keepalive_interval,
        });

        self.set_state(ChannelState::Running);
        let state = self.state.clone();
        let task = runtime.spawn(async move {
            let mut shutdown = shutdown_rx;
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    while !*shutdown.borrow() {
                        if shutdown.changed().await.is_err() {
                            break;
                        }
                    }
                })
                .await;

            if let Err(e) = result {
                error!(error = %e, "Log viewer server failed");
            }
            state.store(ChannelState::Stopped as u8, Ordering::SeqCst);
            let _ = finished_tx.send(());
        });

        *running = Some(RunningServer {
            shutdown: shutdown_tx,
            finished: finished_rx,
            task,
        });
        info!("Log viewer started at http://localhost:{}/", local_port);
        Ok(())
    }

    fn stop(&self) {
        let mut running = self.lock_running();
        let Some(server) = running.take() else {
            return;
        };

        self.set_state(ChannelState::Stopped);
        Self::shut_down(server);
        self.bound_port.store(0, Ordering::SeqCst);
        info!("Log viewer server stopped");
    }

    fn add_log_entry(&self, payload: String) -> Result<(), ChannelError> {
        if self.state() != ChannelState::Running {
            return Err(ChannelError::NotRunning);
        }
        self.queue.push(payload);
        Ok(())
    }

    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn local_port(&self) -> Option<u16> {
        match self.bound_port.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }
}

impl Drop for ViewerServer {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            debug!("Shutting down log viewer runtime");
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let server = ViewerServer::new(0).unwrap();
        assert_eq!(server.state(), ChannelState::Stopped);
        assert!(server.add_log_entry("x".to_string()).is_err());

        server.start().unwrap();
        assert_eq!(server.state(), ChannelState::Running);
        assert!(server.local_port().is_some());
        server.add_log_entry("x".to_string()).unwrap();
        assert_eq!(server.queue().len(), 1);

        server.stop();
        assert_eq!(server.state(), ChannelState::Stopped);
        assert!(server.local_port().is_none());
        assert!(matches!(
            server.add_log_entry("y".to_string()),
            Err(ChannelError::NotRunning)
        ));

        // stopping twice is harmless
        server.stop();
    }

    #[test]
    fn test_bind_conflict_leaves_server_stopped() {
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        let server = ViewerServer::new(port).unwrap();
        let err = server.start().unwrap_err();
        assert!(matches!(err, ChannelError::Bind { port: p, .. } if p == port));
        assert_eq!(server.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_restart_rebinds_same_port() {
        let server = ViewerServer::new(0).unwrap();
        server.start().unwrap();
        let port = server.local_port().unwrap();
        server.stop();

        let again = ViewerServer::new(port).unwrap();
        again.start().unwrap();
        assert_eq!(again.local_port(), Some(port));
    }

    #[tokio::test]
    async fn test_can_be_dropped_inside_async_context() {
        let server = ViewerServer::new(0).unwrap();
        server.start().unwrap();
        drop(server);
    }
}
