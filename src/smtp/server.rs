//! SMTP server: accepts connections and runs a session for each

use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::smtp::config::SessionConfig;
use crate::smtp::error::SmtpError;
use crate::smtp::session::SmtpSession;
use crate::smtp::shutdown::{SessionTracker, ShutdownSignal};

/// How long the accept loop sleeps between polls when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop plus the state shared with its sessions
#[derive(Debug, Clone)]
pub struct SmtpServer {
    config: Arc<SessionConfig>,
    shutdown: ShutdownSignal,
    tracker: SessionTracker,
}

impl SmtpServer {
    /// Create a new SMTP server with default settings
    pub fn new(hostname: &str) -> Self {
        Self::with_config(SessionConfig::new(hostname))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownSignal::new(),
            tracker: SessionTracker::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn tracker(&self) -> SessionTracker {
        self.tracker.clone()
    }

    /// Bind `addr` and serve until [`stop`](Self::stop) is called (blocking)
    pub fn start(&self, addr: &str) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(addr)?;
        self.start_with_listener(listener)
    }

    /// Serve on an existing listener until [`stop`](Self::stop) is called
    /// (blocking)
    pub fn start_with_listener(&self, listener: TcpListener) -> Result<(), SmtpError> {
        listener.set_nonblocking(true)?;
        info!("SMTP server listening on {}", listener.local_addr()?);

        while !self.shutdown.is_raised() {
            match listener.accept() {
                Ok((stream, _)) => {
                    if let Err(e) = self.spawn_session(stream) {
                        warn!("Error starting session: {e}");
                    }
                }
                Err(e) => pause_after_accept_error(&e),
            }
        }

        info!("SMTP server stopped accepting connections");
        Ok(())
    }

    /// Raise the shutdown signal and wait for every session to finish
    pub fn stop(&self) {
        self.shutdown.raise();
        self.tracker.wait_idle();
    }

    fn spawn_session(&self, stream: TcpStream) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        let session = SmtpSession::new(
            stream,
            Arc::clone(&self.config),
            self.shutdown.clone(),
            &self.tracker,
        );

        thread::Builder::new()
            .name("smtp-session".to_owned())
            .spawn(move || session.run())?;
        Ok(())
    }
}

/// Sleep one poll interval after a failed accept. Anything but an empty
/// backlog is logged first.
fn pause_after_accept_error(err: &io::Error) {
    if err.kind() != io::ErrorKind::WouldBlock {
        warn!("Error accepting connection: {err}");
    }
    thread::sleep(ACCEPT_POLL_INTERVAL);
}
