use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::app::Application;
use crate::config::{Config, Limits};
use crate::http::connection::Connection;

/// Accepts connections and serves each one on its own task.
///
/// The accept loop owns the set of live connection tasks; when the server
/// stops, every connection still in flight is aborted.
pub struct Server {
    listener: TcpListener,
    app: Arc<Application>,
    limits: Limits,
    running: Arc<AtomicBool>,
}

impl Server {
    pub async fn bind(addr: &str, app: Application, limits: Limits) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            app: Arc::new(app),
            limits,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub async fn from_config(cfg: &Config, app: Application) -> anyhow::Result<Self> {
        Self::bind(&cfg.server.listen_addr, app, cfg.limits()).await
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Whether the accept loop is currently running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A handle that reports [`Server::running`] after the server has been
    /// moved into its serving task.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes or the listener fails, then aborts
    /// all live connections.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut connections = JoinSet::new();
        self.running.store(true, Ordering::SeqCst);

        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down, closing {} connection(s)", connections.len());
                    break Ok(());
                }

                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => match accept_retry_delay(&e) {
                            Some(delay) => {
                                warn!(error = %e, retry_in = ?delay, "Failed to accept connection");
                                if !delay.is_zero() {
                                    tokio::time::sleep(delay).await;
                                }
                                continue;
                            }
                            None => break Err(e.into()),
                        },
                    };
                    debug!("Accepted connection from {}", peer);

                    let app = Arc::clone(&self.app);
                    let limits = self.limits;
                    connections.spawn(async move {
                        let mut conn = Connection::new(socket, peer.to_string(), app, limits);
                        if let Err(e) = conn.run().await {
                            debug!("Connection error from {}: {:#}", peer, e);
                        }
                    });
                }

                // Reap finished connections so the set only holds live ones.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        };

        self.running.store(false, Ordering::SeqCst);
        connections.shutdown().await;
        result
    }
}

/// Pause before accepting again after running out of file descriptors.
const FD_EXHAUSTED_BACKOFF: Duration = Duration::from_millis(100);

const EMFILE: i32 = 24;
const ENFILE: i32 = 23;

/// How long to wait before accepting again after `e`, or `None` if the
/// listener itself is broken.
///
/// A pending connection stays in the backlog while descriptors are
/// exhausted (EMFILE/ENFILE), so retrying at once would fail again at once.
fn accept_retry_delay(e: &std::io::Error) -> Option<Duration> {
    use std::io::ErrorKind::*;

    if e.raw_os_error().is_some_and(|code| code == EMFILE || code == ENFILE) {
        return Some(FD_EXHAUSTED_BACKOFF);
    }

    match e.kind() {
        ConnectionAborted | ConnectionReset | ConnectionRefused | Interrupted | WouldBlock => {
            Some(Duration::ZERO)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn fd_exhaustion_backs_off() {
        let emfile = io::Error::from_raw_os_error(EMFILE);
        let enfile = io::Error::from_raw_os_error(ENFILE);

        assert_eq!(accept_retry_delay(&emfile), Some(FD_EXHAUSTED_BACKOFF));
        assert_eq!(accept_retry_delay(&enfile), Some(FD_EXHAUSTED_BACKOFF));
    }

    #[test]
    fn per_connection_errors_retry_immediately() {
        for kind in [
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::Interrupted,
        ] {
            assert_eq!(accept_retry_delay(&io::Error::from(kind)), Some(Duration::ZERO));
        }
    }

    #[test]
    fn listener_failures_are_fatal() {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "bad socket");
        assert_eq!(accept_retry_delay(&err), None);
    }
}
