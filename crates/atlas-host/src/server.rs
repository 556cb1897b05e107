use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::router::build_router;
use crate::session::ViewerSession;

/// HTTP front end for one [`ViewerSession`].
pub struct ViewerServer {
    session: Arc<ViewerSession>,
}

impl ViewerServer {
    pub fn new(session: Arc<ViewerSession>) -> Self {
        Self { session }
    }

    pub fn config(&self) -> &HostConfig {
        self.session.config()
    }

    pub fn session(&self) -> &Arc<ViewerSession> {
        &self.session
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.session.clone())
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn serve(self) -> HostResult<()> {
        let addr = self.config().bind_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, namespace = %self.config().namespace, "viewer host listening");
        self.serve_on(listener).await
    }

    pub async fn serve_on(self, listener: TcpListener) -> HostResult<()> {
        axum::serve(listener, self.router())
            .await
            .map_err(|e| HostError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = ViewerServer::new(ViewerSession::new(HostConfig::default()));
        assert_eq!(server.config().bind_addr.port(), 8741);
        let _router = server.router();
    }

    #[tokio::test]
    async fn serves_health_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ViewerServer::new(ViewerSession::new(HostConfig::default()));
        tokio::spawn(server.serve_on(listener));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream
            .write_all(b"GET /v1/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
    }
}
