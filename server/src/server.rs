//! HTTP/1 serving loop on tokio and hyper

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::error::{TrellisError, TrellisResult};
use crate::response::Reply;

impl App {
    /// Start the server and listen for connections until the process exits
    pub async fn listen(self) -> TrellisResult<()> {
        self.listen_with_shutdown(std::future::pending()).await
    }

    /// Start the server; stop accepting connections once `signal` resolves
    pub async fn listen_with_shutdown<F>(self, signal: F) -> TrellisResult<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.config().socket_addr();
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| TrellisError::Http(format!("Invalid address '{}': {}", addr, e)))?;

        let listener = TcpListener::bind(socket_addr).await?;
        self.serve(listener, signal).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> TrellisResult<()>
    where
        F: Future<Output = ()>,
    {
        info!("🚀 Trellis listening on http://{}", listener.local_addr()?);
        info!("📊 Router contains {} routes", self.router().len());

        let app = Arc::new(self);
        tokio::pin!(signal);

        loop {
            let (stream, remote_addr) = tokio::select! {
                _ = &mut signal => {
                    info!("🛑 Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        error!("Failed to accept connection: {}", err);
                        continue;
                    }
                },
            };

            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move { Ok::<_, Infallible>(app.handle_incoming(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(%remote_addr, "Error serving connection: {:?}", err);
                }
            });
        }
    }

    /// Collect the body within the size limit, then dispatch within the timeout
    async fn handle_incoming(&self, req: http::Request<Incoming>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();

        let body = match Limited::new(body, self.config().max_request_body_size)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                debug!(path = parts.uri.path(), "request body over limit");
                return Reply::status_text(StatusCode::PAYLOAD_TOO_LARGE).into_response();
            }
            Err(err) => {
                warn!("Failed to read request body: {}", err);
                return Reply::status_text(StatusCode::BAD_REQUEST).into_response();
            }
        };

        let request = http::Request::from_parts(parts, body);
        let timeout = self.config().request_timeout;
        match tokio::time::timeout(timeout, self.dispatch(request)).await {
            Ok(response) => response,
            Err(_) => {
                let err = TrellisError::Timeout(format!("request exceeded {:?}", timeout));
                warn!("{}", err);
                Reply::status_text(StatusCode::GATEWAY_TIMEOUT).into_response()
            }
        }
    }
}
