use anyhow::Result;
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use std::{net::SocketAddr, path::PathBuf};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

pub const LIVERELOAD_PATH: &str = "/__livereload";
const RELOAD_MESSAGE: &str = "reload";

/// Configuration for the live development server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Built site to serve
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: PathBuf::from("./out"),
            open: false,
        }
    }
}

/// Tells every connected browser to reload.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<String>,
}

impl Reloader {
    /// Returns the number of pages notified.
    pub fn reload(&self) -> usize {
        match self.tx.send(RELOAD_MESSAGE.to_string()) {
            Ok(count) => {
                log::debug!("Sent reload to {} client(s)", count);
                count
            }
            // No page is connected
            Err(_) => 0,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

/// A static file server with a websocket live-reload channel
pub struct LiveServer {
    config: LiveServerConfig,
    reloader: Reloader,
}

impl LiveServer {
    pub fn new(config: LiveServerConfig) -> Self {
        let (tx, _) = broadcast::channel::<String>(100);
        Self {
            config,
            reloader: Reloader { tx },
        }
    }

    pub fn reloader(&self) -> Reloader {
        self.reloader.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(LIVERELOAD_PATH, get(websocket_handler))
            .fallback_service(ServeDir::new(&self.config.root))
            .with_state(self.reloader.clone())
    }

    pub async fn run(self) -> Result<()> {
        if !self.config.root.exists() {
            return Err(anyhow::anyhow!(
                "Root directory does not exist: {}",
                self.config.root.display()
            ));
        }

        let app = self.router();
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        log::info!("Serving {} at http://{}", self.config.root.display(), addr);
        log::info!("Live reload enabled at ws://{}{}", addr, LIVERELOAD_PATH);

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                log::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(reloader): State<Reloader>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_connection(socket, reloader))
}

async fn websocket_connection(mut socket: WebSocket, reloader: Reloader) {
    let mut rx = reloader.subscribe();

    if socket
        .send(Message::Text("connected".to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(reload_msg) => {
                        if socket.send(Message::Text(reload_msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}
