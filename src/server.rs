use log::{debug, info, warn};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

use crate::browser;
use crate::config::ServerConfig;
use crate::log_error;
use crate::router::handle_connection;

/// A bound listener plus the configuration every connection is served with.
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr())?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// The address actually bound, with the OS-assigned port when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accepts connections forever, one thread per connection.
    pub fn run(self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let config = Arc::clone(&self.config);

            thread::spawn(move || {
                let peer = stream
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "unknown peer".to_string());
                debug!("New connection from {}", peer);
                if let Err(e) = handle_connection(stream, &config) {
                    log_error!(e, format!("Error handling connection from {}", peer));
                }
            });
        }

        Ok(())
    }
}

pub fn start_server(config: ServerConfig) -> io::Result<()> {
    let server = Server::bind(config)?;
    let addr = server.local_addr()?;
    let config = server.config();

    info!("Server started on port {}", addr.port());
    info!("Serving directory: {}", config.root.display());
    if let Some(pattern) = &config.proxy_match {
        info!("Proxying {} to {}", pattern, config.proxy_target);
    }

    if config.open_browser {
        browser::open(&browser::local_url(&config.host, addr.port()));
    }

    server.run()
}
