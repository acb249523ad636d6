#![allow(dead_code)]

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::redirect::Policy;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::thread;

use static_server::{Server, ServerConfig};
use tempfile::TempDir;

/// A running server on an ephemeral port, serving a temporary directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    client: Client,
}

impl TestServer {
    /// Starts a server over a fresh root populated by `setup`.
    pub fn start(setup: impl FnOnce(&Path)) -> Self {
        Self::start_with(setup, |config| config)
    }

    pub fn start_with(
        setup: impl FnOnce(&Path),
        configure: impl FnOnce(ServerConfig) -> ServerConfig,
    ) -> Self {
        let root = tempfile::tempdir().unwrap();
        setup(root.path());

        let mut config = ServerConfig::new(root.path()).unwrap();
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        let server = Server::bind(configure(config)).unwrap();
        let addr = server.local_addr().unwrap();
        thread::spawn(move || server.run());

        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        Self { addr, root, client }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    /// Sends `raw` as-is over a fresh connection and returns everything the server writes back.
    pub fn raw(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }
}

/// A small site: a page with an index, a compressible stylesheet, and a directory to list.
pub fn sample_site(root: &Path) {
    fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
    fs::create_dir_all(root.join("assets/img")).unwrap();
    fs::write(
        root.join("assets/site.css"),
        "body { margin: 0; padding: 0; }\n".repeat(64),
    )
    .unwrap();
    fs::write(root.join("assets/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
    fs::create_dir(root.join("blog")).unwrap();
    fs::write(root.join("blog/index.html"), "<h1>blog</h1>").unwrap();
}

/// An upstream that answers every connection with `response` and hands back each request head
/// it saw on the returned channel.
pub fn spawn_upstream(
    response: &'static str,
) -> (SocketAddr, std::sync::mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let _ = tx.send(head);
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (addr, rx)
}

/// An address with nothing listening on it.
pub fn closed_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
}
