//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use site_edge::{EdgeConfig, HttpServer, HyperUpstream, KvAssetStore, Shutdown};

/// Start a mock upstream that answers every request with `status_line`,
/// the given extra header lines, and a body echoing the request head it
/// received.
#[allow(dead_code)]
pub async fn start_echo_upstream(status_line: &'static str, headers: &'static [&'static str]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;

                        let mut response = format!("HTTP/1.1 {}\r\n", status_line);
                        for line in headers {
                            response.push_str(line);
                            response.push_str("\r\n");
                        }
                        response.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            head.len(),
                            head
                        ));

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock upstream that answers every request with a fixed response.
#[allow(dead_code)]
pub async fn start_fixed_upstream(
    status_line: &'static str,
    headers: &'static [&'static str],
    body: &'static [u8],
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_head(&mut socket).await;

                let mut response = format!("HTTP/1.1 {}\r\n", status_line);
                for line in headers {
                    response.push_str(line);
                    response.push_str("\r\n");
                }
                response.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config whose mirrored prefix points at `upstream`.
#[allow(dead_code)]
pub fn mirror_config(upstream: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.proxy.path_prefix = format!("/{}/", upstream);
    config
}

/// Run the edge server on an ephemeral port over the files in `root`.
pub async fn start_edge(config: EdgeConfig, root: &Path) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = KvAssetStore::from_dir(root);
    let server = HttpServer::new(config, store, HyperUpstream::new());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
