//! A scripted stand-in for an Ollama server.
//!
//! Binds `127.0.0.1:0`, answers every connection with the same [`Reply`]
//! and records each request body so tests can inspect the prompt.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nunu_core::{MemoryStore, NunuConfig};
use nunu_engine::Engine;
use nunu_llm::LlmClient;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the mock answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with these body pieces, written one at a time.
    Stream(Vec<String>),
    /// A non-success status with a plain body.
    Status(u16, String),
    /// Accept the request, then never answer.
    Hang,
}

/// Running mock server.
pub struct MockOllama {
    pub base_url: String,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockOllama {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else { break };
                let reply = reply.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    serve(socket, reply, seen).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Request bodies received so far.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().clone()
    }

    /// Prompt of the most recent request.
    pub fn last_prompt(&self) -> String {
        self.requests()
            .last()
            .and_then(|body| body["prompt"].as_str().map(str::to_string))
            .expect("no request recorded")
    }
}

async fn serve(mut socket: TcpStream, reply: Reply, seen: Arc<Mutex<Vec<serde_json::Value>>>) {
    let Some(body) = read_request(&mut socket).await else { return };
    if let Ok(json) = serde_json::from_slice(&body) {
        seen.lock().push(json);
    }

    match reply {
        Reply::Stream(pieces) => {
            let head = "HTTP/1.1 200 OK\r\n\
                        Content-Type: application/x-ndjson\r\n\
                        Connection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for piece in pieces {
                if socket.write_all(piece.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            let _ = socket.shutdown().await;
        }
        Reply::Status(code, text) => {
            let head = format!(
                "HTTP/1.1 {code} Oops\r\n\
                 Content-Type: text/plain\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n",
                text.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(text.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

/// Read headers and a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(buf[header_end..].to_vec())
}

/// One NDJSON frame carrying `text`.
pub fn frame(text: &str) -> String {
    format!("{}\n", serde_json::json!({ "response": text, "done": false }))
}

/// The closing frame.
pub fn done() -> String {
    "{\"response\":\"\",\"done\":true}\n".to_string()
}

/// Config pointing at `base_url` with all files under `dir`.
pub fn config_for(dir: &Path, base_url: &str) -> NunuConfig {
    let mut config = NunuConfig::default();
    config.llm.base_url = base_url.to_string();
    config.llm.request_timeout_ms = 5_000;
    config.memory.path = dir.join("memory.json");
    config.composer.output_dir = dir.join("songs");
    config.persona.text = "You are Nunu, the Soul Weeper.".to_string();
    config
}

/// Engine wired to `base_url` with an empty store.
pub fn engine_for(dir: &Path, base_url: &str) -> Engine {
    let config = config_for(dir, base_url);
    let llm = LlmClient::ollama(config.llm.base_url.clone(), config.llm.model.clone());
    Engine::new(config, llm, MemoryStore::new())
}
