//! Throwaway HTTP responder for client tests.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
  pub head: String,
  pub body: String,
}

impl RecordedRequest {
  /// e.g. "GET /products/my-shop?page=1 HTTP/1.1"
  pub fn request_line(&self) -> &str {
    self.head.lines().next().unwrap_or_default()
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.head.lines().skip(1).find_map(|line| {
      let (key, value) = line.split_once(':')?;
      key
        .trim()
        .eq_ignore_ascii_case(name)
        .then(|| value.trim())
    })
  }
}

pub(crate) struct TestServer {
  pub base_url: String,
  requests: Arc<Mutex<Vec<RecordedRequest>>>,
  handle: JoinHandle<()>,
}

impl TestServer {
  pub fn requests(&self) -> Vec<RecordedRequest> {
    self.requests.lock().unwrap().clone()
  }
}

impl Drop for TestServer {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Serve the canned `(status, body)` responses in order, one per
/// connection; the last one repeats.
pub(crate) async fn serve(responses: Vec<(u16, &'static str)>) -> TestServer {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let requests = Arc::new(Mutex::new(Vec::new()));
  let recorded = Arc::clone(&requests);

  let handle = tokio::spawn(async move {
    let mut index = 0usize;
    while let Ok((mut stream, _)) = listener.accept().await {
      let (status, body) = responses[index.min(responses.len() - 1)];
      index += 1;

      if let Some(request) = read_request(&mut stream).await {
        recorded.lock().unwrap().push(request);
      }

      let response = format!(
        "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      let _ = stream.write_all(response.as_bytes()).await;
      let _ = stream.shutdown().await;
    }
  });

  TestServer {
    base_url: format!("http://{}/", addr),
    requests,
    handle,
  }
}

/// An address nothing listens on.
pub(crate) async fn closed_base_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}/", addr)
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 1024];

  let head_end = loop {
    let n = stream.read(&mut chunk).await.ok()?;
    if n == 0 {
      return None;
    }
    buf.extend_from_slice(&chunk[..n]);
    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
      break pos + 4;
    }
  };

  let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
  let content_length = head
    .lines()
    .filter_map(|line| line.split_once(':'))
    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
    .unwrap_or(0);

  while buf.len() < head_end + content_length {
    let n = stream.read(&mut chunk).await.ok()?;
    if n == 0 {
      break;
    }
    buf.extend_from_slice(&chunk[..n]);
  }

  let end = buf.len().min(head_end + content_length);
  Some(RecordedRequest {
    head,
    body: String::from_utf8_lossy(&buf[head_end..end]).to_string(),
  })
}
