//! One-shot HTTP server standing in for the messages endpoint in tests.
//!
//! Only depends on std so integration tests can include it by path.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

pub struct StubServer {
    pub base_url: String,
    handle: thread::JoinHandle<String>,
}

impl StubServer {
    /// Accepts one connection, answers it with `status_line` and a JSON
    /// `body`, and keeps the raw request for [`StubServer::request`].
    pub fn start(status_line: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept should succeed");
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                let read = reader.read_line(&mut line).expect("read header line");
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().expect("content length");
                }
                let done = read == 0 || line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).expect("read body");
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            format!("{head}{}", String::from_utf8_lossy(&request_body))
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// The raw request the server received, headers included.
    pub fn request(self) -> String {
        self.handle.join().expect("stub server thread should join")
    }
}
