//! Minimal blocking HTTP stub serving canned JSON responses in order.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Canned response: status line (for example `200 OK`) and JSON body.
pub type CannedResponse = (&'static str, String);

/// Running stub; joining it yields the request lines it served.
pub struct HttpStub {
    pub base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl HttpStub {
    /// Serves each response to one connection, then stops listening.
    pub fn serve(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .unwrap_or_else(|err| panic!("bind stub listener: {err}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|err| panic!("stub listener addr: {err}"));
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status_line, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                let mut request = Vec::new();
                let mut chunk = [0_u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => {
                            request.extend_from_slice(chunk.get(..read).unwrap_or_default());
                        }
                    }
                }
                let text = String::from_utf8_lossy(&request);
                seen.push(text.lines().next().unwrap_or_default().to_owned());
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).ok();
                stream.flush().ok();
            }
            seen
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Waits for the stub to finish and returns the request lines served.
    pub fn requests(self) -> Vec<String> {
        self.handle
            .join()
            .unwrap_or_else(|_| panic!("stub thread panicked"))
    }
}
