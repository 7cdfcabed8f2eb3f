//! Remote side of an update: finding the latest release and downloading its
//! source archive.

pub mod fetcher;
pub mod locator;

pub use fetcher::{ArchiveFetcher, HttpArchiveFetcher};
pub use locator::{GithubReleaseLocator, Release, ReleaseLocator};

use std::time::Duration;

/// Build a `ureq` agent, optionally bounded by a global request timeout.
pub(crate) fn http_agent(timeout: Option<Duration>) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(timeout)
        .build();
    ureq::Agent::new_with_config(config)
}

/// HTTP status carried by a `ureq` error, if the server answered at all.
pub(crate) fn error_status(err: &ureq::Error) -> Option<u16> {
    match err {
        ureq::Error::StatusCode(code) => Some(*code),
        _ => None,
    }
}

/// One-shot HTTP server on the loopback interface for exercising the real
/// `ureq` clients.
#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `response` verbatim to the first connection and return the base
    /// URL to reach it.
    pub fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        });

        format!("http://{}", addr)
    }

    pub fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }
}
