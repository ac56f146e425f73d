//! Incremental HTTP/1.x request reader.
//!
//! ```text
//!  ReadingHeaders ──[\r\n\r\n]──▶ HeadersComplete ──▶ ReadingBody ──[len ≥ Content-Length]──▶ Complete
//! ```
//!
//! Bytes are accumulated into one buffer and the request is parsed only
//! from the accumulated state, so the result does not depend on how the
//! peer split its writes. Both the header block and the declared body
//! are capped; a request that exceeds either cap, or a connection that
//! closes before the body is complete, is discarded whole. After the
//! first error the reader drops its buffer and refuses further input.

use core::fmt;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};
use std::time::Instant;

/// Bytes requested per socket read.
pub const READ_CHUNK: usize = 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 4096,
            max_body_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    /// Request target as sent, query string included.
    pub path: String,
    /// Lower-cased names; a repeated header keeps its last value.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Path without the query string.
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPhase {
    ReadingHeaders,
    HeadersComplete,
    ReadingBody,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Peer closed before the request was complete.
    ConnectionClosed(ReadPhase),
    /// No `\r\n\r\n` within the header cap.
    HeadersTooLarge,
    /// Declared `Content-Length` exceeds the body cap.
    BodyTooLarge(usize),
    /// Request line or a header could not be parsed.
    Malformed(&'static str),
    /// A socket read timed out, or the overall deadline passed.
    Timeout,
    Io(ErrorKind),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionClosed(phase) => write!(f, "connection closed while {phase:?}"),
            Self::HeadersTooLarge => write!(f, "header block too large"),
            Self::BodyTooLarge(len) => write!(f, "declared body of {len} bytes too large"),
            Self::Malformed(what) => write!(f, "malformed request: {what}"),
            Self::Timeout => write!(f, "read timed out"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for RequestError {}

struct RequestHead {
    method: String,
    path: String,
    headers: BTreeMap<String, String>,
    content_length: usize,
}

/// Streaming request decoder. Feed it bytes as they arrive.
pub struct RequestReader {
    phase: ReadPhase,
    limits: RequestLimits,
    buf: Vec<u8>,
    head: Option<RequestHead>,
    body_start: usize,
    failed: Option<RequestError>,
}

impl RequestReader {
    pub fn new(limits: RequestLimits) -> Self {
        Self {
            phase: ReadPhase::ReadingHeaders,
            limits,
            buf: Vec::with_capacity(READ_CHUNK),
            head: None,
            body_start: 0,
            failed: None,
        }
    }

    pub fn phase(&self) -> ReadPhase {
        self.phase
    }

    /// Bytes currently held. Zero once the reader has failed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append `data` and advance the state machine.
    ///
    /// Returns `Ok(Some(request))` exactly once, when the body reaches the
    /// declared length. Bytes past the body are ignored. Once an error has
    /// been returned, every later call returns the same error and `data`
    /// is not stored.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<HttpRequest>, RequestError> {
        if let Some(e) = self.failed {
            return Err(e);
        }
        if self.phase == ReadPhase::Complete {
            return Ok(None);
        }
        self.buf.extend_from_slice(data);

        let result = self.advance();
        if let Err(e) = &result {
            self.failed = Some(*e);
            self.buf = Vec::new();
        }
        result
    }

    fn advance(&mut self) -> Result<Option<HttpRequest>, RequestError> {
        loop {
            match self.phase {
                ReadPhase::ReadingHeaders => {
                    let Some(end) = find_terminator(&self.buf) else {
                        if self.buf.len() > self.limits.max_header_bytes {
                            return Err(RequestError::HeadersTooLarge);
                        }
                        return Ok(None);
                    };
                    if end > self.limits.max_header_bytes {
                        return Err(RequestError::HeadersTooLarge);
                    }
                    let head = parse_head(&self.buf[..end])?;
                    if head.content_length > self.limits.max_body_bytes {
                        return Err(RequestError::BodyTooLarge(head.content_length));
                    }
                    self.body_start = end + HEADER_TERMINATOR.len();
                    self.head = Some(head);
                    self.phase = ReadPhase::HeadersComplete;
                }
                ReadPhase::HeadersComplete => {
                    self.phase = ReadPhase::ReadingBody;
                }
                ReadPhase::ReadingBody => {
                    let Some(head) = self.head.as_ref() else {
                        return Err(RequestError::Malformed("body before headers"));
                    };
                    let have = self.buf.len() - self.body_start;
                    if have < head.content_length {
                        return Ok(None);
                    }
                    let end = self.body_start + head.content_length;
                    let body = self.buf[self.body_start..end].to_vec();
                    self.phase = ReadPhase::Complete;
                    let Some(head) = self.head.take() else {
                        return Err(RequestError::Malformed("body before headers"));
                    };
                    return Ok(Some(HttpRequest {
                        method: head.method,
                        path: head.path,
                        headers: head.headers,
                        body,
                    }));
                }
                ReadPhase::Complete => return Ok(None),
            }
        }
    }

    /// The peer closed the stream. Anything short of `Complete` is discarded.
    pub fn finish(&self) -> Result<(), RequestError> {
        if let Some(e) = self.failed {
            return Err(e);
        }
        match self.phase {
            ReadPhase::Complete => Ok(()),
            phase => Err(RequestError::ConnectionClosed(phase)),
        }
    }
}

/// Read one complete request from `stream` in [`READ_CHUNK`]-sized reads.
///
/// The deadline is checked before every read, so a peer that keeps
/// sending a few bytes at a time is cut off once it passes. A single
/// blocked read is bounded only by the stream's own read timeout.
pub fn read_request<R: Read>(
    stream: &mut R,
    limits: RequestLimits,
    deadline: Instant,
) -> Result<HttpRequest, RequestError> {
    let mut reader = RequestReader::new(limits);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if Instant::now() >= deadline {
            return Err(RequestError::Timeout);
        }
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(RequestError::Timeout);
            }
            Err(e) => return Err(RequestError::Io(e.kind())),
        };
        if n == 0 {
            reader.finish()?;
            return Err(RequestError::ConnectionClosed(reader.phase()));
        }
        if let Some(request) = reader.feed(&chunk[..n])? {
            return Ok(request);
        }
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

fn parse_head(block: &[u8]) -> Result<RequestHead, RequestError> {
    let text = core::str::from_utf8(block).map_err(|_| RequestError::Malformed("header block not UTF-8"))?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_ascii_whitespace();
    let method = parts.next().ok_or(RequestError::Malformed("empty request line"))?;
    let path = parts.next().ok_or(RequestError::Malformed("request line without target"))?;
    if let Some(version) = parts.next() {
        if !version.starts_with("HTTP/") {
            return Err(RequestError::Malformed("bad protocol version"));
        }
    }

    let mut headers = BTreeMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or(RequestError::Malformed("header without colon"))?;
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    let content_length = match headers.get("content-length") {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| RequestError::Malformed("bad Content-Length"))?,
        None => 0,
    };

    Ok(RequestHead {
        method: method.to_string(),
        path: path.to_string(),
        headers,
        content_length,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn encode(method: &str, path: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "{method} {path} HTTP/1.1\r\nHost: station\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_the_result(
            body in proptest::collection::vec(any::<u8>(), 0..512),
            cuts in proptest::collection::vec(1usize..64, 1..64),
        ) {
            let wire = encode("POST", "/save", &body);

            let mut whole = RequestReader::new(RequestLimits::default());
            let expected = whole.feed(&wire).unwrap().unwrap();

            let mut chunked = RequestReader::new(RequestLimits::default());
            let mut got = None;
            let mut rest: &[u8] = &wire;
            let mut i = 0;
            while !rest.is_empty() {
                let n = cuts[i % cuts.len()].min(rest.len());
                if let Some(req) = chunked.feed(&rest[..n]).unwrap() {
                    got = Some(req);
                }
                rest = &rest[n..];
                i += 1;
            }
            prop_assert_eq!(got, Some(expected));
        }

        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let mut r = RequestReader::new(RequestLimits::default());
            let _ = r.feed(&data);
        }
    }
}
