use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::shared::{Error, Result};

/// Decides how much of the buffered text a read should return.
///
/// Called with everything received but not yet returned; yields the end
/// offset of the first complete match, or `None` to keep reading.
pub type Matcher<'a> = &'a dyn Fn(&[u8]) -> Option<usize>;

/// Byte stream to a router CLI
pub trait Transport {
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `matcher` accepts the buffered data or `timeout` elapses.
    ///
    /// On timeout, returns whatever was buffered, possibly nothing. A timeout
    /// is not an error.
    fn read_until(&mut self, matcher: Matcher<'_>, timeout: Duration) -> Result<Vec<u8>>;
}

/// Matches through the first occurrence of `byte`
pub fn through_byte(byte: u8) -> impl Fn(&[u8]) -> Option<usize> {
    move |buf: &[u8]| buf.iter().position(|&b| b == byte).map(|i| i + 1)
}

// Telnet command bytes (RFC 854)
const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Separates telnet commands from the data stream. Every option the server
/// offers or requests is refused.
#[derive(Debug)]
struct TelnetDecoder {
    state: DecodeState,
}

impl TelnetDecoder {
    fn new() -> Self {
        TelnetDecoder {
            state: DecodeState::Data,
        }
    }

    fn feed(&mut self, raw: &[u8], cooked: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in raw {
            self.state = match (self.state, byte) {
                (DecodeState::Data, IAC) => DecodeState::Iac,
                // The NUL of a bare "\r\0" carriage return
                (DecodeState::Data, 0) => DecodeState::Data,
                (DecodeState::Data, b) => {
                    cooked.push(b);
                    DecodeState::Data
                }
                (DecodeState::Iac, IAC) => {
                    cooked.push(IAC);
                    DecodeState::Data
                }
                (DecodeState::Iac, cmd @ (DO | DONT | WILL | WONT)) => DecodeState::Negotiate(cmd),
                (DecodeState::Iac, SB) => DecodeState::Sub,
                // NOP, GA and friends carry no data
                (DecodeState::Iac, _) => DecodeState::Data,
                (DecodeState::Negotiate(cmd), option) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    DecodeState::Data
                }
                (DecodeState::Sub, IAC) => DecodeState::SubIac,
                (DecodeState::Sub, _) => DecodeState::Sub,
                (DecodeState::SubIac, SE) => DecodeState::Data,
                (DecodeState::SubIac, _) => DecodeState::Sub,
            };
        }
    }
}

/// Plain telnet over TCP
pub struct TelnetTransport {
    stream: TcpStream,
    decoder: TelnetDecoder,
    cooked: Vec<u8>,
}

impl TelnetTransport {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    log::debug!("Connected to {} ({})", host, addr);
                    stream.set_nodelay(true)?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(TelnetTransport {
                        stream,
                        decoder: TelnetDecoder::new(),
                        cooked: Vec::new(),
                    });
                }
                Err(e) => {
                    log::debug!("Connecting to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e.into()),
            None => Err(Error::Resolve(format!("{}:{}", host, port))),
        }
    }

    fn take_cooked(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.cooked)
    }
}

impl Transport for TelnetTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        // A literal 0xFF must be doubled on the wire
        let mut escaped = Vec::with_capacity(data.len());
        for &b in data {
            if b == IAC {
                escaped.push(IAC);
            }
            escaped.push(b);
        }
        self.stream.write_all(&escaped)?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_until(&mut self, matcher: Matcher<'_>, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut raw = [0u8; 4096];

        loop {
            if let Some(end) = matcher(&self.cooked) {
                let end = end.min(self.cooked.len());
                return Ok(self.cooked.drain(..end).collect());
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(self.take_cooked());
            }
            self.stream.set_read_timeout(Some(deadline - now))?;

            match self.stream.read(&mut raw) {
                Ok(0) => {
                    if self.cooked.is_empty() {
                        return Err(Error::ConnectionClosed);
                    }
                    return Ok(self.take_cooked());
                }
                Ok(n) => {
                    let mut replies = Vec::new();
                    self.decoder.feed(&raw[..n], &mut self.cooked, &mut replies);
                    if !replies.is_empty() {
                        self.stream.write_all(&replies)?;
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(self.take_cooked());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for TelnetTransport {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
