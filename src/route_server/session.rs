use std::time::Duration;

use regex::bytes::Regex;

use crate::config::RouteServerConfig;
use crate::route_server::transport::{through_byte, TelnetTransport, Transport};
use crate::shared::{Error, Result};

/// How many reply lines are searched for a rejection marker
const REJECTION_SCAN_LINES: usize = 12;
const REJECTION_MARKERS: [&str; 2] = ["% Invalid input", "% Unknown command"];

lazy_static::lazy_static! {
    static ref MORE_RE: Regex = Regex::new(r"(?i)--More--|<--- More --->").unwrap();
    static ref PROMPT_RE: Regex = Regex::new(r"[>#]\s*$").unwrap();
    // Partial lines are only taken as a prompt when they look like a hostname,
    // so a route line split after its "*>" marker is not mistaken for one.
    static ref PARTIAL_PROMPT_RE: Regex =
        Regex::new(r"^\r*[A-Za-z0-9][\w.@()/:\-]*[>#] ?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Only while [`Session::connect`] opens the transport
    Connecting,
    Authenticating,
    Ready,
    Issuing,
    Draining,
    Paginating,
    Closed,
}

/// Ends a read at a full line, a pagination marker, or a bare prompt
fn reply_matcher(buf: &[u8]) -> Option<usize> {
    if let Some(i) = buf.iter().position(|&b| b == b'\n') {
        return Some(i + 1);
    }
    if let Some(m) = MORE_RE.find(buf) {
        return Some(m.end());
    }
    if PARTIAL_PROMPT_RE.is_match(buf) {
        return Some(buf.len());
    }
    None
}

/// Whether the last non-empty line of `buf` is a CLI prompt
fn ends_at_prompt(buf: &[u8]) -> bool {
    buf.rsplit(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .map_or(false, |line| PROMPT_RE.is_match(line))
}

fn contains_rejection(lines: &[String]) -> bool {
    lines
        .iter()
        .take(REJECTION_SCAN_LINES)
        .any(|l| REJECTION_MARKERS.iter().any(|m| l.contains(m)))
}

/// An interactive CLI session with a route server.
///
/// The session sends the exit command when dropped unclosed, so every exit
/// path of a fetch releases the server side.
pub struct Session<T: Transport> {
    transport: T,
    config: RouteServerConfig,
    state: SessionState,
}

impl Session<TelnetTransport> {
    pub fn connect(config: RouteServerConfig) -> Result<Self> {
        log::trace!("Session {:?} {}:{}", SessionState::Connecting, config.host, config.port);
        let transport = TelnetTransport::connect(&config.host, config.port, config.connect_timeout())?;
        Ok(Session::new(transport, config))
    }
}

impl<T: Transport> Session<T> {
    /// Wrap a connected transport; the session starts out awaiting login
    pub fn new(transport: T, config: RouteServerConfig) -> Self {
        Session {
            transport,
            config,
            state: SessionState::Authenticating,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::trace!("Session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.transport.send(data)
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = line.as_bytes().to_vec();
        data.push(b'\n');
        self.send(&data)
    }

    /// Answer the login banner if there is one, then turn off paging and
    /// line wrapping.
    pub fn login(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.transition(SessionState::Authenticating);

        let login_timeout = self.config.login_timeout();
        let banner = self.transport.read_until(&through_byte(b':'), login_timeout)?;
        let banner = String::from_utf8_lossy(&banner);
        if banner.contains("Username") || banner.to_lowercase().contains("login") {
            log::debug!("Login requested, sending guest credentials");
            let username = self.config.username.clone();
            self.send_line(&username)?;

            let cue = self.transport.read_until(&through_byte(b':'), login_timeout)?;
            if String::from_utf8_lossy(&cue).to_lowercase().contains("password") {
                let password = self.config.password.clone();
                self.send_line(&password)?;
            }
        }
        self.drain(self.config.banner_timeout())?;

        for command in self.config.setup_commands.clone() {
            self.send_line(&command)?;
            self.drain(self.config.setup_timeout())?;
        }

        self.transition(SessionState::Ready);
        Ok(())
    }

    /// Read a reply until the prompt comes back, paging through `--More--`
    /// markers. Also ends when a read times out with no data.
    pub fn drain(&mut self, timeout: Duration) -> Result<String> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.transition(SessionState::Draining);

        let mut buf = Vec::new();
        loop {
            let chunk = self.transport.read_until(&reply_matcher, timeout)?;
            if chunk.is_empty() {
                log::debug!("No more data after {} bytes", buf.len());
                break;
            }
            buf.extend_from_slice(&chunk);

            if MORE_RE.is_match(&chunk) {
                self.transition(SessionState::Paginating);
                log::trace!("Pagination marker, requesting next page");
                self.send(b" ")?;
                continue;
            }
            self.transition(SessionState::Draining);

            if ends_at_prompt(&buf) {
                break;
            }
        }

        self.transition(SessionState::Ready);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Issue one command and return the reply split into lines
    pub fn run_command(&mut self, command: &str, timeout: Duration) -> Result<Vec<String>> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.transition(SessionState::Issuing);
        self.send_line(command)?;
        let text = self.drain(timeout)?;
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Try each command variant in order until the CLI accepts one with a
    /// non-empty reply. Falls back to the last reply seen.
    pub fn probe<S: AsRef<str>>(&mut self, commands: &[S], timeout: Duration) -> Result<Vec<String>> {
        let mut last = Vec::new();
        for command in commands {
            let command = command.as_ref();
            let lines = self.run_command(command, timeout)?;

            if contains_rejection(&lines) {
                log::info!("Route server rejected `{}`, trying next variant", command);
                last = lines;
                continue;
            }
            if !lines.is_empty() {
                log::debug!("`{}` returned {} lines", command, lines.len());
                return Ok(lines);
            }
            last = lines;
        }
        Ok(last)
    }

    /// Send the exit command. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let exit = format!("{}\n", self.config.exit_command);
        self.state = SessionState::Closed;
        self.transport.send(exit.as_bytes())
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            if let Err(e) = self.close() {
                log::debug!("Could not send exit while dropping session: {}", e);
            }
        }
    }
}
