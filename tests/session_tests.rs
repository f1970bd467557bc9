use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use bgp_route_bot::config::RouteServerConfig;
use bgp_route_bot::route_server::transport::{Matcher, Transport};
use bgp_route_bot::route_server::{query_commands, RouteServerClient, Session, SessionState};
use bgp_route_bot::shared::{AddressFamily, Error, Result};

type SentLog = Rc<RefCell<Vec<String>>>;

/// In-memory CLI: each scripted reply is queued when its trigger line is sent.
/// Reads that find no complete match return everything queued, like a timeout.
struct ScriptedTransport {
    pending: Vec<u8>,
    script: VecDeque<(String, String)>,
    sent: SentLog,
    reads_before_failure: Option<usize>,
}

impl ScriptedTransport {
    fn new(banner: &str, script: &[(&str, &str)]) -> (Self, SentLog) {
        let sent: SentLog = Rc::new(RefCell::new(Vec::new()));
        let transport = ScriptedTransport {
            pending: banner.as_bytes().to_vec(),
            script: script
                .iter()
                .map(|(t, r)| (t.to_string(), r.to_string()))
                .collect(),
            sent: Rc::clone(&sent),
            reads_before_failure: None,
        };
        (transport, sent)
    }

    fn failing_after(mut self, reads: usize) -> Self {
        self.reads_before_failure = Some(reads);
        self
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        self.sent.borrow_mut().push(text.clone());
        if self.script.front().map_or(false, |(trigger, _)| *trigger == text) {
            if let Some((_, reply)) = self.script.pop_front() {
                self.pending.extend_from_slice(reply.as_bytes());
            }
        }
        Ok(())
    }

    fn read_until(&mut self, matcher: Matcher<'_>, _timeout: Duration) -> Result<Vec<u8>> {
        if let Some(remaining) = self.reads_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(Error::ConnectionClosed);
            }
            *remaining -= 1;
        }
        match matcher(&self.pending) {
            Some(end) => Ok(self.pending.drain(..end).collect()),
            None => Ok(std::mem::take(&mut self.pending)),
        }
    }
}

const BANNER: &str = "Welcome to the route server\r\nUsername: ";
const PROMPT: &str = "route-server> ";

fn login_script() -> Vec<(&'static str, &'static str)> {
    vec![
        ("rviews\n", "\r\nPassword:"),
        ("rviews\n", "\r\nroute-server> "),
        ("terminal length 0\n", "terminal length 0\r\nroute-server> "),
        ("terminal width 0\n", "terminal width 0\r\nroute-server> "),
    ]
}

fn test_config() -> RouteServerConfig {
    RouteServerConfig::default().with_retry(3, 0)
}

fn table_reply(command: &str) -> String {
    format!(
        "{}\r\n\
         BGP routing table version is 4\r\n\
         \x20  Network          Next Hop            Metric LocPrf Weight Path\r\n\
         *> 1.2.3.0/24       10.0.0.1                 0    100      0 1299 56040 i\r\n \
         --More-- \
         \x08\x08\x08\x08\x08\x08\x08\x08*> 1.2.4.0/24       10.0.0.2                 0    100      0 3356 9808 56040 i\r\n\
         {}",
        command, PROMPT
    )
}

#[test]
fn test_login_sends_credentials_and_setup() {
    let (transport, sent) = ScriptedTransport::new(BANNER, &login_script());
    let mut session = Session::new(transport, test_config());
    assert_eq!(session.state(), SessionState::Authenticating);

    session.login().unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(
        *sent.borrow(),
        vec!["rviews\n", "rviews\n", "terminal length 0\n", "terminal width 0\n"]
    );
}

#[test]
fn test_login_without_credentials() {
    let script = vec![
        ("terminal length 0\n", "\r\nroute-server> "),
        ("terminal width 0\n", "\r\nroute-server> "),
    ];
    let (transport, sent) = ScriptedTransport::new(PROMPT, &script);
    let mut session = Session::new(transport, test_config());

    session.login().unwrap();
    assert_eq!(*sent.borrow(), vec!["terminal length 0\n", "terminal width 0\n"]);
}

#[test]
fn test_drain_pages_through_more_markers() {
    let (transport, sent) = ScriptedTransport::new("", &[(" ", "\x08\x08page two\r\nroute-server# ")]);
    let mut session = Session::new(transport, test_config());

    session.run_command("noop", Duration::from_secs(1)).unwrap();
    // Nothing scripted for "noop": the read times out empty
    assert_eq!(session.state(), SessionState::Ready);

    let (transport, sent2) = ScriptedTransport::new("", &[
        ("show x\n", "page one\r\n--More--"),
        (" ", "\x08\x08page two\r\n<--- more --->"),
        (" ", "page three\r\nroute-server# "),
    ]);
    let mut session = Session::new(transport, test_config());
    let lines = session.run_command("show x", Duration::from_secs(1)).unwrap();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "page one");
    assert!(lines[1].ends_with("page two"));
    assert!(lines[2].ends_with("page three"));
    assert_eq!(lines[3], "route-server# ");
    assert_eq!(*sent2.borrow(), vec!["show x\n", " ", " "]);
    assert_eq!(*sent.borrow(), vec!["noop\n"]);
}

#[test]
fn test_probe_falls_through_rejected_variants() {
    let commands = query_commands(56040, AddressFamily::Ipv4);
    let rejected = format!(
        "{}\r\n          ^\r\n% Invalid input detected at '^' marker.\r\n\r\n{}",
        commands[0], PROMPT
    );
    let accepted = table_reply(&commands[1]);
    let first = format!("{}\n", commands[0]);
    let second = format!("{}\n", commands[1]);
    let mut script = login_script();
    script.push((first.as_str(), rejected.as_str()));
    script.push((second.as_str(), accepted.as_str()));

    let (transport, sent) = ScriptedTransport::new(BANNER, &script);
    let mut session = Session::new(transport, test_config());
    session.login().unwrap();
    let lines = session.probe(&commands, Duration::from_secs(1)).unwrap();

    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], commands[1]);
    // The third variant was never tried
    assert!(!sent.borrow().contains(&format!("{}\n", commands[2])));
}

#[test]
fn test_probe_returns_last_reply_when_all_rejected() {
    let commands = vec!["show a", "show b"];
    let script = vec![
        ("show a\n", "show a\r\n% Unknown command\r\nroute-server> "),
        ("show b\n", "show b\r\n% Invalid input\r\nroute-server> "),
    ];
    let (transport, _sent) = ScriptedTransport::new("", &script);
    let mut session = Session::new(transport, test_config());

    let lines = session.probe(&commands, Duration::from_secs(1)).unwrap();
    assert_eq!(lines, vec!["show b", "% Invalid input", "route-server> "]);
}

#[test]
fn test_probe_skips_empty_replies() {
    let commands = vec!["show a", "show b"];
    let script = vec![("show b\n", "show b\r\nroute-server> ")];
    let (transport, _sent) = ScriptedTransport::new("", &script);
    let mut session = Session::new(transport, test_config());

    let lines = session.probe(&commands, Duration::from_secs(1)).unwrap();
    assert_eq!(lines, vec!["show b", "route-server> "]);

    let (transport, _sent) = ScriptedTransport::new("", &[]);
    let mut session = Session::new(transport, test_config());
    assert!(session.probe(&commands, Duration::from_secs(1)).unwrap().is_empty());
}

#[test]
fn test_close_is_idempotent_and_final() {
    let (transport, sent) = ScriptedTransport::new("", &[]);
    let mut session = Session::new(transport, test_config());

    session.close().unwrap();
    session.close().unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(matches!(
        session.run_command("show x", Duration::from_secs(1)),
        Err(Error::SessionClosed)
    ));
    drop(session);
    assert_eq!(*sent.borrow(), vec!["exit\n"]);
}

#[test]
fn test_drop_sends_exit() {
    let (transport, sent) = ScriptedTransport::new(BANNER, &login_script());
    {
        let mut session = Session::new(transport, test_config());
        session.login().unwrap();
    }
    assert_eq!(sent.borrow().last().map(String::as_str), Some("exit\n"));
}

#[test]
fn test_fetch_parses_routes_and_counts_lines() {
    let commands = query_commands(56040, AddressFamily::Ipv4);
    let reply = table_reply(&commands[0]);
    let trigger = format!("{}\n", commands[0]);
    let mut script = login_script();
    script.push((trigger.as_str(), reply.as_str()));

    let (transport, sent) = ScriptedTransport::new(BANNER, &script);
    let mut transport = Some(transport);
    let client = RouteServerClient::new(test_config());
    let (routes, raw_lines) = client
        .fetch_with(56040, AddressFamily::Ipv4, || transport.take().ok_or(Error::ConnectionClosed))
        .unwrap();

    assert_eq!(raw_lines, 6);
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].prefix, "1.2.3.0/24");
    assert_eq!(routes[0].as_path, vec![1299, 56040]);
    assert_eq!(routes[1].prefix, "1.2.4.0/24");
    assert_eq!(routes[1].as_path, vec![3356, 9808, 56040]);
    assert_eq!(sent.borrow().last().map(String::as_str), Some("exit\n"));
}

#[test]
fn test_fetch_retries_connection_failures() {
    let commands = query_commands(56040, AddressFamily::Ipv6);
    let reply = format!(
        "{}\r\n*> 2409:8000::/20 2001:7f8::1 0 100 0 6939 56040 i\r\n{}",
        commands[0], PROMPT
    );
    let trigger = format!("{}\n", commands[0]);
    let mut script = login_script();
    script.push((trigger.as_str(), reply.as_str()));
    let (transport, _sent) = ScriptedTransport::new(BANNER, &script);
    let mut transport = Some(transport);

    let mut attempts = 0;
    let client = RouteServerClient::new(test_config());
    let (routes, _) = client
        .fetch_with(56040, AddressFamily::Ipv6, || {
            attempts += 1;
            if attempts < 3 {
                Err(Error::ConnectionClosed)
            } else {
                transport.take().ok_or(Error::ConnectionClosed)
            }
        })
        .unwrap();

    assert_eq!(attempts, 3);
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].prefix, "2409:8000::/20");
}

#[test]
fn test_fetch_gives_up_after_three_attempts() {
    let mut attempts = 0;
    let client = RouteServerClient::new(test_config());
    let result = client.fetch_with(56040, AddressFamily::Ipv4, || -> Result<ScriptedTransport> {
        attempts += 1;
        Err(Error::ConnectionClosed)
    });

    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert_eq!(attempts, 3);
}

#[test]
fn test_failed_attempt_releases_session() {
    let mut logs = Vec::new();
    let client = RouteServerClient::new(test_config());
    let result = client.fetch_with(56040, AddressFamily::Ipv4, || {
        // The banner read fails on every attempt
        let (transport, sent) = ScriptedTransport::new(BANNER, &[]);
        logs.push(sent);
        Ok(transport.failing_after(0))
    });

    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert_eq!(logs.len(), 3);
    for sent in &logs {
        assert_eq!(*sent.borrow(), vec!["exit\n"]);
    }
}
