//! HTTP Client Tests
//!
//! Runs the HTTP transport against a minimal fake web interface and checks
//! the login / action / logout sequence.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use energenie::{Config, EnergenieError, HttpClient, PowerStrip, Socket, Transport};

const STATUS_PAGE: &str = r#"<html><body>
<h2 class="ener">Desk lamp</h2>
<h2 class="ener">Printer</h2>
<h2 class="ener">Router</h2>
<h2 class="ener">Heater</h2>
<script>var sockstates = [0,1,1,0];</script>
</body></html>"#;

// =============================================================================
// Fake Web Interface
// =============================================================================

#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    /// Lower-cased header block
    headers: String,
    body: String,
}

type Responder = fn(&Request) -> (u16, &'static str);

/// Serve exactly `count` requests, one connection each
fn spawn_server(count: usize, responder: Responder) -> (String, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        while requests.len() < count {
            let (stream, _) = listener.accept().unwrap();
            let request = match read_request(&stream) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let (status, body) = responder(&request);
            let set_cookie = request.path == "/login.html" && request.method == "POST";
            let _ = respond(&stream, status, body, set_cookie);
            requests.push(request);
        }
        requests
    });

    (address, handle)
}

fn read_request(stream: &TcpStream) -> io::Result<Request> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        headers.push_str(&lower);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(Request {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn respond(mut stream: &TcpStream, status: u16, body: &str, set_cookie: bool) -> io::Result<()> {
    let reason = if status == 200 { "OK" } else { "Error" };
    let cookie = if set_cookie { "Set-Cookie: session=abc123; Path=/\r\n" } else { "" };
    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        cookie,
        body
    )?;
    stream.flush()
}

fn status_page(request: &Request) -> (u16, &'static str) {
    if request.method == "POST" && request.path == "/login.html" {
        (200, STATUS_PAGE)
    } else {
        (200, "<html>ok</html>")
    }
}

fn client_for(address: &str) -> HttpClient {
    let config = Config::builder()
        .address(address)
        .password("1")
        .transport(Transport::Http)
        .read_timeout_ms(5000)
        .build();
    HttpClient::from_config(&config).unwrap()
}

fn socket(n: u8) -> Socket {
    Socket::new(n).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_status_scrapes_states_and_names() {
    let (address, server) = spawn_server(2, status_page);
    let client = client_for(&address);

    let status = client.status().unwrap();
    let requests = server.join().unwrap();

    assert!(!status.is_on(socket(1)));
    assert!(status.is_on(socket(2)));
    assert!(status.is_on(socket(3)));
    assert!(!status.is_on(socket(4)));
    assert_eq!(status.name(socket(1)), Some("Desk lamp"));
    assert_eq!(status.name(socket(4)), Some("Heater"));

    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/login.html");
    assert_eq!(requests[0].body, "pw=1");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/login.html");
}

#[test]
fn test_switch_posts_one_form_per_socket() {
    let (address, server) = spawn_server(4, status_page);
    let client = client_for(&address);

    let desired: BTreeMap<Socket, bool> = [(socket(3), false), (socket(1), true)].into_iter().collect();
    client.switch(&desired).unwrap();
    let requests = server.join().unwrap();

    let summary: Vec<(String, String, String)> = requests
        .iter()
        .map(|r| (r.method.clone(), r.path.clone(), r.body.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("POST".to_string(), "/login.html".to_string(), "pw=1".to_string()),
            ("POST".to_string(), "/".to_string(), "cte1=1".to_string()),
            ("POST".to_string(), "/".to_string(), "cte3=0".to_string()),
            ("GET".to_string(), "/login.html".to_string(), String::new()),
        ]
    );

    // The login cookie is carried into the switch requests
    assert!(requests[1].headers.contains("session=abc123"));
}

#[test]
fn test_missing_states_is_protocol_error_and_still_logs_out() {
    fn login_page(_: &Request) -> (u16, &'static str) {
        (200, "<html><form>password</form></html>")
    }

    let (address, server) = spawn_server(2, login_page);
    let client = client_for(&address);

    let result = client.status();
    let requests = server.join().unwrap();

    assert!(matches!(result, Err(EnergenieError::Protocol(_))));
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, "GET");
}

#[test]
fn test_login_failure_is_http_error() {
    fn broken(_: &Request) -> (u16, &'static str) {
        (500, "boom")
    }

    let (address, server) = spawn_server(1, broken);
    let client = client_for(&address);

    let result = client.status();
    server.join().unwrap();

    assert!(matches!(result, Err(EnergenieError::Http(_))));
}

#[test]
fn test_open_selects_http_transport() {
    let (address, server) = spawn_server(2, status_page);
    let config = Config::builder()
        .address(&address)
        .transport(Transport::Http)
        .build();

    let strip = energenie::client::open(&config).unwrap();
    let status = strip.status().unwrap();
    server.join().unwrap();

    assert!(status.names.is_some());
}
