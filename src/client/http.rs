//! HTTP Transport
//!
//! Drives the device's web interface: log in, scrape or post forms, log out.
//!
//! ## Pages
//! - `POST /login.html` with `pw=<password>` logs in and returns the status page
//! - `POST /` with `cte<N>=0|1` switches socket N
//! - `GET /login.html` logs out
//!
//! The status page carries the states as a JavaScript array
//! (`sockstates = [1,0,0,1];`) and the socket names as
//! `<h2 class="ener">name</h2>` headings, in socket order.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;

use super::{PowerStrip, StripStatus};
use crate::config::Config;
use crate::error::{EnergenieError, Result};
use crate::socket::Socket;

const STATES_MARKER: &str = "sockstates = ";
const NAME_BEGIN: &str = "<h2 class=\"ener\">";
const NAME_END: &str = "</h2>";

/// Client for the device's web interface
///
/// The device only accepts one logged-in browser at a time, so every
/// operation logs in first and logs out afterwards.
pub struct HttpClient {
    client: Client,
    address: String,
    password: String,
}

impl HttpClient {
    /// Create a client with default timeouts
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let config = Config::builder().address(address).password(password).build();
        Self::from_config(&config)
    }

    /// Create a client from a full configuration
    ///
    /// reqwest has no separate read and write deadlines, so one request gets
    /// `Config::http_request_timeout`; `None` overrides reqwest's 30 s default.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(config.http_request_timeout())
            .build()?;

        Ok(Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.address, path)
    }

    /// Log in and return the status page
    fn login(&self) -> Result<String> {
        tracing::debug!("Logging in to {}", self.address);
        let page = self
            .client
            .post(self.url("login.html"))
            .form(&[("pw", self.password.as_str())])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(page)
    }

    fn logout(&self) -> Result<()> {
        tracing::debug!("Logging out of {}", self.address);
        self.client
            .get(self.url("login.html"))
            .send()?
            .error_for_status()?
            .text()?;
        Ok(())
    }

    /// Run `op` inside a login session; logout happens even if `op` fails
    fn with_session<T>(&self, op: impl FnOnce(&str) -> Result<T>) -> Result<T> {
        let page = self.login()?;
        let result = op(&page);
        if let Err(e) = self.logout() {
            tracing::warn!("Logout from {} failed: {}", self.address, e);
        }
        result
    }

    fn switch_one(&self, socket: Socket, on: bool) -> Result<()> {
        let field = format!("cte{}", socket);
        let value = if on { "1" } else { "0" };
        tracing::debug!("Switching socket {} {}", socket, if on { "on" } else { "off" });

        self.client
            .post(self.url(""))
            .form(&[(field.as_str(), value)])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(())
    }
}

impl PowerStrip for HttpClient {
    fn switch(&self, desired: &BTreeMap<Socket, bool>) -> Result<()> {
        self.with_session(|_| {
            desired
                .iter()
                .try_for_each(|(socket, on)| self.switch_one(*socket, *on))
        })
    }

    fn status(&self) -> Result<StripStatus> {
        self.with_session(|page| {
            let states = parse_states(page)?;
            let names = parse_names(page);
            Ok(StripStatus {
                states,
                names: Some(names),
            })
        })
    }
}

// =============================================================================
// Page Scraping
// =============================================================================

/// Extract `sockstates = [..]` from the status page
pub(crate) fn parse_states(page: &str) -> Result<BTreeMap<Socket, bool>> {
    let start = page
        .find(STATES_MARKER)
        .ok_or_else(|| EnergenieError::Protocol("status page has no socket states".to_string()))?;
    let rest = &page[start + STATES_MARKER.len()..];

    let open = rest.find('[');
    let close = rest.find(']');
    let raw = match (open, close) {
        (Some(open), Some(close)) if open < close => &rest[open + 1..close],
        _ => {
            return Err(EnergenieError::Protocol(
                "malformed socket state array".to_string(),
            ))
        }
    };

    let values: Vec<&str> = raw.split(',').map(str::trim).collect();
    if values.len() < Socket::COUNT {
        return Err(EnergenieError::Protocol(format!(
            "expected {} socket states, found {}",
            Socket::COUNT,
            values.len()
        )));
    }

    Ok(Socket::all()
        .zip(values)
        .map(|(socket, value)| (socket, value == "1"))
        .collect())
}

/// Extract the socket names from the status page
pub(crate) fn parse_names(page: &str) -> BTreeMap<Socket, String> {
    let mut names = BTreeMap::new();
    let mut pos = 0;

    for socket in Socket::all() {
        let Some(begin) = page[pos..].find(NAME_BEGIN) else {
            break;
        };
        let begin = pos + begin + NAME_BEGIN.len();
        let Some(end) = page[begin..].find(NAME_END) else {
            break;
        };
        let end = begin + end;

        names.insert(socket, page[begin..end].trim().to_string());
        pos = end + NAME_END.len();
    }

    names
}
