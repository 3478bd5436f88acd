use std::fmt;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::{json, Value};
use switchport_core::Fields;
use tracing::{debug, warn};

use crate::dashboard::{Dashboard, DashboardError};
use crate::settings::DashboardSettings;

/// Wait used when a 429 response carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Dashboard API key. Kept out of `Debug` output.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

/// Blocking client for the Meraki dashboard REST API.
pub struct MerakiClient {
    base_url: String,
    api_key: ApiKey,
    max_retries: u32,
    client: Client,
}

impl MerakiClient {
    pub fn new(settings: &DashboardSettings, api_key: ApiKey) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("ms-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| DashboardError::Transport {
                path: settings.base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: settings.max_retries,
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, retrying while the dashboard rate limits it.
    fn send(
        &self,
        path: &str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Value, DashboardError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(path, attempt, "dashboard request");
            let resp = build()
                .bearer_auth(&self.api_key.0)
                .header("Accept", "application/json")
                .send()
                .map_err(|source| DashboardError::Transport {
                    path: path.to_string(),
                    source,
                })?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt > self.max_retries {
                    return Err(DashboardError::RateLimited {
                        path: path.to_string(),
                        attempts: attempt,
                    });
                }
                let wait = retry_after(&resp);
                warn!(path, ?wait, "rate limited by dashboard, retrying");
                thread::sleep(wait);
                continue;
            }

            return read_body(path, resp);
        }
    }

    fn get(&self, path: &str) -> Result<Value, DashboardError> {
        let url = self.api_url(path);
        self.send(path, || self.client.get(&url))
    }

    fn put(&self, path: &str, body: &Fields) -> Result<Value, DashboardError> {
        let url = self.api_url(path);
        self.send(path, || self.client.put(&url).json(body))
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, DashboardError> {
        let url = self.api_url(path);
        self.send(path, || self.client.post(&url).json(body))
    }
}

impl Dashboard for MerakiClient {
    fn get_device(&self, serial: &str) -> Result<Fields, DashboardError> {
        let path = format!("/devices/{serial}");
        into_object(&path, self.get(&path)?)
    }

    fn get_ports(&self, serial: &str) -> Result<Vec<Fields>, DashboardError> {
        let path = format!("/devices/{serial}/switch/ports");
        match self.get(&path)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| into_object(&path, item))
                .collect(),
            other => Err(DashboardError::Decode {
                path,
                detail: format!("expected a list of ports, got {}", kind(&other)),
            }),
        }
    }

    fn update_device(&self, serial: &str, fields: &Fields) -> Result<Value, DashboardError> {
        self.put(&format!("/devices/{serial}"), fields)
    }

    fn update_port(
        &self,
        serial: &str,
        port_id: &str,
        fields: &Fields,
    ) -> Result<Value, DashboardError> {
        self.put(&format!("/devices/{serial}/switch/ports/{port_id}"), fields)
    }

    fn clone_devices(
        &self,
        org_id: &str,
        source_serial: &str,
        target_serials: &[&str],
    ) -> Result<Value, DashboardError> {
        let body = json!({
            "sourceSerial": source_serial,
            "targetSerials": target_serials,
        });
        self.post(
            &format!("/organizations/{org_id}/switch/devices/clone"),
            &body,
        )
    }
}

fn read_body(path: &str, resp: Response) -> Result<Value, DashboardError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(DashboardError::NotFound {
            path: path.to_string(),
        });
    }
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(DashboardError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let text = resp.text().map_err(|source| DashboardError::Transport {
        path: path.to_string(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|err| DashboardError::Decode {
        path: path.to_string(),
        detail: err.to_string(),
    })
}

fn retry_after(resp: &Response) -> Duration {
    resp.headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

fn into_object(path: &str, value: Value) -> Result<Fields, DashboardError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DashboardError::Decode {
            path: path.to_string(),
            detail: format!("expected an object, got {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::JoinHandle;

    #[test]
    fn api_key_is_redacted_in_debug() {
        let key = ApiKey::new("0123456789abcdef");
        assert_eq!(format!("{key:?}"), "ApiKey(..)");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = DashboardSettings {
            base_url: "http://127.0.0.1:9/api/v1/".to_string(),
            ..DashboardSettings::default()
        };
        let client = MerakiClient::new(&settings, ApiKey::new("k")).expect("client");
        assert_eq!(
            client.api_url("/devices/Q2AA"),
            "http://127.0.0.1:9/api/v1/devices/Q2AA"
        );
    }

    #[test]
    fn non_object_payload_is_a_decode_error() {
        let err = into_object("/devices/Q2AA", json!([1, 2])).expect_err("list");
        assert_eq!(
            err.to_string(),
            "unexpected response from /devices/Q2AA: expected an object, got a list"
        );
    }

    /// Serve one canned response per connection and hand back the raw
    /// requests once every response has been sent.
    fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base_url = format!("http://{}/api/v1", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| {
                    let (mut stream, _) = listener.accept().expect("accept");
                    let request = read_request(&mut stream);
                    stream.write_all(response.as_bytes()).expect("write");
                    request
                })
                .collect()
        });
        (base_url, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).expect("read");
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn response(status: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for header in headers {
            out.push_str(header);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }

    fn client(base_url: String, max_retries: u32) -> MerakiClient {
        let settings = DashboardSettings {
            base_url,
            timeout_secs: 5,
            max_retries,
        };
        MerakiClient::new(&settings, ApiKey::new("test-key")).expect("client")
    }

    #[test]
    fn rate_limited_request_is_retried_after_the_advertised_wait() {
        let (base_url, server) = serve(vec![
            response("429 Too Many Requests", &["Retry-After: 0"], ""),
            response(
                "200 OK",
                &["Content-Type: application/json"],
                r#"{"serial":"Q2AA","name":"idf-1"}"#,
            ),
        ]);

        let device = client(base_url, 3).get_device("Q2AA").expect("device");
        assert_eq!(device.get("name"), Some(&json!("idf-1")));

        let requests = server.join().expect("server");
        assert_eq!(requests.len(), 2);
        for request in &requests {
            let request = request.to_ascii_lowercase();
            assert!(request.starts_with("get /api/v1/devices/q2aa http/1.1"));
            assert!(request.contains("authorization: bearer test-key"));
        }
    }

    #[test]
    fn rate_limit_gives_up_after_max_retries() {
        let (base_url, server) = serve(vec![
            response("429 Too Many Requests", &["Retry-After: 0"], ""),
            response("429 Too Many Requests", &["Retry-After: 0"], ""),
        ]);

        let err = client(base_url, 1).get_ports("Q2AA").expect_err("rate limited");
        assert!(matches!(
            err,
            DashboardError::RateLimited { attempts: 2, .. }
        ));
        assert_eq!(server.join().expect("server").len(), 2);
    }

    #[test]
    fn missing_device_is_not_found() {
        let (base_url, server) = serve(vec![response(
            "404 Not Found",
            &[],
            r#"{"errors":["Not found"]}"#,
        )]);

        let err = client(base_url, 3).get_device("Q2ZZ").expect_err("404");
        match err {
            DashboardError::NotFound { path } => assert_eq!(path, "/devices/Q2ZZ"),
            other => panic!("unexpected error: {other}"),
        }
        server.join().expect("server");
    }

    #[test]
    fn server_error_keeps_status_and_body() {
        let (base_url, server) = serve(vec![response(
            "500 Internal Server Error",
            &[],
            r#"{"errors":["boom"]}"#,
        )]);
        let mut fields = Fields::new();
        fields.insert("vlan".to_string(), json!(20));

        let err = client(base_url, 3)
            .update_port("Q2AA", "5", &fields)
            .expect_err("500");
        match err {
            DashboardError::Status { path, status, body } => {
                assert_eq!(path, "/devices/Q2AA/switch/ports/5");
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"errors":["boom"]}"#);
            }
            other => panic!("unexpected error: {other}"),
        }

        let requests = server.join().expect("server");
        assert!(requests[0].starts_with("PUT /api/v1/devices/Q2AA/switch/ports/5 HTTP/1.1"));
        assert!(requests[0].ends_with(r#"{"vlan":20}"#));
    }

    #[test]
    fn empty_body_is_null() {
        let (base_url, server) = serve(vec![response("202 Accepted", &[], "")]);

        let value = client(base_url, 3)
            .clone_devices("549236", "Q2AA", &["Q2BB"])
            .expect("clone");
        assert_eq!(value, Value::Null);

        let requests = server.join().expect("server");
        assert!(requests[0]
            .starts_with("POST /api/v1/organizations/549236/switch/devices/clone HTTP/1.1"));
        let body = requests[0].split("\r\n\r\n").nth(1).expect("body");
        assert_eq!(
            serde_json::from_str::<Value>(body).expect("json body"),
            json!({ "sourceSerial": "Q2AA", "targetSerials": ["Q2BB"] })
        );
    }
}
