//! Addressing for the camera's HTTP endpoints.

use crate::error::SyncError;

/// Listing endpoint path on the device.
pub const LISTING_PATH: &str = "/blackvue_vod.cgi";

/// `host` or `host:port` of the camera on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub host: String,
    pub port: Option<u16>,
}

impl DeviceAddress {
    /// Accepts `192.168.0.5`, `192.168.0.5:8080`, `dashcam.local`, and the same
    /// with a leading `http://` and/or trailing `/`.
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        let invalid = |reason: &str| SyncError::InvalidAddress {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let s = value.trim();
        let lower = s.to_ascii_lowercase();
        let rest = if lower.starts_with("http://") {
            &s["http://".len()..]
        } else if lower.contains("://") {
            return Err(invalid("only plain http is supported"));
        } else {
            s
        };
        let rest = rest.trim_end_matches('/');

        if rest.is_empty() {
            return Err(invalid("--ip (-i) is a required parameter"));
        }
        if rest.contains('/') || rest.chars().any(char::is_whitespace) {
            return Err(invalid("expected host or host:port"));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((h, p)) if !h.contains(':') => {
                let port = p.parse::<u16>().map_err(|_| invalid("bad port"))?;
                (h.to_string(), Some(port))
            }
            _ => (rest.to_string(), None),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self { host, port })
    }

    fn authority(&self) -> String {
        match self.port {
            Some(p) => format!("{}:{}", self.host, p),
            None => self.host.clone(),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("http://{}{}", self.authority(), LISTING_PATH)
    }

    pub fn file_url(&self, remote_path: &str) -> String {
        if remote_path.starts_with('/') {
            format!("http://{}{}", self.authority(), remote_path)
        } else {
            format!("http://{}/{}", self.authority(), remote_path)
        }
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.authority())
    }
}
