use thiserror::Error;

/// A failed call to Jira, Tempo or the Unit4 server, with a hint for the user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{service}: Cannot connect to {url}. Check your network (or VPN)!")]
    Connect {
        service: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service}: Connection timed out. The server may be slow.")]
    Timeout { service: &'static str },
    #[error("{message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("{service}: Unexpected response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn from_reqwest(service: &'static str, url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout { service }
        } else if err.is_decode() {
            ApiError::Decode { service, source: err }
        } else if let Some(status) = err.status() {
            ApiError::status(service, status.as_u16(), status.canonical_reason().unwrap_or(""))
        } else {
            ApiError::Connect {
                service,
                url: url.to_string(),
                source: err,
            }
        }
    }

    pub fn status(service: &'static str, status: u16, reason: &str) -> Self {
        ApiError::Status {
            service,
            status,
            message: status_message(service, status, reason),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A 4xx answer about one resource. 401 and 429 concern every request.
    pub fn is_per_item(&self) -> bool {
        matches!(self.status_code(), Some(code) if (400..500).contains(&code) && code != 401 && code != 429)
    }
}

/// True when `err` only concerns the requested item, such as a 403 on a
/// ticket in a project the user can no longer see.
pub fn is_per_item(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_per_item)
}

pub fn status_message(service: &str, status: u16, reason: &str) -> String {
    match status {
        401 => format!("{service}: Authentication failed. Check your API token!"),
        403 => format!("{service}: Access denied. Check your permissions or API token!"),
        404 => format!("{service}: Resource not found. Check the URL in config.toml!"),
        429 => format!("{service}: Too many requests. Wait a moment and try again."),
        500 => format!("{service}: Server error. The service may be temporarily unavailable."),
        502 => format!("{service}: Bad gateway. The service may be temporarily unavailable."),
        503 => format!("{service}: Service unavailable. Try again later."),
        _ => format!("{service}: HTTP {status} - {reason}"),
    }
}

/// Turn a non-success response into an [`ApiError`].
pub fn check_status(service: &'static str, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(ApiError::status(
            service,
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
        ))
    }
}
