use anyhow::Result;
use fantoccini::cookies::Cookie;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser cookie as stored between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
}

impl StoredCookie {
    pub fn from_cookie(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(String::from),
            path: cookie.path().map(String::from),
            secure: cookie.secure(),
            http_only: cookie.http_only(),
        }
    }

    pub fn into_cookie(self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name, self.value);
        if let Some(domain) = self.domain {
            cookie.set_domain(domain);
        }
        if let Some(path) = self.path {
            cookie.set_path(path);
        }
        if let Some(secure) = self.secure {
            cookie.set_secure(secure);
        }
        if let Some(http_only) = self.http_only {
            cookie.set_http_only(http_only);
        }
        cookie
    }
}

/// Logged-in Unit4 session, saved so the 2FA login is not needed every run.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Saved cookies, or `None` when there is no usable session.
    pub fn load(&self) -> Option<Vec<StoredCookie>> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(cookies) => Some(cookies),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    pub fn save(&self, cookies: &[StoredCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredCookie {
        StoredCookie {
            name: "ASP.NET_SessionId".into(),
            value: "abc".into(),
            domain: Some("unit4.example.com".into()),
            path: Some("/".into()),
            secure: Some(true),
            http_only: None,
        }
    }

    #[test]
    fn missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SessionStore::new(dir.path().join("session.json")).load().is_none());
    }

    #[test]
    fn corrupt_session_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(SessionStore::new(path).load().is_none());
    }

    #[test]
    fn saves_and_loads_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&[sample()]).unwrap();
        assert_eq!(store.load().unwrap(), vec![sample()]);
    }

    #[test]
    fn converts_to_browser_cookie_and_back() {
        let cookie = sample().into_cookie();
        assert_eq!(cookie.name(), "ASP.NET_SessionId");
        assert_eq!(cookie.domain(), Some("unit4.example.com"));
        assert_eq!(StoredCookie::from_cookie(&cookie), sample());
    }
}
