use std::collections::HashSet;

use url::Url;

use super::error::{ProxyError, ProxyResult};

/// A validated download target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub target_url: Url,
    /// Lowercase hostname of `target_url`
    pub source_host: String,
}

impl DownloadRequest {
    /// Validates the raw `url` query value.
    ///
    /// Only absolute `http`/`https` URLs with a host are accepted.
    pub fn parse(raw: Option<&str>) -> ProxyResult<Self> {
        let raw = match raw {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => return Err(ProxyError::MISSING_URL),
        };

        let target_url = Url::parse(raw).map_err(|_| ProxyError::INVALID_URL)?;
        if !matches!(target_url.scheme(), "http" | "https") {
            return Err(ProxyError::INVALID_URL);
        }

        let source_host = match target_url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(ProxyError::INVALID_URL),
        };

        Ok(Self {
            target_url,
            source_host,
        })
    }

    /// Referer sent upstream, built from the target's own host
    pub fn referer(&self) -> String {
        format!("https://{}/", self.source_host)
    }

    /// Rejects hosts outside a non-empty allowlist
    pub fn check_allowed(&self, allowlist: &HashSet<String>) -> ProxyResult<()> {
        if allowlist.is_empty() || allowlist.contains(&self.source_host) {
            Ok(())
        } else {
            Err(ProxyError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(hosts: &[&str]) -> HashSet<String> {
        hosts.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_missing_url() {
        for raw in [None, Some(""), Some("   ")] {
            let err = DownloadRequest::parse(raw).unwrap_err();
            assert_eq!(err.to_string(), "Missing url");
        }
    }

    #[test]
    fn test_invalid_url() {
        let inputs = [
            "not a url",
            "/relative/path.png",
            "example.com/x.png",
            "ftp://example.com/a",
            "mailto:a@b.c",
        ];
        for raw in inputs {
            let err = DownloadRequest::parse(Some(raw)).unwrap_err();
            assert_eq!(err.to_string(), "Invalid url", "input: {raw}");
        }
    }

    #[test]
    fn test_host_is_lowercased() {
        let req = DownloadRequest::parse(Some("https://WWW.NicePNG.com/a.png")).unwrap();
        assert_eq!(req.source_host, "www.nicepng.com");
        assert_eq!(req.referer(), "https://www.nicepng.com/");
    }

    #[test]
    fn test_referer_ignores_scheme_and_port() {
        let req = DownloadRequest::parse(Some("http://127.0.0.1:8080/file.bin")).unwrap();
        assert_eq!(req.referer(), "https://127.0.0.1/");
    }

    #[test]
    fn test_allowlist() {
        let req = DownloadRequest::parse(Some("https://evil.example/a.png")).unwrap();
        assert!(req.check_allowed(&allow(&[])).is_ok());
        assert!(matches!(
            req.check_allowed(&allow(&["nicepng.com", "www.nicepng.com"])),
            Err(ProxyError::Forbidden)
        ));

        let req = DownloadRequest::parse(Some("https://NICEPNG.com/a.png")).unwrap();
        assert!(req.check_allowed(&allow(&["nicepng.com"])).is_ok());
    }
}
