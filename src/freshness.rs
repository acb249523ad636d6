//! Caching headers and `If-Modified-Since` handling for locally served files.

use http::header::{CACHE_CONTROL, EXPIRES, LAST_MODIFIED};
use httpdate::fmt_http_date;
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::wire::ResponseHead;

/// 9999-12-31T23:59:59Z, the last instant an HTTP date can express.
const MAX_HTTP_DATE_SECS: u64 = 253_402_300_799;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheHeaders {
    pub cache_control: String,
    pub expires: String,
    pub last_modified: String,
}

impl CacheHeaders {
    pub fn new(modified: SystemTime, max_age: u64, now: SystemTime) -> Self {
        let expires = now
            .checked_add(Duration::from_secs(max_age))
            .unwrap_or(now);
        Self {
            cache_control: format!("public, max-age={}", max_age),
            expires: http_date(expires),
            last_modified: http_date(modified),
        }
    }

    pub fn apply(&self, head: &mut ResponseHead) -> io::Result<()> {
        head.insert(CACHE_CONTROL, &self.cache_control)?;
        head.insert(EXPIRES, &self.expires)?;
        head.insert(LAST_MODIFIED, &self.last_modified)
    }
}

/// IMF-fixdate for `time`, clamped to the range an HTTP date can represent.
pub fn http_date(time: SystemTime) -> String {
    let max = UNIX_EPOCH + Duration::from_secs(MAX_HTTP_DATE_SECS);
    fmt_http_date(time.clamp(UNIX_EPOCH, max))
}

/// A resource is fresh only when the client echoes back its exact `Last-Modified` value.
pub fn is_fresh(if_modified_since: Option<&str>, last_modified: &str) -> bool {
    matches!(if_modified_since, Some(value) if value == last_modified)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn builds_all_three_headers() {
        let headers = CacheHeaders::new(at(784_111_777), 60, at(784_111_777));
        assert_eq!(headers.cache_control, "public, max-age=60");
        assert_eq!(headers.last_modified, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(headers.expires, "Sun, 06 Nov 1994 08:50:37 GMT");
    }

    #[test]
    fn fresh_only_on_exact_match() {
        let last_modified = "Sun, 06 Nov 1994 08:49:37 GMT";
        assert!(is_fresh(Some(last_modified), last_modified));
        assert!(!is_fresh(None, last_modified));
        // A later date is still a mismatch.
        assert!(!is_fresh(Some("Mon, 07 Nov 1994 08:49:37 GMT"), last_modified));
        assert!(!is_fresh(Some("Sunday, 06-Nov-94 08:49:37 GMT"), last_modified));
    }

    #[test]
    fn huge_max_age_does_not_panic() {
        let headers = CacheHeaders::new(at(0), u64::MAX, SystemTime::now());
        assert!(headers.expires.ends_with("GMT"));
    }

    #[test]
    fn apply_sets_headers_on_head() {
        let mut head = ResponseHead::new(http::StatusCode::OK);
        CacheHeaders::new(at(784_111_777), 5, at(784_111_777))
            .apply(&mut head)
            .unwrap();
        assert_eq!(
            head.get(LAST_MODIFIED),
            Some("Sun, 06 Nov 1994 08:49:37 GMT")
        );
        assert_eq!(head.get(CACHE_CONTROL), Some("public, max-age=5"));
    }
}
