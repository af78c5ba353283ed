use sha2::{Digest, Sha256};

/// Stable content hash for a page URL.
///
/// The URL is hashed byte-for-byte, no normalization: `https://a/` and
/// `https://a` are different pages.
pub fn url_fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            url_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn stable_across_calls() {
        assert_eq!(url_fingerprint("https://example.com"), url_fingerprint("https://example.com"));
    }

    #[test]
    fn distinct_urls_get_distinct_fingerprints() {
        let urls = [
            "https://example.com",
            "https://example.com/",
            "http://example.com",
            "https://example.org",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/?q=1",
            "https://EXAMPLE.com",
        ];
        let mut seen = std::collections::HashSet::new();
        for u in urls {
            assert!(seen.insert(url_fingerprint(u)), "collision for {u}");
        }
    }
}
