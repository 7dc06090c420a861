//! Resolving server-relative upload paths into usable URLs.

/// Resolve a path returned by the backend against the server base URL.
///
/// - empty input stays empty
/// - anything starting with `http` is already absolute and passes through
/// - `/uploads/a.png` becomes `{base}/uploads/a.png`
/// - `uploads/a.png` becomes `{base}/uploads/a.png`
pub fn format_url(server_base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http") {
        return path.to_string();
    }

    let base = server_base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:5001";

    #[test]
    fn test_empty() {
        assert_eq!(format_url(BASE, ""), "");
    }

    #[test]
    fn test_absolute_passthrough() {
        assert_eq!(
            format_url(BASE, "https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(format_url(BASE, "http://x/y.png"), "http://x/y.png");
    }

    #[test]
    fn test_rooted_path() {
        assert_eq!(
            format_url(BASE, "/uploads/images/a.png"),
            "http://localhost:5001/uploads/images/a.png"
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(format_url(BASE, "uploads/a.png"), "http://localhost:5001/uploads/a.png");
    }

    #[test]
    fn test_trailing_slash_base() {
        assert_eq!(format_url("http://host/", "/a.png"), "http://host/a.png");
    }
}
