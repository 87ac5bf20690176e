//! Filename extraction from a URL path or local path.

/// True for locators with a network scheme the transcoder fetches itself.
pub fn is_remote_url(source: &str) -> bool {
    url::Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https" | "rtmp" | "rtsp" | "srt"))
        .unwrap_or(false)
}

/// Extracts the last path segment of `source` for use as a filename hint.
///
/// URLs are parsed (query and fragment ignored); anything else is treated as a
/// local path. Returns `None` for an empty or root path.
pub fn filename_from_source(source: &str) -> Option<String> {
    let owned;
    let path = match url::Url::parse(source) {
        Ok(parsed) if parsed.scheme().len() > 1 => {
            owned = parsed.path().to_string();
            owned.as_str()
        }
        _ => source,
    };
    let segment = path.split(['/', '\\']).filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        assert_eq!(
            filename_from_source("https://example.com/a/b/index.m3u8").as_deref(),
            Some("index.m3u8")
        );
        assert_eq!(
            filename_from_source("https://example.com/single").as_deref(),
            Some("single")
        );
    }

    #[test]
    fn root_or_empty() {
        assert_eq!(filename_from_source("https://example.com/"), None);
        assert_eq!(filename_from_source("https://example.com"), None);
        assert_eq!(filename_from_source(""), None);
    }

    #[test]
    fn with_query() {
        assert_eq!(
            filename_from_source("https://example.com/live.m3u8?token=abc").as_deref(),
            Some("live.m3u8")
        );
    }

    #[test]
    fn local_paths() {
        assert_eq!(filename_from_source("/tmp/in/rec.ts").as_deref(), Some("rec.ts"));
        assert_eq!(filename_from_source("rec.ts").as_deref(), Some("rec.ts"));
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote_url("https://example.com/x.m3u8"));
        assert!(is_remote_url("rtmp://live.example.com/app/key"));
        assert!(!is_remote_url("/tmp/x.ts"));
        assert!(!is_remote_url("file:///tmp/x.ts"));
    }
}
