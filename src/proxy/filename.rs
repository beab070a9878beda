//! Attachment filename derivation from the target URL.

use url::Url;

/// Used when the URL path ends without a segment (`/` or a trailing slash)
pub const DEFAULT_FILENAME: &str = "download";

/// Derives the attachment filename from the last path segment of `url`.
///
/// The segment is percent-decoded first, so `My%20File.png` is treated as
/// `My File.png`, then passed through [`sanitize_filename`].
pub fn filename_from_url(url: &Url) -> String {
    let segment = url.path().rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    sanitize_filename(&decoded)
}

/// Restricts a filename to `[A-Za-z0-9_.-]`.
///
/// Each run of other characters becomes a single `_`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> String {
        filename_from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(name("https://example.com/a/b/file.deb"), "file.deb");
        assert_eq!(name("https://example.com/single"), "single");
    }

    #[test]
    fn test_spaces_and_punctuation() {
        assert_eq!(name("https://example.com/path/My File!.png"), "My_File_.png");
        assert_eq!(name("https://example.com/path/My%20File%21.png"), "My_File_.png");
    }

    #[test]
    fn test_default_when_no_segment() {
        assert_eq!(name("https://example.com"), DEFAULT_FILENAME);
        assert_eq!(name("https://example.com/"), DEFAULT_FILENAME);
        assert_eq!(name("https://example.com/images/"), DEFAULT_FILENAME);
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(name("https://example.com/pic.jpg?size=large#top"), "pic.jpg");
    }

    #[test]
    fn test_sanitize_runs() {
        assert_eq!(sanitize_filename("a  b"), "a_b");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(sanitize_filename("x\"; y.txt"), "x_y.txt");
        assert_eq!(sanitize_filename("keep_this-name.v2.tar.gz"), "keep_this-name.v2.tar.gz");
    }

    #[test]
    fn test_sanitized_charset() {
        let out = sanitize_filename("a/b\\c:d*e?f<g>h|i\0j");
        assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
    }
}
