//! Connection identifier classification.
//!
//! A connection identifier is either path-like (`./foo.json`, `c:\data\a b`)
//! or an authority URI (`scheme://...`). Classification is purely lexical:
//! nothing here touches the filesystem or the network.

/// Connection type reported for path-like identifiers.
pub const FILE: &str = "file";

/// Whether the identifier starts with `scheme://`, i.e. matches `^[^:]+://`.
pub fn has_authority(id: &str) -> bool {
    match id.find("://") {
        Some(idx) => idx > 0 && !id[..idx].contains(':'),
        None => false,
    }
}

/// The connection type of an identifier: `"file"` for path-like identifiers,
/// otherwise the lowercased scheme (`"http"`, `"https"`, `"s3"`, ...).
pub fn connection_type(id: &str) -> String {
    if !has_authority(id) {
        return FILE.to_string();
    }
    id.split("://")
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_have_no_authority() {
        assert!(!has_authority("./foo.txt"));
        assert!(!has_authority("/data/file.json"));
        assert!(!has_authority("relative/dir/file.json.gz"));
        assert!(!has_authority("c:\\foo bar"));
        assert!(!has_authority(""));
    }

    #[test]
    fn test_uris_have_authority() {
        assert!(has_authority("http://example.com/foo.txt"));
        assert!(has_authority("https://example.com"));
        assert!(has_authority("s3://bucket/key"));
        assert!(has_authority("x-custom+db://host"));
    }

    #[test]
    fn test_authority_edge_cases() {
        // The scheme must be non-empty and contain no colon.
        assert!(!has_authority("://host/path"));
        assert!(!has_authority("c:/weird:thing://x"));
        // Only the scheme-with-authority prefix counts, not a later `://`.
        assert!(!has_authority("c:\\dir\\http://x"));
        assert!(has_authority("file:///etc/passwd"));
    }

    #[test]
    fn test_connection_type() {
        assert_eq!(connection_type("/data/file.json"), "file");
        assert_eq!(connection_type("data.json"), "file");
        assert_eq!(connection_type("http://example.com/a"), "http");
        assert_eq!(connection_type("HTTPS://example.com/a"), "https");
        assert_eq!(connection_type("ftp://example.com/a"), "ftp");
    }
}
