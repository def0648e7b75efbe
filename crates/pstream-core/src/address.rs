//! Splitting `protocol://path` addresses for hosts that receive full URIs.

use crate::error::{Result, StreamError};

pub const SCHEME_SEPARATOR: &str = "://";

/// Split `test://directory/file.ext` into `("test", "directory/file.ext")`.
pub fn split_address(address: &str) -> Result<(&str, &str)> {
    let (protocol, path) = address
        .split_once(SCHEME_SEPARATOR)
        .ok_or_else(|| StreamError::InvalidPath(format!("missing '://' in {address}")))?;
    if protocol.is_empty() {
        return Err(StreamError::InvalidPath(format!("missing protocol in {address}")));
    }
    Ok((protocol, path))
}

/// Inverse of [`split_address`].
pub fn join_address(protocol: &str, path: &str) -> String {
    format!("{protocol}{SCHEME_SEPARATOR}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split_address("test://file.ext").unwrap(), ("test", "file.ext"));
    }

    #[test]
    fn test_split_keeps_dot_segments() {
        assert_eq!(
            split_address("test://.//directory//../x").unwrap(),
            ("test", ".//directory//../x")
        );
    }

    #[test]
    fn test_split_empty_path() {
        assert_eq!(split_address("test://").unwrap(), ("test", ""));
    }

    #[test]
    fn test_split_only_first_separator() {
        assert_eq!(split_address("a://b://c").unwrap(), ("a", "b://c"));
    }

    #[test]
    fn test_split_missing_separator() {
        assert!(matches!(
            split_address("/etc/passwd"),
            Err(StreamError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_split_missing_protocol() {
        assert!(matches!(split_address("://x"), Err(StreamError::InvalidPath(_))));
    }

    #[test]
    fn test_join() {
        assert_eq!(join_address("test-read", "file.ext"), "test-read://file.ext");
    }
}
