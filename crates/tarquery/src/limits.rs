//! Configurable bounds for archive queries.

/// Bounds applied while resolving symbolic links.
///
/// Archives may contain links that point at themselves or at each other.
/// Resolution gives up with [`ArchiveError::SymlinkLoop`] after
/// `max_symlink_hops` links and with [`ArchiveError::PathTooLong`] when a
/// resolved path grows past `max_path_len`.
///
/// # Example
///
/// ```
/// use tarquery::Limits;
///
/// let limits = Limits {
///     max_symlink_hops: 8,
///     ..Default::default()
/// };
/// assert_eq!(limits.max_path_len, 4096);
/// ```
///
/// [`ArchiveError::SymlinkLoop`]: crate::ArchiveError::SymlinkLoop
/// [`ArchiveError::PathTooLong`]: crate::ArchiveError::PathTooLong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of symbolic links followed for one query.
    ///
    /// Default: 40 (Linux `MAXSYMLINKS`).
    pub max_symlink_hops: usize,

    /// Maximum length in bytes of a path produced by link resolution.
    ///
    /// Default: 4096 bytes (Linux `PATH_MAX`).
    pub max_path_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_symlink_hops: 40,
            max_path_len: 4096,
        }
    }
}

impl Limits {
    /// Limits with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generous limits for trusted archives.
    ///
    /// Link cycles are still detected, only later.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_symlink_hops: 1024,
            max_path_len: usize::MAX,
        }
    }

    /// Conservative limits for untrusted archives.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_symlink_hops: 8,
            max_path_len: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_symlink_hops, 40);
        assert_eq!(limits.max_path_len, 4096);
        assert_eq!(Limits::new(), limits);
    }

    #[test]
    fn test_strict_is_tighter() {
        let strict = Limits::strict();
        let permissive = Limits::permissive();
        assert!(strict.max_symlink_hops < Limits::default().max_symlink_hops);
        assert!(strict.max_path_len < Limits::default().max_path_len);
        assert!(permissive.max_symlink_hops > Limits::default().max_symlink_hops);
        assert_eq!(permissive.max_path_len, usize::MAX);
    }
}
