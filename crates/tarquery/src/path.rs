//! Path matching and symbolic link resolution.
//!
//! Member paths are `/`-separated strings stored verbatim in the archive.
//! Directory members usually carry a trailing `/`, queries often do not, and
//! archives created from `.` store every name under `./`. Paths are therefore
//! compared by their [normalized](normalize) form with the trailing separator
//! removed: `"Folder"`, `"Folder/"` and `"./Folder/"` name the same member,
//! while `"Folder"` never matches `"Folder/file"`.

/// Drop a single trailing `/`.
#[must_use]
pub fn trim_dir_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// The form two paths are compared in.
fn match_key(path: &str) -> String {
    let mut key = normalize(path);
    if key.ends_with('/') {
        key.pop();
    }
    key
}

/// True if `path` names the archive root (`""`, `"/"` or `"./"`).
#[must_use]
pub fn is_root(path: &str) -> bool {
    match_key(path).is_empty()
}

/// True if the stored member path `stored` is the one `query` asks for.
#[must_use]
pub fn matches(stored: &str, query: &str) -> bool {
    let query = match_key(query);
    !query.is_empty() && match_key(stored) == query
}

/// The directory part of `path`, up to and including its last `/`.
///
/// Empty when `path` has no separator. A trailing `/` on `path` itself is
/// ignored, so the parent of `"a/b/"` is `"a/"`.
#[must_use]
pub fn parent_prefix(path: &str) -> &str {
    let path = trim_dir_slash(path);
    match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "",
    }
}

/// If `candidate` is an immediate child of directory `dir`, return its
/// normalized name relative to `dir` (with any trailing `/`).
///
/// `dir` may be given with or without its trailing `/`; the empty string is
/// the archive root.
#[must_use]
pub fn child_name(dir: &str, candidate: &str) -> Option<String> {
    let dir = match_key(dir);
    let candidate = normalize(candidate);
    let rest = if dir.is_empty() {
        candidate.as_str()
    } else {
        candidate.strip_prefix(dir.as_str())?.strip_prefix('/')?
    };
    let name = trim_dir_slash(rest);
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(rest.to_owned())
}

/// Lexically normalize a member path.
///
/// Empty and `.` segments disappear, `..` removes the preceding segment and
/// never climbs above the root, leading separators are dropped. A trailing
/// `/` survives.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut normalized = segments.join("/");
    if path.ends_with('/') && !normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Compute the member path a symbolic link points at.
///
/// A relative `target` is taken relative to the directory holding `link`;
/// an absolute one is taken from the archive root. The result is
/// [normalized](normalize).
///
/// ```
/// use tarquery::path::resolve_link;
///
/// assert_eq!(resolve_link("Folder/link.txt", "real.txt"), "Folder/real.txt");
/// assert_eq!(resolve_link("link.txt", "real.txt"), "real.txt");
/// assert_eq!(resolve_link("a/b/link", "../c"), "a/c");
/// assert_eq!(resolve_link("a/b/link", "/top/file"), "top/file");
/// ```
#[must_use]
pub fn resolve_link(link: &str, target: &str) -> String {
    if target.starts_with('/') {
        return normalize(target);
    }
    let mut joined = String::with_capacity(link.len() + target.len());
    joined.push_str(parent_prefix(link));
    joined.push_str(target);
    normalize(&joined)
}
