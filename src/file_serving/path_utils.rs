use super::*;
use std::path::Component;

/// What a request path points at on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    RegularFile(PathBuf),
    /// A directory, and whether the request path ended with `/`.
    Directory(PathBuf, bool),
    Missing,
}

/// The single terminal action for a locally served request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ServeFile(PathBuf),
    ListDirectory(PathBuf),
    RedirectWithSlash,
    NotFound,
}

/// Turns a request path into a path relative to the root. The query is stripped and the path
/// percent-decoded. `.` segments are dropped, and each `..` removes the previous segment without
/// ever climbing above the root. Returns `None` if the path is not valid UTF-8 once decoded.
pub fn normalize(request_path: &str) -> Option<PathBuf> {
    let path_without_query = request_path.split('?').next().unwrap_or(request_path);

    let decoded = match percent_decode_str(path_without_query).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            log::debug!("Failed to decode path {}: {}", path_without_query, e);
            return None;
        }
    };

    let mut normalized = PathBuf::new();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    Some(normalized)
}

/// Joins `request_path` onto `root` and stats the result.
pub fn resolve(root: &Path, request_path: &str) -> ResolvedTarget {
    let Some(relative) = normalize(request_path) else {
        return ResolvedTarget::Missing;
    };
    let path = root.join(&relative);
    if !path.starts_with(root) {
        log::warn!("Path escapes root directory: {}", path.display());
        return ResolvedTarget::Missing;
    }
    log::debug!("Resolved {} to {}", request_path, path.display());

    let has_trailing_slash = request_path
        .split('?')
        .next()
        .unwrap_or(request_path)
        .ends_with('/');

    match fs::metadata(&path) {
        Ok(metadata) if metadata.is_dir() => ResolvedTarget::Directory(path, has_trailing_slash),
        Ok(metadata) if metadata.is_file() && !has_trailing_slash => {
            ResolvedTarget::RegularFile(path)
        }
        Ok(metadata) if metadata.is_file() => {
            log::debug!("File requested as a directory: {}", path.display());
            ResolvedTarget::Missing
        }
        Ok(_) => {
            log::debug!("Not a regular file: {}", path.display());
            ResolvedTarget::Missing
        }
        Err(e) => {
            log::debug!("Stat failed for {}: {}", path.display(), e);
            ResolvedTarget::Missing
        }
    }
}

pub fn classify(target: ResolvedTarget) -> Action {
    match target {
        ResolvedTarget::Missing => Action::NotFound,
        ResolvedTarget::Directory(path, true) => Action::ListDirectory(path),
        ResolvedTarget::Directory(_, false) => Action::RedirectWithSlash,
        ResolvedTarget::RegularFile(path) => Action::ServeFile(path),
    }
}
