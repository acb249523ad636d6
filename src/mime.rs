use mime_guess::from_path;
use std::path::Path;

/// Content type for `path`, judged by its extension alone.
pub fn lookup(path: &Path) -> String {
    from_path(path).first_or_octet_stream().to_string()
}
