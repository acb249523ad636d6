use super::*;
use crate::wire::escape_html;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters percent-encoded when a file name becomes part of an href.
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'/');

/// Renders an HTML index of `dir`, in the order the filesystem returns entries.
/// `request_path` is the raw, slash-terminated path the client asked for.
pub fn render_listing(dir: &Path, request_path: &str) -> io::Result<String> {
    let title = percent_decode_str(request_path).decode_utf8_lossy();
    let title = escape_html(&title);

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Index of {}</title>\n", title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Index of {}</h1>\n", title));

    for entry in dir.log_operation("read_dir", || fs::read_dir(dir))? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        // Follows symlinks so a link to a directory lists as one.
        let is_dir = fs::metadata(entry.path())
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let mut href = format!("{}{}", request_path, utf8_percent_encode(&name, HREF_SEGMENT));
        if is_dir {
            href.push('/');
        }

        html.push_str(&format!(
            "<p><a href=\"{}\">{}</a></p>\n",
            escape_html(&href),
            escape_html(&name)
        ));
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_entry_with_directory_slashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b <c>.txt"), "b").unwrap();

        let html = render_listing(dir.path(), "/files/").unwrap();

        assert!(html.contains("<title>Index of /files/</title>"));
        assert!(html.contains("<a href=\"/files/nested/\">nested</a>"));
        assert!(html.contains("<a href=\"/files/a.txt\">a.txt</a>"));
        assert!(html.contains("<a href=\"/files/b%20%3Cc%3E.txt\">b &lt;c&gt;.txt</a>"));
        assert_eq!(html.matches("<a href=").count(), 3);
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(render_listing(&missing, "/gone/").is_err());
    }
}
