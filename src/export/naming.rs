/// File-name stem for a title: lowercase ASCII alphanumerics, every other run collapsed to `-`.
/// Titles with nothing left fall back to `logo`.
pub fn title_slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        return "logo".to_owned();
    }
    out
}

pub fn snapshot_file_name(title: &str) -> String {
    format!("{}-snapshot.png", title_slug(title))
}

pub fn export_file_name(title: &str) -> String {
    format!("{}-intro.gif", title_slug(title))
}
