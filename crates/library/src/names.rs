//! File naming rules shared by uploads, deletes and likes.

/// Fallback name for uploads whose name cleans down to nothing usable.
pub const FALLBACK_NAME: &str = "upload";

/// Clean a client-supplied upload name into a safe single path component.
///
/// Only the final component of the name is kept. ASCII alphanumerics, `.`,
/// `_`, `-` and CJK unified ideographs survive; every other character becomes
/// `_`.
///
/// ```
/// use gallery_library::sanitize_file_name;
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
/// assert_eq!(sanitize_file_name(".."), "upload");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' | '\u{4e00}'..='\u{9fa5}' => c,
            _ => '_',
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => cleaned,
    }
}

/// Name of the cached thumbnail for `name` inside the thumbnail directory.
pub fn thumb_name(name: &str, width: u32, quality: u32) -> String {
    format!("{name}.w{width}.q{quality}.webp")
}

/// Like counter id of an image: `dir/name`, or just `name` at the root.
pub fn like_id(dir: &str, name: &str) -> String {
    match dir.is_empty() {
        true => name.to_string(),
        false => format!("{dir}/{name}"),
    }
}
