//! Turning typed, pasted, or dropped text into a list of files.
//!
//! Terminals deliver a drag-and-drop as pasted text: space separated paths,
//! quoted (`'/a b.png'`) or backslash escaped (`/a\ b.png`), sometimes as
//! `file://` URLs. Typed paths go through the same parser.

use ledgerscan_core::StagedFile;
use std::path::PathBuf;

pub fn parse_path_list(input: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => cur.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    cur.push(next);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    out.push(to_path(&cur));
                    cur.clear();
                    in_token = false;
                }
            }
            (None, c) => {
                cur.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        out.push(to_path(&cur));
    }
    out.retain(|p| !p.as_os_str().is_empty());
    out
}

fn to_path(token: &str) -> PathBuf {
    match token.strip_prefix("file://") {
        Some(url_path) => PathBuf::from(url_path.replace("%20", " ")),
        None => PathBuf::from(token),
    }
}

pub fn stage(paths: impl IntoIterator<Item = PathBuf>) -> Vec<StagedFile> {
    paths.into_iter().map(StagedFile::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: &[&str]) -> Vec<PathBuf> {
        v.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_plain_and_multiple() {
        assert_eq!(
            parse_path_list("  a.png   /tmp/b.jpg\n"),
            p(&["a.png", "/tmp/b.jpg"])
        );
        assert!(parse_path_list("   ").is_empty());
    }

    #[test]
    fn test_quoted_and_escaped() {
        assert_eq!(
            parse_path_list(r#"'/Users/me/My Scans/p1.png' "/tmp/p 2.png" /tmp/p\ 3.png"#),
            p(&["/Users/me/My Scans/p1.png", "/tmp/p 2.png", "/tmp/p 3.png"])
        );
    }

    #[test]
    fn test_file_urls() {
        assert_eq!(
            parse_path_list("file:///home/me/Jan%20statement.png"),
            p(&["/home/me/Jan statement.png"])
        );
    }

    #[test]
    fn test_empty_quotes_are_dropped() {
        assert!(parse_path_list("'' \"\"").is_empty());
    }
}
