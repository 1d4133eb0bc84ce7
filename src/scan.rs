//! Byte-level scanners for handle mentions and URLs.
//!
//! Both scanners walk the text once, left to right, and report the byte range of each token
//! (excluding the delimiter that precedes it). A token must sit at the start of the text or
//! directly after a non-word character, and that delimiter may not fall inside a token already
//! reported.
//!
//! The grammars are matched the way a backtracking matcher with greedy quantifiers would match
//! them, so the reported ranges are the longest ones the grammar allows at each position.

use std::ops::Range;

const LABEL_MAX: usize = 63;
const HOST_MAX: usize = 256;
const TLD_MAX: usize = 6;

/// Finds `@handle` tokens.
///
/// A handle is one or more `label.` segments followed by a final label that starts with a
/// letter. Labels are 1 to 63 bytes of ASCII letters, digits, and hyphens, and start and end
/// with a letter or digit.
pub(crate) fn mentions(text: &str) -> Vec<Range<usize>> {
    tokens(text, b'@', |bytes, at| handle_end(bytes, at + 1))
}

/// Finds `http://` and `https://` URLs.
///
/// The host must contain a `.` followed by a 1 to 6 byte extension ending on a word boundary.
/// An optional path follows; it may not end in `(`, `)`, `:`, `.`, `?`, or `&`.
pub(crate) fn links(text: &str) -> Vec<Range<usize>> {
    tokens(text, b'h', url_end)
}

fn tokens(
    text: &str,
    lead: u8,
    matcher: impl Fn(&[u8], usize) -> Option<usize>,
) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut floor = 0;
    let mut at = 0;
    while at < bytes.len() {
        if bytes[at] == lead && delimited(text, at, floor) {
            if let Some(end) = matcher(bytes, at) {
                found.push(at..end);
                floor = end;
                at = end;
                continue;
            }
        }
        at += 1;
    }
    found
}

/// `at` must be a char boundary.
fn delimited(text: &str, at: usize, floor: usize) -> bool {
    if at == 0 {
        return true;
    }
    match text[..at].chars().next_back() {
        Some(c) => at - c.len_utf8() >= floor && !(c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    }
}

fn run(bytes: &[u8], from: usize, allowed: impl Fn(u8) -> bool) -> usize {
    bytes[from..].iter().take_while(|&&b| allowed(b)).count()
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

fn handle_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut label_ends = Vec::new();
    let mut pos = from;
    while let Some(next) = dotted_label(bytes, pos) {
        label_ends.push(next);
        pos = next;
    }
    // give back one label at a time until a final label fits
    label_ends
        .iter()
        .rev()
        .find_map(|&start| final_label(bytes, start))
}

fn dotted_label(bytes: &[u8], from: usize) -> Option<usize> {
    let len = run(bytes, from, is_label_byte);
    let valid = (1..=LABEL_MAX).contains(&len)
        && bytes[from].is_ascii_alphanumeric()
        && bytes[from + len - 1].is_ascii_alphanumeric()
        && bytes.get(from + len) == Some(&b'.');
    valid.then(|| from + len + 1)
}

fn final_label(bytes: &[u8], from: usize) -> Option<usize> {
    if !bytes.get(from)?.is_ascii_alphabetic() {
        return None;
    }
    let len = run(bytes, from, is_label_byte).min(LABEL_MAX);
    let last = bytes[from..from + len]
        .iter()
        .rposition(u8::is_ascii_alphanumeric)?;
    Some(from + last + 1)
}

fn is_host_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-@:%._+~#=".contains(&b)
}

fn is_tld_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'(' || b == b')'
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-()@:%_+.~#?&/=".contains(&b)
}

fn is_path_tail_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-@%_+~#/=".contains(&b)
}

fn url_end(bytes: &[u8], at: usize) -> Option<usize> {
    let rest = &bytes[at..];
    let host = if rest.starts_with(b"https://") {
        at + 8
    } else if rest.starts_with(b"http://") {
        at + 7
    } else {
        return None;
    };

    if bytes[host..].starts_with(b"www.") {
        if let Some(end) = host_and_path_end(bytes, host + 4) {
            return Some(end);
        }
    }
    host_and_path_end(bytes, host)
}

fn host_and_path_end(bytes: &[u8], from: usize) -> Option<usize> {
    let host_run = run(bytes, from, is_host_byte).min(HOST_MAX);
    for host_len in (1..=host_run).rev() {
        let dot = from + host_len;
        if bytes.get(dot) != Some(&b'.') {
            continue;
        }
        let tld = dot + 1;
        let tld_run = run(bytes, tld, is_tld_byte).min(TLD_MAX);
        for tld_len in (1..=tld_run).rev() {
            let path = tld + tld_len;
            if word_boundary(bytes, path) {
                return Some(path_end(bytes, path));
            }
        }
    }
    None
}

fn word_boundary(bytes: &[u8], pos: usize) -> bool {
    let before = pos > 0 && is_word(bytes[pos - 1]);
    let after = bytes.get(pos).map_or(false, |&b| is_word(b));
    before != after
}

fn path_end(bytes: &[u8], from: usize) -> usize {
    let len = run(bytes, from, is_path_byte);
    bytes[from..from + len]
        .iter()
        .rposition(|&b| is_path_tail_byte(b))
        .map_or(from, |last| from + last + 1)
}

#[cfg(test)]
mod tests {
    use super::{links, mentions};

    fn matched<'a>(text: &'a str, ranges: &[std::ops::Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|r| &text[r.clone()]).collect()
    }

    #[test]
    fn mention_after_space_and_at_start() {
        let text = "@alice.bsky.social says hi to @bob.test";
        assert_eq!(
            matched(text, &mentions(text)),
            ["@alice.bsky.social", "@bob.test"]
        );
        assert_eq!(mentions(text)[0], 0..18);
    }

    #[test]
    fn mention_needs_non_word_delimiter() {
        assert!(mentions("mail bob@example.com today").is_empty());
        assert!(mentions("under_@score.test").is_empty());
        let text = "(@carol.example)";
        assert_eq!(matched(text, &mentions(text)), ["@carol.example"]);
    }

    #[test]
    fn mention_without_dot_is_ignored() {
        assert!(mentions("hey @alice, hey @bob!").is_empty());
        assert!(mentions("no handles here").is_empty());
    }

    #[test]
    fn mention_drops_trailing_dot() {
        let text = "thanks @alice.bsky.social.";
        assert_eq!(matched(text, &mentions(text)), ["@alice.bsky.social"]);
    }

    #[test]
    fn mention_gives_back_labels_for_final_label() {
        // the last segment starts with a digit, so it cannot be the final label
        let text = "@foo.bar.1x";
        assert_eq!(matched(text, &mentions(text)), ["@foo.bar"]);
        assert!(mentions("@foo.123").is_empty());
    }

    #[test]
    fn mention_final_label_trims_hyphens() {
        let text = "@alice.example-- ok";
        assert_eq!(matched(text, &mentions(text)), ["@alice.example"]);
        assert!(mentions("@alice-.test").is_empty());
    }

    #[test]
    fn mention_label_length_limit() {
        let long = "a".repeat(64);
        assert!(mentions(&format!("@{long}.test")).is_empty());
        let ok = "a".repeat(63);
        let text = format!("@{ok}.test");
        assert_eq!(mentions(&text), [0..text.len()]);
    }

    #[test]
    fn mention_offsets_are_utf8_bytes() {
        let text = "héllo @alice.test";
        assert_eq!(mentions(text), [7..18]);
        let text = "✨@alice.test";
        assert_eq!(mentions(text), [3..14]);
    }

    #[test]
    fn link_excludes_trailing_punctuation() {
        let text = "Hello @alice.bsky.social, check https://example.com/page!";
        assert_eq!(links(text), [32..56]);
        assert_eq!(matched(text, &links(text)), ["https://example.com/page"]);

        let text = "see https://example.com/search?q=rust&x=1.";
        assert_eq!(
            matched(text, &links(text)),
            ["https://example.com/search?q=rust&x=1"]
        );
    }

    #[test]
    fn link_with_www_and_trailing_dot() {
        let text = "go to https://www.example.com.";
        assert_eq!(matched(text, &links(text)), ["https://www.example.com"]);
    }

    #[test]
    fn link_requires_scheme_dot_and_delimiter() {
        assert!(links("example.com is bare").is_empty());
        assert!(links("http://localhost:8080").is_empty());
        assert!(links("xhttps://example.com").is_empty());
        assert!(links("ftp://example.com").is_empty());
    }

    #[test]
    fn several_links_in_order() {
        let text = "http://a.io and https://b.example.org/x_y";
        assert_eq!(
            matched(text, &links(text)),
            ["http://a.io", "https://b.example.org/x_y"]
        );
    }

    #[test]
    fn mention_inside_link_is_reported_by_both() {
        let text = "https://bsky.app/@alice.test";
        assert_eq!(links(text), [0..text.len()]);
        assert_eq!(matched(text, &mentions(text)), ["@alice.test"]);
    }
}
