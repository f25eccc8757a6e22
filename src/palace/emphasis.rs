//! Emphasis markers in scene text.
//!
//! The model wraps every memorized term in `**`. [`segments`] splits text on
//! non-nested `**…**` pairs so a renderer can highlight the terms; an unpaired
//! `**` is left as plain text and an empty pair is dropped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Emphasis(&'a str),
}

pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if start > 0 {
            out.push(Segment::Plain(&rest[..start]));
        }
        if end > 0 {
            out.push(Segment::Emphasis(&after[..end]));
        }
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        out.push(Segment::Plain(rest));
    }
    out
}

/// Text with the markers removed.
pub fn strip_emphasis(text: &str) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(s) | Segment::Emphasis(s) => s,
        })
        .collect()
}

/// The emphasized terms, in order of appearance.
pub fn emphasized_terms(text: &str) -> Vec<&str> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Emphasis(s) => Some(s),
            Segment::Plain(_) => None,
        })
        .collect()
}
