//! Strings built from the structure of a regular expression.

use super::{STRING_SAMPLE, fit_length};
use crate::models::schema::Pattern;
use regex_syntax::hir::{Class, Hir, HirKind};

/// Class members tried before falling back to the lowest one
const PREFERRED: &str = "a0A-_x. ";

/// How far repetitions may be stretched to reach a minimum length
const MAX_STRETCH: usize = 64;

/// Build a string the pattern accepts, within the given length bounds when possible
pub(crate) fn pattern_sample(pattern: &Pattern, min: Option<usize>, max: Option<usize>) -> String {
    let Ok(hir) = regex_syntax::Parser::new().parse(pattern.as_str()) else {
        return fit_length(STRING_SAMPLE, min, max);
    };

    let fits = |text: &str| {
        let length = text.chars().count();
        min.is_none_or(|min| length >= min) && max.is_none_or(|max| length <= max)
    };

    for stretch in 0..=MAX_STRETCH {
        let candidate = render(&hir, stretch);
        if fits(&candidate) && pattern.is_match(&candidate) {
            return candidate;
        }
    }

    let shortest = render(&hir, 0);
    // unanchored patterns tolerate padding around the match
    let padded = fit_length(&shortest, min, max);
    if pattern.is_match(&padded) {
        return padded;
    }
    shortest
}

/// Render `hir`, repeating every repetition `stretch` times beyond its minimum
fn render(hir: &Hir, stretch: usize) -> String {
    let mut out = String::new();
    write(hir, stretch, &mut out);
    out
}

fn write(hir: &Hir, stretch: usize, out: &mut String) {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(literal) => out.push_str(&String::from_utf8_lossy(&literal.0)),
        HirKind::Class(class) => {
            if let Some(c) = class_member(class) {
                out.push(c);
            }
        }
        HirKind::Repetition(repetition) => {
            let wanted = repetition.min as usize + stretch;
            let count = match repetition.max {
                Some(max) => wanted.min(max as usize),
                None => wanted,
            };
            for _ in 0..count {
                write(&repetition.sub, stretch, out);
            }
        }
        HirKind::Capture(capture) => write(&capture.sub, stretch, out),
        HirKind::Concat(parts) => {
            for part in parts {
                write(part, stretch, out);
            }
        }
        HirKind::Alternation(branches) => {
            if let Some(branch) = branches
                .iter()
                .map(|branch| render(branch, stretch))
                .min_by_key(|text| text.chars().count())
            {
                out.push_str(&branch);
            }
        }
    }
}

fn class_member(class: &Class) -> Option<char> {
    match class {
        Class::Unicode(class) => {
            let ranges = class.ranges();
            PREFERRED
                .chars()
                .find(|c| ranges.iter().any(|r| r.start() <= *c && *c <= r.end()))
                .or_else(|| ranges.first().map(|r| r.start()))
        }
        Class::Bytes(class) => {
            let ranges = class.ranges();
            PREFERRED
                .bytes()
                .find(|b| ranges.iter().any(|r| r.start() <= *b && *b <= r.end()))
                .or_else(|| ranges.first().map(|r| r.start()))
                .filter(u8::is_ascii)
                .map(char::from)
        }
    }
}
