//! Tag stripping with an offset map back into the source HTML.

use super::position_map::{Interpolation, PositionMap, PositionSpan};

/// Plain text extracted from HTML plus the map back to HTML offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedText {
    pub text: String,
    pub map: PositionMap,
}

/// Longest entity body (between `&` and `;`) worth looking at.
const MAX_ENTITY_LEN: usize = 10;

/// Drop everything between `<` and `>` and record where each run of kept
/// characters came from.
///
/// Character references and the common named entities are decoded to a single
/// character whose span covers the whole reference. Unknown entities stay
/// encoded. This is a character scanner, not an HTML parser: an unterminated
/// `<` swallows the rest of the input.
pub fn strip_markup(html: &str) -> StrippedText {
    let mut text = String::with_capacity(html.len());
    let mut map = PositionMap::new(Interpolation::Verbatim);
    let mut in_tag = false;
    let mut run_start: Option<usize> = None;
    let mut skip_until = 0;

    for (index, ch) in html.char_indices() {
        if index < skip_until {
            continue;
        }

        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }

        if ch == '<' {
            if let Some(start) = run_start.take() {
                flush_run(&mut text, &mut map, html, start, index);
            }
            in_tag = true;
            continue;
        }

        if ch == '&' {
            if let Some((decoded, len)) = decode_entity(&html[index..]) {
                if let Some(start) = run_start.take() {
                    flush_run(&mut text, &mut map, html, start, index);
                }
                let derived_start = text.len();
                text.push(decoded);
                map.push(PositionSpan {
                    original_start: index,
                    original_end: index + len,
                    derived_start,
                    derived_end: text.len(),
                });
                skip_until = index + len;
                continue;
            }
        }

        if run_start.is_none() {
            run_start = Some(index);
        }
    }

    if let Some(start) = run_start {
        flush_run(&mut text, &mut map, html, start, html.len());
    }

    StrippedText { text, map }
}

fn flush_run(text: &mut String, map: &mut PositionMap, html: &str, start: usize, end: usize) {
    let derived_start = text.len();
    text.push_str(&html[start..end]);
    map.push(PositionSpan {
        original_start: start,
        original_end: end,
        derived_start,
        derived_end: text.len(),
    });
}

/// Decode the reference at the start of `input` (which begins with `&`).
/// Returns the character and the byte length of the reference including `;`.
fn decode_entity(input: &str) -> Option<(char, usize)> {
    let body = input.get(1..)?;
    let end = body
        .bytes()
        .take(MAX_ENTITY_LEN + 1)
        .position(|byte| byte == b';')?;
    let name = &body[..end];

    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => decode_numeric(name)?,
    };
    Some((decoded, end + 2))
}

fn decode_numeric(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if hex.bytes().all(|byte| byte.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if digits.bytes().all(|byte| byte.is_ascii_digit()) => digits.parse().ok()?,
        None => return None,
    };
    char::from_u32(code).filter(|ch| *ch != '\0')
}
