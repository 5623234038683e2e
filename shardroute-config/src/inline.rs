//! Inline expressions for data nodes.
//!
//! `ds_${0..1}.t_order_${0..1}` expands to
//! `ds_0.t_order_0, ds_0.t_order_1, ds_1.t_order_0, ds_1.t_order_1`.
//! Supported placeholders are inclusive integer ranges (`${0..3}`) and
//! lists (`${['a', 'b']}` or `${[0, 2]}`). Several expressions can be
//! separated with commas. `$->{...}` is accepted as an alias of `${...}`.

use super::Error;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Choice(Vec<String>),
}

/// Expand an inline expression into the list of values it describes,
/// left-most placeholder varying slowest.
pub fn expand(expression: &str) -> Result<Vec<String>, Error> {
    let mut result = vec![];

    for part in split_top_level(expression)? {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let segments = segments(part)?;
        let mut expanded = vec![String::new()];

        for segment in &segments {
            expanded = match segment {
                Segment::Literal(literal) => expanded
                    .into_iter()
                    .map(|prefix| prefix + literal)
                    .collect(),
                Segment::Choice(choices) => expanded
                    .iter()
                    .flat_map(|prefix| choices.iter().map(move |choice| format!("{prefix}{choice}")))
                    .collect(),
            };
        }

        result.extend(expanded);
    }

    Ok(result)
}

/// Split on commas that are not inside a placeholder.
fn split_top_level(expression: &str) -> Result<Vec<&str>, Error> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in expression.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::inline(expression, "unbalanced '}'"))?
            }
            ',' if depth == 0 => {
                parts.push(&expression[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }

    if depth != 0 {
        return Err(Error::inline(expression, "unterminated placeholder"));
    }

    parts.push(&expression[start..]);
    Ok(parts)
}

fn segments(part: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = vec![];
    let mut rest = part;

    while let Some(position) = rest.find('$') {
        let after = &rest[position + 1..];
        let body_start = if after.starts_with("->{") {
            position + 4
        } else if after.starts_with('{') {
            position + 2
        } else {
            // A lone dollar sign is part of the name.
            let literal = &rest[..position + 1];
            push_literal(&mut segments, literal);
            rest = after;
            continue;
        };

        push_literal(&mut segments, &rest[..position]);

        let end = rest[body_start..]
            .find('}')
            .map(|end| body_start + end)
            .ok_or_else(|| Error::inline(part, "unterminated placeholder"))?;

        segments.push(Segment::Choice(choices(part, &rest[body_start..end])?));
        rest = &rest[end + 1..];
    }

    push_literal(&mut segments, rest);
    Ok(segments)
}

fn push_literal(segments: &mut Vec<Segment>, literal: &str) {
    if literal.is_empty() {
        return;
    }

    if let Some(Segment::Literal(previous)) = segments.last_mut() {
        previous.push_str(literal);
    } else {
        segments.push(Segment::Literal(literal.to_string()));
    }
}

fn choices(part: &str, body: &str) -> Result<Vec<String>, Error> {
    let body = body.trim();

    if let Some(list) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        let values: Vec<String> = list
            .split(',')
            .map(|value| value.trim().trim_matches(|c| c == '\'' || c == '"'))
            .filter(|value| !value.is_empty())
            .map(String::from)
            .collect();

        if values.is_empty() {
            return Err(Error::inline(part, "empty list"));
        }

        return Ok(values);
    }

    if let Some((start, end)) = body.split_once("..") {
        let start: i64 = start
            .trim()
            .parse()
            .map_err(|_| Error::inline(part, format!("\"{}\" is not an integer", start.trim())))?;
        let end: i64 = end
            .trim()
            .parse()
            .map_err(|_| Error::inline(part, format!("\"{}\" is not an integer", end.trim())))?;

        if start > end {
            return Err(Error::inline(part, format!("range {start}..{end} is empty")));
        }

        return Ok((start..=end).map(|i| i.to_string()).collect());
    }

    if body.is_empty() {
        return Err(Error::inline(part, "empty placeholder"));
    }

    Ok(vec![body.trim_matches(|c| c == '\'' || c == '"').to_string()])
}
