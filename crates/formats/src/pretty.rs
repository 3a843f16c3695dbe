use serde_json::Value;

/// Options for the compact pretty-printer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Spaces per nesting level. 0 disables wrapping entirely.
    pub indent: usize,
    /// Width budget for keeping a value on one line.
    pub max_length: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            max_length: 80,
        }
    }
}

impl PrettyOptions {
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            ..Self::default()
        }
    }
}

/// Pretty-prints JSON compactly: a value stays on one line (with `", "` and
/// `": "` spacing) when it fits the remaining width budget, and expands one
/// element per indented line otherwise. Short coordinate pairs stay inline
/// while long arrays unfold, which is what makes the output pleasant in a
/// narrow text area.
pub fn to_string_pretty_compact(value: &Value, options: &PrettyOptions) -> String {
    if options.indent == 0 {
        return spaced(&compact(value));
    }
    render(value, options, 0, 0)
}

fn render(value: &Value, options: &PrettyOptions, current_indent: usize, reserved: usize) -> String {
    let string = compact(value);
    let budget = options
        .max_length
        .saturating_sub(current_indent)
        .saturating_sub(reserved);

    if string.len() <= budget {
        let prettified = spaced(&string);
        if prettified.len() <= budget {
            return prettified;
        }
    }

    let next_indent = current_indent + options.indent;
    let next_pad = " ".repeat(next_indent);
    let pad = " ".repeat(current_indent);

    match value {
        Value::Array(items) if !items.is_empty() => {
            let rendered: Vec<String> = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let comma = usize::from(i + 1 < items.len());
                    render(item, options, next_indent, comma)
                })
                .collect();
            format!(
                "[\n{next_pad}{}\n{pad}]",
                rendered.join(&format!(",\n{next_pad}"))
            )
        }
        Value::Object(map) if !map.is_empty() => {
            let len = map.len();
            let rendered: Vec<String> = map
                .iter()
                .enumerate()
                .map(|(i, (key, item))| {
                    let key_part = format!("{}: ", Value::String(key.clone()));
                    let comma = usize::from(i + 1 < len);
                    let val = render(item, options, next_indent, key_part.len() + comma);
                    format!("{key_part}{val}")
                })
                .collect();
            format!(
                "{{\n{next_pad}{}\n{pad}}}",
                rendered.join(&format!(",\n{next_pad}"))
            )
        }
        _ => string,
    }
}

fn compact(value: &Value) -> String {
    // Serialization of an in-memory Value cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

/// Inserts a space after `:` and `,` outside of string literals.
fn spaced(compact: &str) -> String {
    let mut out = String::with_capacity(compact.len() + compact.len() / 4);
    let mut in_string = false;
    let mut escaped = false;

    for ch in compact.chars() {
        out.push(ch);
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == ':' || ch == ',' {
            out.push(' ');
        }
    }
    out
}
