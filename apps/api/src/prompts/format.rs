//! Named-placeholder substitution for prompt templates.
//!
//! `{name}` is replaced with the supplied value, `{{` and `}}` produce literal braces.
//! Values are inserted verbatim and never re-scanned for placeholders.

use super::PromptError;

pub fn format_template(template: &str, args: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    if inner == '{' {
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(PromptError::Malformed(format!(
                        "unclosed '{{' at byte {pos}"
                    )));
                }
                let name = name.trim();
                let value = args
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| PromptError::MissingPlaceholder(name.to_string()))?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(PromptError::Malformed(format!(
                        "single '}}' at byte {pos}"
                    )));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
