//! `$name` placeholder substitution for master global-file templates.
//!
//! Placeholders are `$name` or `${name}` where `name` is an ASCII identifier;
//! `$$` is a literal dollar sign. Any other `$` is copied through.

use crate::error::ConfigError;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Substitution {
    /// Unbound placeholders are left in the output unchanged
    #[default]
    Lenient,
    /// Any unbound placeholder is an error
    Strict,
}

pub fn substitute(
    template: &str,
    values: &HashMap<&str, String>,
    mode: Substitution,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) if is_identifier(&braced[..end]) => (&braced[..end], end + 2),
                _ => ("", 0),
            },
            None => {
                let len = identifier_len(after);
                (&after[..len], len)
            }
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match values.get(name) {
            Some(value) => out.push_str(value),
            None if mode == Substitution::Strict => {
                return Err(ConfigError::UnboundPlaceholder(name.to_string()));
            }
            None => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

fn identifier_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(*c == '_' || c.is_ascii_alphanumeric()))
        .map_or(text.len(), |(i, _)| i)
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_len(text) == text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<&'static str, String> {
        HashMap::from([
            ("rvr_type", "0".to_string()),
            ("rvr_file", "net.rvr".to_string()),
        ])
    }

    #[test]
    fn replaces_plain_and_braced_names() {
        let out = substitute(
            "$rvr_type ${rvr_file}\n",
            &values(),
            Substitution::Lenient,
        )
        .unwrap();
        assert_eq!(out, "0 net.rvr\n");
    }

    #[test]
    fn lenient_keeps_unbound_placeholders() {
        let out = substitute("$rvr_type $other ${also} $$ $5", &values(), Substitution::Lenient)
            .unwrap();
        assert_eq!(out, "0 $other ${also} $ $5");
    }

    #[test]
    fn strict_rejects_unbound_placeholders() {
        assert_eq!(
            substitute("$rvr_type $other", &values(), Substitution::Strict),
            Err(ConfigError::UnboundPlaceholder("other".to_string()))
        );
    }

    #[test]
    fn identifier_stops_at_punctuation() {
        let out = substitute("[$rvr_type].", &values(), Substitution::Strict).unwrap();
        assert_eq!(out, "[0].");
    }
}
