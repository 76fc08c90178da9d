//! Key strings such as `"q"`, `"esc"` or `"ctrl+p"`

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use thiserror::Error;

/// A key string that names no known key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised key `{0}`")]
pub struct KeyParseError(pub String);

/// Parse a key string into a press event.
pub fn parse_key(key_str: &str) -> Result<KeyEvent, KeyParseError> {
    let normalized = key_str.trim().to_lowercase();
    let unknown = || KeyParseError(key_str.to_string());

    if normalized == "shift+tab" || normalized == "backtab" {
        return Ok(press(KeyCode::BackTab, KeyModifiers::SHIFT));
    }

    let (prefix, key_part) = match normalized.rsplit_once('+') {
        // "+" on its own, or "ctrl++"
        Some((prefix, "")) => (prefix.strip_suffix('+').unwrap_or(prefix), "+"),
        Some((prefix, key)) => (prefix, key),
        None => ("", normalized.as_str()),
    };

    let mut modifiers = KeyModifiers::empty();
    for part in prefix.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        match part {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return Err(unknown()),
        }
    }

    let code = match key_part.trim() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "delete" => KeyCode::Delete,
        "insert" => KeyCode::Insert,
        "space" => KeyCode::Char(' '),
        f if f.len() > 1 && f.starts_with('f') => {
            let n: u8 = f[1..].parse().map_err(|_| unknown())?;
            if !(1..=12).contains(&n) {
                return Err(unknown());
            }
            KeyCode::F(n)
        }
        c => {
            let mut chars = c.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return Err(unknown()),
            }
        }
    };

    Ok(press(code, modifiers))
}

/// Whether `actual` is the key `expected` describes.
///
/// Character keys compare case-insensitively; kind and state are ignored.
pub fn key_matches(expected: &KeyEvent, actual: &KeyEvent) -> bool {
    let codes_match = match (expected.code, actual.code) {
        (KeyCode::Char(a), KeyCode::Char(b)) => a.to_lowercase().eq(b.to_lowercase()),
        (a, b) => a == b,
    };
    codes_match && expected.modifiers == actual.modifiers
}

/// Short display form, e.g. `"ctrl+p"` becomes `"^P"`.
pub fn format_key(key_str: &str) -> String {
    let Ok(key) = parse_key(key_str) else {
        return key_str.to_string();
    };

    let mut out = String::new();
    if key.code == KeyCode::BackTab {
        return "Shift+Tab".to_string();
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        out.push('^');
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        out.push_str("Alt+");
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        out.push_str("Shift+");
    }

    match key.code {
        KeyCode::Char(' ') => out.push_str("Space"),
        KeyCode::Char(c) => out.extend(c.to_uppercase()),
        KeyCode::F(n) => out.push_str(&format!("F{}", n)),
        KeyCode::PageUp => out.push_str("PgUp"),
        KeyCode::PageDown => out.push_str("PgDn"),
        KeyCode::Delete => out.push_str("Del"),
        KeyCode::Insert => out.push_str("Ins"),
        other => out.push_str(&format!("{:?}", other)),
    }
    out
}

fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_named_keys() {
        assert_eq!(parse_key("q").unwrap().code, KeyCode::Char('q'));
        assert_eq!(parse_key(" Esc ").unwrap().code, KeyCode::Esc);
        assert_eq!(parse_key("space").unwrap().code, KeyCode::Char(' '));
        assert_eq!(parse_key("f5").unwrap().code, KeyCode::F(5));
        assert_eq!(parse_key("+").unwrap().code, KeyCode::Char('+'));
        assert_eq!(parse_key("-").unwrap().code, KeyCode::Char('-'));
    }

    #[test]
    fn test_parse_modifiers() {
        let key = parse_key("ctrl+p").unwrap();
        assert_eq!(key.code, KeyCode::Char('p'));
        assert_eq!(key.modifiers, KeyModifiers::CONTROL);

        let key = parse_key("ctrl+alt+x").unwrap();
        assert!(key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::ALT));

        let key = parse_key("shift+tab").unwrap();
        assert_eq!(key.code, KeyCode::BackTab);
        assert_eq!(key.modifiers, KeyModifiers::SHIFT);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(parse_key(""), Err(KeyParseError(String::new())));
        assert!(parse_key("hyper+q").is_err());
        assert!(parse_key("f13").is_err());
        assert!(parse_key("qq").is_err());
    }

    #[test]
    fn test_key_matches_ignores_case() {
        let expected = parse_key("k").unwrap();
        let upper = press(KeyCode::Char('K'), KeyModifiers::empty());
        let ctrl = press(KeyCode::Char('k'), KeyModifiers::CONTROL);

        assert!(key_matches(&expected, &upper));
        assert!(!key_matches(&expected, &ctrl));
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("q"), "Q");
        assert_eq!(format_key("ctrl+p"), "^P");
        assert_eq!(format_key("esc"), "Esc");
        assert_eq!(format_key("shift+tab"), "Shift+Tab");
        assert_eq!(format_key("nonsense"), "nonsense");
    }
}
