//! Line grammar shared by the bank file and the single-preset text form.
//!
//! ```text
//! <preset> <name> Some Name
//! <parameter> amp_attack 0.25
//! ```

use std::fmt::Write;

use crate::preset::Preset;

/// First eight bytes of every bank file.
pub const BANK_HEADER: &[u8; 8] = b"amSynth\n";
/// First line of an exported single preset.
pub const PRESET_HEADER: &str = "amSynth1.0preset";
pub const PRESET_PREFIX: &str = "<preset> <name> ";
pub const PARAMETER_PREFIX: &str = "<parameter> ";
pub const END_MARKER: &str = "EOF";

#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    /// Starts a new preset with the given name.
    Preset(String),
    /// Raw name and value tokens; neither is validated yet.
    Parameter { name: &'a str, value: &'a str },
    Other,
}

/// Classify one line (without its terminating newline).
pub fn parse_line(line: &[u8]) -> Line<'_> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if let Some(name) = line.strip_prefix(PRESET_PREFIX.as_bytes()) {
        return Line::Preset(String::from_utf8_lossy(name).into_owned());
    }
    if let Some(rest) = line.strip_prefix(PARAMETER_PREFIX.as_bytes()) {
        let Ok(rest) = std::str::from_utf8(rest) else {
            return Line::Other;
        };
        if let Some((name, value)) = rest.split_once(' ') {
            return Line::Parameter { name, value };
        }
    }
    Line::Other
}

/// Parse a value token. Accepts plain decimals and scientific notation;
/// rejects anything non-finite.
pub fn parse_value(token: &str) -> Option<f32> {
    token
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Append a preset's name line and all of its parameter lines.
pub fn write_preset(out: &mut String, preset: &Preset) {
    let name: String = preset
        .name()
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let _ = writeln!(out, "{}{}", PRESET_PREFIX, name);
    for parameter in preset.parameters() {
        let _ = writeln!(
            out,
            "{}{} {}",
            PARAMETER_PREFIX,
            parameter.name(),
            parameter.value()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_lines() {
        assert_eq!(
            parse_line(b"<preset> <name> Warm Pad"),
            Line::Preset("Warm Pad".to_string())
        );
        assert_eq!(
            parse_line(b"<preset> <name> "),
            Line::Preset(String::new())
        );
        assert_eq!(
            parse_line(b"<parameter> amp_attack 0.5"),
            Line::Parameter { name: "amp_attack", value: "0.5" }
        );
        assert_eq!(parse_line(b"<parameter> amp_attack"), Line::Other);
        assert_eq!(parse_line(b"EOF"), Line::Other);
        assert_eq!(parse_line(b""), Line::Other);
    }

    #[test]
    fn strips_carriage_return() {
        assert_eq!(
            parse_line(b"<parameter> osc_mix -0.25\r"),
            Line::Parameter { name: "osc_mix", value: "-0.25" }
        );
    }

    #[test]
    fn parses_decimal_and_scientific_values() {
        assert_eq!(parse_value("0.5"), Some(0.5));
        assert_eq!(parse_value("-16"), Some(-16.0));
        assert_eq!(parse_value("1e-05"), Some(1e-5));
        assert_eq!(parse_value("2.5E2"), Some(250.0));
        assert_eq!(parse_value(" 0.25 "), Some(0.25));
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("NaN"), None);
    }

    #[test]
    fn write_preset_flattens_newlines_in_name() {
        let preset = Preset::new("two\nlines");
        let mut out = String::new();
        write_preset(&mut out, &preset);
        assert!(out.starts_with("<preset> <name> two lines\n"));
        assert_eq!(out.lines().count(), 1 + crate::PARAMETER_COUNT);
    }
}
