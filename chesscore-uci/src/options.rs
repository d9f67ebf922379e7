//! UCI option descriptors: the
//! `option name ... type ... default ... min ... max ... var ...` lines an
//! engine advertises after `uciok`, plus the validate/format/parse trio
//! that backs a round-trip property.

use crate::error::{DriverError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Check,
    Spin,
    Combo,
    Button,
    String,
    Filename,
}

impl OptionKind {
    fn from_token(token: &str) -> Option<OptionKind> {
        match token {
            "check" => Some(OptionKind::Check),
            "spin" => Some(OptionKind::Spin),
            "combo" => Some(OptionKind::Combo),
            "button" => Some(OptionKind::Button),
            "string" => Some(OptionKind::String),
            _ => None,
        }
    }

    fn wire_token(self) -> &'static str {
        match self {
            OptionKind::Check => "check",
            OptionKind::Spin => "spin",
            OptionKind::Combo => "combo",
            OptionKind::Button => "button",
            // "filename" is our own inference, never sent back to the
            // engine as a type token: it is always a "string" on the wire.
            OptionKind::String | OptionKind::Filename => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UciOptionDescriptor {
    pub name: String,
    pub kind: OptionKind,
    pub default: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub values: Vec<String>,
}

impl UciOptionDescriptor {
    /// Parses a single engine `option ...` line (without the leading
    /// `option` token already stripped by the caller, i.e. starting at
    /// `name`).
    pub fn parse_line(line: &str) -> Result<UciOptionDescriptor> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut idx = 0;
        if tokens.first() != Some(&"name") {
            return Err(DriverError::parse(format!("option line missing 'name': {line}")));
        }
        idx += 1;

        let name_start = idx;
        while idx < tokens.len() && tokens[idx] != "type" {
            idx += 1;
        }
        if idx >= tokens.len() {
            return Err(DriverError::parse(format!("option line missing 'type': {line}")));
        }
        let name = tokens[name_start..idx].join(" ");
        idx += 1;

        let kind_token = tokens.get(idx).ok_or_else(|| {
            DriverError::parse(format!("option line missing type value: {line}"))
        })?;
        let mut kind = OptionKind::from_token(kind_token)
            .ok_or_else(|| DriverError::parse(format!("unknown option type: {kind_token}")))?;
        idx += 1;

        let mut default = None;
        let mut min = None;
        let mut max = None;
        let mut values = Vec::new();

        while idx < tokens.len() {
            match tokens[idx] {
                "default" => {
                    idx += 1;
                    let start = idx;
                    while idx < tokens.len()
                        && !matches!(tokens[idx], "min" | "max" | "var")
                    {
                        idx += 1;
                    }
                    if start < idx {
                        default = Some(tokens[start..idx].join(" "));
                    } else {
                        default = Some(String::new());
                    }
                }
                "min" => {
                    idx += 1;
                    if let Some(tok) = tokens.get(idx) {
                        min = tok.parse().ok();
                        idx += 1;
                    }
                }
                "max" => {
                    idx += 1;
                    if let Some(tok) = tokens.get(idx) {
                        max = tok.parse().ok();
                        idx += 1;
                    }
                }
                "var" => {
                    idx += 1;
                    let start = idx;
                    while idx < tokens.len()
                        && !matches!(tokens[idx], "min" | "max" | "var" | "default")
                    {
                        idx += 1;
                    }
                    if start < idx {
                        values.push(tokens[start..idx].join(" "));
                    }
                }
                _ => idx += 1,
            }
        }

        if kind == OptionKind::String && is_filename_heuristic(&name) {
            kind = OptionKind::Filename;
        }

        Ok(UciOptionDescriptor { name, kind, default, min, max, values })
    }

    /// Whether `value` is acceptable for this descriptor's kind.
    pub fn is_valid_value(&self, value: &str) -> bool {
        match self.kind {
            OptionKind::Check => value == "true" || value == "false",
            OptionKind::Spin => match value.parse::<i64>() {
                Ok(n) => {
                    self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
                }
                Err(_) => false,
            },
            OptionKind::Combo => self.values.iter().any(|v| v == value),
            OptionKind::Button => value.is_empty(),
            OptionKind::String | OptionKind::Filename => true,
        }
    }

    /// Renders the GUI→engine `setoption` line for `value`.
    pub fn format_set_option(&self, value: &str) -> String {
        if self.kind == OptionKind::Button {
            format!("setoption name {}", self.name)
        } else {
            format!("setoption name {} value {}", self.name, value)
        }
    }

    pub fn wire_type_token(&self) -> &'static str {
        self.kind.wire_token()
    }
}

/// `kind=string` is reclassified as `Filename` when the option name ends
/// with "file"/"filename"/"path" (case-insensitive) and does not start
/// with "use" — a heuristic for distinguishing e.g. `SyzygyPath`
/// from `UseNNUE`.
fn is_filename_heuristic(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("use") {
        return false;
    }
    lower.ends_with("file") || lower.ends_with("filename") || lower.ends_with("path")
}

/// Parses a GUI→engine `setoption name ... [value ...]` line into its
/// `(name, value)` pair, independent of any descriptor.
pub fn parse_set_option_line(line: &str) -> Result<(String, Option<String>)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first() != Some(&"name") {
        return Err(DriverError::parse(format!("setoption line missing 'name': {line}")));
    }
    let mut idx = 1;
    let name_start = idx;
    while idx < tokens.len() && tokens[idx] != "value" {
        idx += 1;
    }
    let name = tokens[name_start..idx].join(" ");
    if idx >= tokens.len() {
        return Ok((name, None));
    }
    let value = tokens[idx + 1..].join(" ");
    Ok((name, Some(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spin_option() {
        let d = UciOptionDescriptor::parse_line("name Hash type spin default 16 min 1 max 33554432")
            .unwrap();
        assert_eq!(d.name, "Hash");
        assert_eq!(d.kind, OptionKind::Spin);
        assert_eq!(d.default, Some("16".to_string()));
        assert_eq!(d.min, Some(1));
        assert_eq!(d.max, Some(33554432));
        assert!(d.is_valid_value("1024"));
        assert!(!d.is_valid_value("33554433"));
        assert!(!d.is_valid_value("abc"));
    }

    #[test]
    fn parses_combo_option() {
        let d = UciOptionDescriptor::parse_line(
            "name Style type combo default Normal var Solid var Normal var Risky",
        )
        .unwrap();
        assert_eq!(d.kind, OptionKind::Combo);
        assert_eq!(d.values, vec!["Solid", "Normal", "Risky"]);
        assert!(d.is_valid_value("Risky"));
        assert!(!d.is_valid_value("Aggressive"));
    }

    #[test]
    fn filename_heuristic_applies_to_string_kind() {
        let d = UciOptionDescriptor::parse_line("name SyzygyPath type string default <empty>")
            .unwrap();
        assert_eq!(d.kind, OptionKind::Filename);

        let d2 = UciOptionDescriptor::parse_line("name UseBook type string default false")
            .unwrap();
        assert_eq!(d2.kind, OptionKind::String);
    }

    #[test]
    fn round_trip_property() {
        let d = UciOptionDescriptor::parse_line("name Hash type spin default 16 min 1 max 1024")
            .unwrap();
        for value in ["1", "512", "1024"] {
            assert!(d.is_valid_value(value));
            let line = d.format_set_option(value);
            let (name, parsed_value) = parse_set_option_line(&line[10..]).unwrap();
            assert_eq!(name, d.name);
            assert_eq!(parsed_value.as_deref(), Some(value));
        }
    }

    #[test]
    fn button_round_trip() {
        let d = UciOptionDescriptor::parse_line("name Clear Hash type button").unwrap();
        assert!(d.is_valid_value(""));
        let line = d.format_set_option("");
        assert_eq!(line, "setoption name Clear Hash");
    }
}
