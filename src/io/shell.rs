// Copyright (c) 2023 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! The shell sub-language for hatch configuration: one `hatch`
//! command per line, tokens recognized by shape rather than position.

use crate::error::{Error, Result};
use crate::vectorize::HatchSetting;

const MODE_CHARS: [&str; 6] = ["/", "\\", "|", "-", "+", "x"];

/// One parsed `hatch` line: the target color (or `_` for the
/// wildcard) and the settings it updates.
#[derive(Debug, Clone, PartialEq)]
pub struct HatchCommand {
    pub color: String,
    pub setting: HatchSetting,
}

/// Parses one `hatch <color_name|_> { <spacing 1..1000> | <mode char>
/// | <substitute-color-name> }*` line. Tokens are classified by shape:
/// an integer in range is a spacing, a single recognized symbol is a
/// mode, anything else is a substitute color name.
pub fn parse_hatch_line(line: &str, line_no: usize) -> Result<HatchCommand> {
    let mut tokens = line.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| Error::parse_error(line_no, "empty hatch line"))?;
    if head != "hatch" {
        return Err(Error::parse_error(line_no, "expected 'hatch' command"));
    }
    let color = tokens
        .next()
        .ok_or_else(|| Error::parse_error(line_no, "hatch command needs a color"))?
        .to_string();

    let mut setting = HatchSetting::default();
    for token in tokens {
        if let Ok(spacing) = token.parse::<i64>() {
            if !(1..=1000).contains(&spacing) {
                return Err(Error::parse_error(
                    line_no,
                    format!("hatch spacing {spacing} out of range 1..=1000"),
                ));
            }
            setting.spacing = Some(spacing);
        } else if MODE_CHARS.contains(&token) {
            setting.mode = Some(token.to_string());
        } else {
            setting.substitute_color = Some(token.to_string());
        }
    }
    Ok(HatchCommand { color, setting })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spacing_and_mode() {
        let cmd = parse_hatch_line("hatch red 4 /", 1).unwrap();
        assert_eq!(cmd.color, "red");
        assert_eq!(cmd.setting.spacing, Some(4));
        assert_eq!(cmd.setting.mode.as_deref(), Some("/"));
    }

    #[test]
    fn parses_substitute_color_name() {
        let cmd = parse_hatch_line("hatch _ blue", 1).unwrap();
        assert_eq!(cmd.color, "_");
        assert_eq!(cmd.setting.substitute_color.as_deref(), Some("blue"));
    }

    #[test]
    fn rejects_spacing_out_of_range() {
        assert!(parse_hatch_line("hatch red 5000", 1).is_err());
    }

    #[test]
    fn rejects_missing_color() {
        assert!(parse_hatch_line("hatch", 1).is_err());
    }
}
