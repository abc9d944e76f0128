// Message types for the two command channels and the state topic

use serde::{Deserialize, Serialize};

/// Error produced while parsing a directional command query.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandError {
    // Exact wording is part of the command interface
    #[error("Missing dir parameter.")]
    MissingDir,
}

/// Directional command, as carried by a `/cmd/move` query string.
///
/// `steps` scales phase duration and is always >= 1. `m1`/`m2` are raw
/// speed overrides, only meaningful for `dir=custom`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionCommand {
    pub dir: String,
    pub steps: u32,
    pub m1: Option<i32>,
    pub m2: Option<i32>,
}

impl DirectionCommand {
    /// Parse a `key=value&key=value` query string.
    ///
    /// `dir` is required; everything else is defaulted when missing or
    /// malformed (`steps=abc` -> 1, `steps=-3` -> 1). `+`/`%20` in values
    /// become spaces so multi-word directions survive URL encoding.
    pub fn from_query(query: &str) -> Result<Self, CommandError> {
        let mut dir: Option<String> = None;
        let mut steps: u32 = 1;
        let mut m1 = None;
        let mut m2 = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.replace('+', " ").replace("%20", " ");
            match key {
                "dir" => dir = Some(value.trim().to_ascii_lowercase()),
                "steps" => {
                    steps = value
                        .trim()
                        .parse::<i64>()
                        .map(|n| n.clamp(1, u32::MAX as i64) as u32)
                        .unwrap_or(1);
                }
                "m1" => m1 = value.trim().parse().ok(),
                "m2" => m2 = value.trim().parse().ok(),
                _ => {}
            }
        }

        let dir = dir.filter(|d| !d.is_empty()).ok_or(CommandError::MissingDir)?;
        Ok(Self { dir, steps, m1, m2 })
    }
}

/// One joystick sample from the analog control stream.
///
/// Both axes are nominally in [-100, 100]; the interpreter clamps rather
/// than trusting the producer.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JoystickSample {
    pub x: i32,
    pub y: i32,
}

/// Last speed values actually sent to the joints. Starts at rest and is
/// updated by whichever path (joystick or executor) issues a command.
/// Also the payload of the wheel-state topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveState {
    pub left: i32,
    pub right: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let cmd = DirectionCommand::from_query("dir=forward&steps=2").unwrap();
        assert_eq!(cmd.dir, "forward");
        assert_eq!(cmd.steps, 2);
        assert_eq!(cmd.m1, None);
        assert_eq!(cmd.m2, None);
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let err = DirectionCommand::from_query("steps=2").unwrap_err();
        assert_eq!(err, CommandError::MissingDir);
        assert_eq!(err.to_string(), "Missing dir parameter.");

        // An empty value counts as missing too
        assert_eq!(
            DirectionCommand::from_query("dir=&steps=2").unwrap_err(),
            CommandError::MissingDir
        );
        assert_eq!(
            DirectionCommand::from_query("").unwrap_err(),
            CommandError::MissingDir
        );
    }

    #[test]
    fn test_steps_defaulting() {
        // Non-numeric and non-positive both fall back to 1
        let cmd = DirectionCommand::from_query("dir=forward&steps=abc").unwrap();
        assert_eq!(cmd.steps, 1);
        let cmd = DirectionCommand::from_query("dir=forward&steps=-3").unwrap();
        assert_eq!(cmd.steps, 1);
        let cmd = DirectionCommand::from_query("dir=forward&steps=0").unwrap();
        assert_eq!(cmd.steps, 1);
        let cmd = DirectionCommand::from_query("dir=forward").unwrap();
        assert_eq!(cmd.steps, 1);
    }

    #[test]
    fn test_custom_overrides() {
        let cmd = DirectionCommand::from_query("dir=custom&m1=150&m2=-150").unwrap();
        assert_eq!(cmd.m1, Some(150));
        assert_eq!(cmd.m2, Some(-150));

        // Malformed overrides stay absent, never rejected
        let cmd = DirectionCommand::from_query("dir=custom&m1=fast").unwrap();
        assert_eq!(cmd.m1, None);
    }

    #[test]
    fn test_url_style_values() {
        let cmd = DirectionCommand::from_query("dir=go+left").unwrap();
        assert_eq!(cmd.dir, "go left");
        let cmd = DirectionCommand::from_query("dir=Turn%20Around").unwrap();
        assert_eq!(cmd.dir, "turn around");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let cmd = DirectionCommand::from_query("dir=stop&token=abc123").unwrap();
        assert_eq!(cmd.dir, "stop");
    }

    #[test]
    fn test_stick_sample_decodes() {
        let sample: JoystickSample = serde_json::from_str(r#"{"x":-20,"y":60}"#).unwrap();
        assert_eq!(sample.x, -20);
        assert_eq!(sample.y, 60);
    }
}
