use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What kind of session the user is running. Drives the default duration
/// and how statistics are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Writing,
    Researching,
    Creative,
    Roaming,
}

impl SessionMode {
    pub const ALL: [SessionMode; 4] = [
        SessionMode::Writing,
        SessionMode::Researching,
        SessionMode::Creative,
        SessionMode::Roaming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Writing => "writing",
            SessionMode::Researching => "researching",
            SessionMode::Creative => "creative",
            SessionMode::Roaming => "roaming",
        }
    }

    /// Default countdown length in minutes.
    pub fn default_minutes(&self) -> u32 {
        match self {
            SessionMode::Writing => 25,
            SessionMode::Researching => 45,
            SessionMode::Creative => 15,
            SessionMode::Roaming => 60,
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SessionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Researching".parse::<SessionMode>(), Ok(SessionMode::Researching));
        assert_eq!(" roaming ".parse::<SessionMode>(), Ok(SessionMode::Roaming));
        assert_eq!(
            "sleeping".parse::<SessionMode>(),
            Err(ValidationError::UnknownMode("sleeping".into()))
        );
    }

    #[test]
    fn default_minutes_per_mode() {
        let minutes: Vec<u32> = SessionMode::ALL.iter().map(|m| m.default_minutes()).collect();
        assert_eq!(minutes, vec![25, 45, 15, 60]);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SessionMode::Creative).unwrap(), "\"creative\"");
    }
}
