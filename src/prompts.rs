//! Review modes and their fixed instruction templates.
//!
//! Every prompt lives here so the wording can be inspected by unit tests and
//! changed in exactly one place. The templates are not user-editable: the
//! selected [`ReviewMode`] is the only input that decides which one is sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction sent with [`ReviewMode::Professional`].
pub const PROFESSIONAL_PROMPT: &str = "Create a well-organized HTML-formatted review for this resume. Include sections for Overall, Resume Format, Grammar/Spelling, Content, Style, and any other relevant areas. Ensure a visually appealing layout and provide constructive insights or recommendations where applicable. Be honest and straightforward in your feedback.";

/// Instruction sent with [`ReviewMode::Roast`].
pub const ROAST_PROMPT: &str = "Embrace your inner critic and let loose! Generate a hilariously sarcastic HTML-formatted roast for this resume. Tear apart the Overall, Resume Format, Grammar/Spelling, Content, Style, and any other aspects you find amusing. Add a touch of humor and wit, but make sure it's all in good fun. Roast away!";

/// Which instruction template frames the model request.
///
/// Exactly one mode is active per request. `Roast` is the default, matching
/// the form's initial selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Constructive, structured feedback.
    Professional,
    /// Sarcastic, humorous critique.
    #[default]
    Roast,
}

impl ReviewMode {
    /// Both modes, in the order the form lists them.
    pub const ALL: [ReviewMode; 2] = [ReviewMode::Professional, ReviewMode::Roast];

    /// The fixed instruction string for this mode.
    pub fn instruction(self) -> &'static str {
        match self {
            ReviewMode::Professional => PROFESSIONAL_PROMPT,
            ReviewMode::Roast => ROAST_PROMPT,
        }
    }

    /// Wire/form value (`professional` or `roast`).
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewMode::Professional => "professional",
            ReviewMode::Roast => "roast",
        }
    }

    /// Human label used by the form.
    pub fn label(self) -> &'static str {
        match self {
            ReviewMode::Professional => "Professional",
            ReviewMode::Roast => "Roast",
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is neither `professional` nor `roast`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown review mode '{0}' (expected 'professional' or 'roast')")]
pub struct ParseModeError(pub String);

impl FromStr for ReviewMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(ReviewMode::Professional),
            "roast" => Ok(ReviewMode::Roast),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
