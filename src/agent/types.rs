//! Request and response payloads for each agent phase.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Generated game files, keyed by file name.
pub type FileSet = BTreeMap<String, String>;

/// How complex the requested game is, as judged by the clarifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// A single core mechanic
    Low,
    /// Several interacting mechanics
    Medium,
    /// Complex systems (levels, AI, progression)
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
        }
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(format!(
                "invalid complexity '{}', expected low, medium or high",
                other
            )),
        }
    }
}

/// Verdict of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PASS" => Ok(Verdict::Pass),
            "FAIL" => Ok(Verdict::Fail),
            other => Err(format!("invalid verdict '{}', expected PASS or FAIL", other)),
        }
    }
}

/// The technical plan produced by the planner.
///
/// Its contents are opaque to the pipeline apart from the sections listed in
/// [`Blueprint::REQUIRED_SECTIONS`], which must be present and non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blueprint {
    sections: BTreeMap<String, serde_json::Value>,
}

impl Blueprint {
    /// Sections every blueprint must carry.
    pub const REQUIRED_SECTIONS: [&'static str; 6] = [
        "rendering",
        "entities",
        "game_loop",
        "win_lose_conditions",
        "controls",
        "edge_cases",
    ];

    pub fn from_sections(sections: BTreeMap<String, serde_json::Value>) -> Self {
        Self { sections }
    }

    pub fn section(&self, name: &str) -> Option<&serde_json::Value> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.sections
    }

    /// Required sections that are absent, null or empty.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        Self::REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|name| self.section(name).is_none_or(is_blank))
            .collect()
    }

    /// Pretty JSON rendering used inside prompts.
    pub fn to_prompt_text(&self) -> String {
        serde_json::to_string_pretty(&self.sections).unwrap_or_default()
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifyResponse {
    pub game_type: String,
    pub complexity: Complexity,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub prompt: String,
    pub game_type: String,
    pub complexity: Complexity,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub blueprint: Blueprint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementRequest {
    pub game_type: String,
    pub complexity: Complexity,
    pub blueprint: Blueprint,
    /// Feedback from the previous validation; `None` on the first iteration.
    pub prior_feedback: Option<Vec<String>>,
    /// 1-based iteration this request belongs to.
    pub iteration: u32,
    /// File names the generated game must consist of.
    pub required_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementResponse {
    pub files: FileSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub files: FileSet,
    pub blueprint: Blueprint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub verdict: Verdict,
    /// Blocking deficiencies; non-empty whenever the verdict is FAIL.
    pub feedback: Vec<String>,
    /// Advisory improvements that never block a PASS.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Request for the player-facing run guide written after a successful build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideRequest {
    pub prompt: String,
    pub game_type: String,
    pub complexity: Complexity,
    pub blueprint: Blueprint,
    pub file_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideResponse {
    pub instructions: String,
}
