//! Parsers that turn raw generator text into typed agent responses.
//!
//! JSON is the preferred shape for every phase except implementation, where
//! the model emits one fenced code block per file. Each parser also accepts
//! the labelled plain-text layout models fall back to when they ignore the
//! JSON instruction.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::types::{
    Blueprint, ClarifyResponse, Complexity, FileSet, GuideResponse, ImplementResponse,
    PlanResponse, ValidateResponse, Verdict,
};
use super::PhaseKind;
use crate::errors::SchemaViolation;
use crate::util::{extract_json_object, fenced_block};

/// `### game.js`, `**game.js**`, `FILE: game.js` or `--- game.js ---`
/// followed by a fenced block.
static FILE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^[ \t]*(?:#{2,4}[ \t]*|\*\*[ \t]*|(?i:file):[ \t]*|---[ \t]*)`?([A-Za-z0-9_.\-]+\.[A-Za-z0-9]+)`?[ \t]*(?:\*\*|---)?[ \t]*\r?\n```[A-Za-z]*[ \t]*\r?\n(.*?)```",
    )
    .expect("valid file block regex")
});

static LANG_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(html|css|javascript|js)[ \t]*\r?\n(.*?)```")
        .expect("valid language block regex")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+?)\s*$").expect("valid list item regex")
});

fn violation(phase: PhaseKind, message: impl Into<String>) -> SchemaViolation {
    SchemaViolation::new(phase, message)
}

fn json_payload(text: &str) -> Option<serde_json::Value> {
    let candidate = fenced_block(text, "json")
        .map(str::to_string)
        .or_else(|| extract_json_object(text))?;
    serde_json::from_str(&candidate).ok()
}

// ── clarify ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawClarify {
    game_type: String,
    complexity: String,
    #[serde(default)]
    questions: Vec<String>,
}

pub fn parse_clarify(text: &str) -> Result<ClarifyResponse, SchemaViolation> {
    let phase = PhaseKind::Clarify;

    let (game_type, complexity, questions) = match json_payload(text)
        .and_then(|v| serde_json::from_value::<RawClarify>(v).ok())
    {
        Some(raw) => (raw.game_type, raw.complexity, raw.questions),
        None => parse_clarify_labelled(text)
            .ok_or_else(|| violation(phase, "no clarification payload found"))?,
    };

    let complexity: Complexity = complexity.parse().map_err(|e| violation(phase, e))?;
    Ok(ClarifyResponse {
        game_type,
        complexity,
        questions,
    })
}

/// `COMPLEXITY:` / `GAME_TYPE:` / `QUESTIONS:` followed by a numbered list.
fn parse_clarify_labelled(text: &str) -> Option<(String, String, Vec<String>)> {
    let mut complexity = None;
    let mut game_type = None;
    let mut questions = Vec::new();
    let mut in_questions = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("COMPLEXITY:") {
            complexity = Some(rest.trim().to_string());
            in_questions = false;
        } else if let Some(rest) = trimmed.strip_prefix("GAME_TYPE:") {
            game_type = Some(rest.trim().to_string());
            in_questions = false;
        } else if trimmed.starts_with("QUESTIONS:") {
            in_questions = true;
        } else if in_questions && let Some(caps) = LIST_ITEM.captures(trimmed) {
            questions.push(caps[1].to_string());
        }
    }

    Some((game_type?, complexity?, questions))
}

// ── plan ────────────────────────────────────────────────────────────────

pub fn parse_plan(text: &str) -> Result<PlanResponse, SchemaViolation> {
    let phase = PhaseKind::Plan;
    let value = json_payload(text).ok_or_else(|| violation(phase, "no JSON blueprint found"))?;

    // Accept both a bare section map and one wrapped in {"blueprint": {...}}.
    let value = match value {
        serde_json::Value::Object(mut map) if map.len() == 1 && map.contains_key("blueprint") => {
            map.remove("blueprint").unwrap_or_default()
        }
        other => other,
    };

    let sections: BTreeMap<String, serde_json::Value> = serde_json::from_value(value)
        .map_err(|e| violation(phase, format!("blueprint is not a JSON object: {}", e)))?;
    Ok(PlanResponse {
        blueprint: Blueprint::from_sections(sections),
    })
}

// ── implement ───────────────────────────────────────────────────────────

/// Extract files from labelled fenced blocks.
///
/// When a block is not labelled, the conventional file name for its language
/// (`index.html`, `style.css`, `game.js`) is used if not already present.
/// Labelled blocks never feed the fallback.
pub fn parse_implement(text: &str) -> Result<ImplementResponse, SchemaViolation> {
    let mut files = FileSet::new();
    let mut labelled = Vec::new();

    for caps in FILE_BLOCK.captures_iter(text) {
        let name = caps[1].trim().to_string();
        let body = caps[2].trim().to_string();
        files.insert(name, body);
        if let Some(m) = caps.get(0) {
            labelled.push(m.range());
        }
    }

    for caps in LANG_BLOCK.captures_iter(text) {
        let Some(block) = caps.get(0) else { continue };
        if labelled.iter().any(|r| r.contains(&block.start())) {
            continue;
        }
        let name = match &caps[1] {
            "html" => "index.html",
            "css" => "style.css",
            _ => "game.js",
        };
        if !files.contains_key(name) {
            files.insert(name.to_string(), caps[2].trim().to_string());
        }
    }

    if files.is_empty() {
        return Err(violation(
            PhaseKind::Implement,
            "no fenced file blocks found in output",
        ));
    }
    Ok(ImplementResponse { files })
}

// ── validate ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawValidation {
    verdict: String,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    logic_issues: Vec<String>,
    #[serde(default)]
    missing_features: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl RawValidation {
    fn into_response(self) -> Result<ValidateResponse, SchemaViolation> {
        let verdict: Verdict = self
            .verdict
            .parse()
            .map_err(|e| violation(PhaseKind::Validate, e))?;

        let mut feedback = Vec::new();
        let categories = [
            ("Error", self.errors),
            ("Logic issue", self.logic_issues),
            ("Missing feature", self.missing_features),
        ];
        for (label, items) in categories {
            feedback.extend(
                items
                    .into_iter()
                    .filter(|i| !is_none_marker(i))
                    .map(|i| format!("{}: {}", label, i.trim())),
            );
        }
        // Notes accompany a failure; on PASS they are only sign-off text.
        if verdict == Verdict::Fail
            && let Some(notes) = self.notes.filter(|n| !n.trim().is_empty())
        {
            feedback.push(format!("Note: {}", notes.trim()));
        }

        Ok(ValidateResponse {
            verdict,
            feedback,
            suggestions: self
                .suggestions
                .into_iter()
                .filter(|s| !is_none_marker(s))
                .collect(),
        })
    }
}

fn is_none_marker(item: &str) -> bool {
    let t = item.trim();
    t.is_empty() || t.eq_ignore_ascii_case("none")
}

pub fn parse_validate(text: &str) -> Result<ValidateResponse, SchemaViolation> {
    let raw = match json_payload(text).and_then(|v| serde_json::from_value(v).ok()) {
        Some(raw) => raw,
        None => parse_validate_labelled(text).ok_or_else(|| {
            violation(PhaseKind::Validate, "no verdict found in validation output")
        })?,
    };
    raw.into_response()
}

/// `VALIDATION_STATUS:` report with bulleted `ERRORS`, `LOGIC_ISSUES`,
/// `MISSING_FEATURES`, `IMPROVEMENT_SUGGESTIONS` and a free-text
/// `FEEDBACK_FOR_DEVELOPER` section.
fn parse_validate_labelled(text: &str) -> Option<RawValidation> {
    #[derive(Clone, Copy)]
    enum Section {
        Errors,
        Logic,
        Missing,
        Suggestions,
        Notes,
    }

    let mut raw = RawValidation {
        verdict: String::new(),
        errors: Vec::new(),
        logic_issues: Vec::new(),
        missing_features: Vec::new(),
        suggestions: Vec::new(),
        notes: None,
    };
    let mut section = None;
    let mut notes = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("VALIDATION_STATUS:") {
            raw.verdict = rest.trim().trim_matches(['<', '>', '*']).to_string();
            section = None;
            continue;
        }
        let heading = [
            ("ERRORS", Section::Errors),
            ("LOGIC_ISSUES", Section::Logic),
            ("MISSING_FEATURES", Section::Missing),
            ("IMPROVEMENT_SUGGESTIONS", Section::Suggestions),
            ("FEEDBACK_FOR_DEVELOPER", Section::Notes),
        ]
        .into_iter()
        .find(|(label, _)| trimmed.starts_with(label));
        if let Some((_, s)) = heading {
            section = Some(s);
            continue;
        }

        match section {
            Some(Section::Notes) if !trimmed.is_empty() => {
                if !notes.is_empty() {
                    notes.push(' ');
                }
                notes.push_str(trimmed);
            }
            Some(s) => {
                if let Some(caps) = LIST_ITEM.captures(trimmed) {
                    let item = caps[1].to_string();
                    match s {
                        Section::Errors => raw.errors.push(item),
                        Section::Logic => raw.logic_issues.push(item),
                        Section::Missing => raw.missing_features.push(item),
                        Section::Suggestions => raw.suggestions.push(item),
                        Section::Notes => {}
                    }
                }
            }
            None => {}
        }
    }

    if raw.verdict.is_empty() {
        return None;
    }
    if !notes.is_empty() {
        raw.notes = Some(notes);
    }
    Some(raw)
}

// ── guide ───────────────────────────────────────────────────────────────

pub fn parse_guide(text: &str) -> Result<GuideResponse, SchemaViolation> {
    let body = fenced_block(text, "markdown").unwrap_or(text).trim();
    if body.is_empty() {
        return Err(violation(PhaseKind::Guide, "empty run guide"));
    }
    Ok(GuideResponse {
        instructions: body.to_string(),
    })
}
