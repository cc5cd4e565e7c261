//! Prompt rendering for each agent phase.
//!
//! Every system prompt opens with "You are the <role>." so transcripts and
//! process listings show which phase a call belongs to.

use std::fmt::Write as _;

use super::types::{
    ClarifyRequest, GuideRequest, ImplementRequest, PlanRequest, ValidateRequest,
};
use super::{AgentRequest, PhaseKind};
use crate::generator::Prompt;

pub fn render(request: &AgentRequest) -> Prompt {
    let phase = request.phase();
    let system = format!("You are the {}. {}", phase.role(), persona(phase));
    let user = match request {
        AgentRequest::Clarify(r) => clarify(r),
        AgentRequest::Plan(r) => plan(r),
        AgentRequest::Implement(r) => implement(r),
        AgentRequest::Validate(r) => validate(r),
        AgentRequest::Guide(r) => guide(r),
    };
    Prompt::new(system, user)
}

fn persona(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Clarify => {
            "You are a senior game designer who spots ambiguity in game ideas and asks \
             minimal, targeted questions. Never vague, never redundant."
        }
        PhaseKind::Plan => {
            "You architect browser games in HTML, CSS and JavaScript. You think in game \
             loops, state machines and rendering pipelines, and your blueprints leave \
             nothing vague."
        }
        PhaseKind::Implement => {
            "You write complete, working browser game code that follows a blueprint \
             exactly. No placeholders, no TODOs, no external assets."
        }
        PhaseKind::Validate => {
            "You review browser game code by tracing every execution path. You cite exact \
             problems and pass good code without nitpicking."
        }
        PhaseKind::Guide => {
            "You write short, friendly instructions that tell a player how to open and \
             play a generated browser game."
        }
    }
}

fn clarify(r: &ClarifyRequest) -> String {
    format!(
        r#"Analyze this browser game idea.

GAME IDEA:
"{prompt}"

1. Identify the game type (platformer, shooter, puzzle, arcade, RPG, ...).
2. Rate complexity: "low" (single mechanic), "medium" (several mechanics) or "high" (complex systems).
3. Ask between 3 and 7 targeted clarification questions about things that are genuinely
   ambiguous, would change the implementation and cannot reasonably be assumed
   (controls, win/lose conditions, scoring, levels, visual style, difficulty, mobile support).

Respond with only this JSON object:
{{"game_type": "<type>", "complexity": "<low|medium|high>", "questions": ["<question>", "..."]}}
"#,
        prompt = r.prompt.trim()
    )
}

fn qa_block(questions: &[String], answers: &[String]) -> String {
    let mut out = String::new();
    for (i, q) in questions.iter().enumerate() {
        let a = answers.get(i).map(String::as_str).unwrap_or("");
        let _ = writeln!(out, "Q{}: {}\nA{}: {}", i + 1, q, i + 1, a);
    }
    out
}

fn plan(r: &PlanRequest) -> String {
    format!(
        r#"Produce a complete technical blueprint for this browser game. The developer will
implement exactly what you specify.

=== REQUIREMENTS ===
Idea: {prompt}
Game type: {game_type}
Complexity: {complexity}

Clarifications:
{qa}
=== DELIVERABLE ===
Respond with only a JSON object whose keys are blueprint sections. These keys are required
and must not be empty:
- "rendering": canvas or DOM approach, draw order, layering, animation loop
- "entities": every class or object with its properties and methods
- "game_loop": per-frame update order (input, physics, collision, render, UI) and target FPS
- "win_lose_conditions": exact triggers for winning, losing and scoring
- "controls": every key, mouse or touch event and the action it maps to
- "edge_cases": at least five edge cases the code must handle

You may add: "framework", "file_structure", "state_management", "assets", "html_structure".
Use canvas shapes and CSS only, no external image files.
"#,
        prompt = r.prompt.trim(),
        game_type = r.game_type,
        complexity = r.complexity,
        qa = qa_block(&r.questions, &r.answers),
    )
}

fn implement(r: &ImplementRequest) -> String {
    let mut out = format!(
        r#"Implement this {complexity}-complexity {game_type} browser game following the
blueprint EXACTLY.

=== BLUEPRINT ===
{blueprint}
"#,
        complexity = r.complexity,
        game_type = r.game_type,
        blueprint = r.blueprint.to_prompt_text()
    );

    if let Some(feedback) = &r.prior_feedback {
        let _ = write!(
            out,
            "\n=== VALIDATION FEEDBACK (iteration {}) ===\nThe previous implementation had these issues that MUST be fixed:\n",
            r.iteration.saturating_sub(1)
        );
        for item in feedback {
            let _ = writeln!(out, "- {}", item);
        }
        out.push_str("Address ALL issues above without introducing new bugs.\n");
    }

    let files = r.required_files.join(", ");
    let _ = write!(
        out,
        r#"
=== TASK ===
Generate these complete files: {files}.

Rules:
1. Opening index.html in a browser must start the game with no build step.
2. All game logic goes in the script file; the stylesheet only styles.
3. Draw with canvas shapes or CSS; no external images.
4. Show a start screen, a live score and a game over screen with restart.
5. Use requestAnimationFrame for the game loop unless the blueprint says otherwise.

Output each file as a heading with its file name followed by one fenced code block:

### index.html
```html
...
```

Do not write any explanation outside the code blocks.
"#
    );
    out
}

fn validate(r: &ValidateRequest) -> String {
    let mut files = String::new();
    for (name, content) in &r.files {
        let _ = write!(files, "\n--- {} ---\n{}\n", name, content);
    }
    format!(
        r#"Validate this generated browser game against its blueprint.

=== BLUEPRINT ===
{blueprint}

=== GENERATED FILES ===
{files}
=== CHECKLIST ===
- Files complete; index.html loads the stylesheet and script
- No syntax errors; every called function and used variable is defined
- A working game loop with separate update and render
- Controls, start screen, score display and game over all work
- Every mechanic in the blueprint is implemented
- The game would run in a browser without errors or infinite loops

Respond with only this JSON object:
{{"verdict": "PASS|FAIL",
  "errors": ["<critical issue that breaks the game>"],
  "logic_issues": ["<wrong behavior that does not crash>"],
  "missing_features": ["<blueprint item not implemented>"],
  "suggestions": ["<non-blocking improvement, at most 3>"],
  "notes": "<consolidated instructions for the developer>"}}
A FAIL verdict must list at least one error, logic issue or missing feature.
"#,
        blueprint = r.blueprint.to_prompt_text(),
    )
}

fn guide(r: &GuideRequest) -> String {
    format!(
        r#"A {complexity}-complexity {game_type} browser game was generated for this idea:
"{prompt}"

Files: {files}

Controls from the blueprint:
{controls}

Write a short markdown guide for the player: how to open the game locally (directly or
with a simple static file server), the controls, and the goal. Respond with only the
markdown.
"#,
        complexity = r.complexity,
        game_type = r.game_type,
        prompt = r.prompt.trim(),
        files = r.file_names.join(", "),
        controls = r
            .blueprint
            .section("controls")
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "(not specified)".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::{Blueprint, Complexity, FileSet};

    fn implement_request(feedback: Option<Vec<String>>, iteration: u32) -> AgentRequest {
        AgentRequest::Implement(ImplementRequest {
            game_type: "arcade".into(),
            complexity: Complexity::Low,
            blueprint: Blueprint::default(),
            prior_feedback: feedback,
            iteration,
            required_files: vec!["index.html".into(), "game.js".into()],
        })
    }

    #[test]
    fn system_prompt_names_role() {
        let p = render(&AgentRequest::Clarify(ClarifyRequest {
            prompt: "snake".into(),
        }));
        assert!(p.system.starts_with("You are the Requirements Analyst."));
        assert!(p.user.contains("\"snake\""));
    }

    #[test]
    fn first_implementation_has_no_feedback_section() {
        let p = render(&implement_request(None, 1));
        assert!(!p.user.contains("VALIDATION FEEDBACK"));
        assert!(p.user.contains("index.html, game.js"));
    }

    #[test]
    fn retry_lists_feedback_items() {
        let p = render(&implement_request(
            Some(vec!["Error: score never resets".into()]),
            2,
        ));
        assert!(p.user.contains("VALIDATION FEEDBACK (iteration 1)"));
        assert!(p.user.contains("- Error: score never resets"));
    }

    #[test]
    fn plan_prompt_pairs_questions_with_answers() {
        let p = render(&AgentRequest::Plan(PlanRequest {
            prompt: "pong".into(),
            game_type: "arcade".into(),
            complexity: Complexity::Low,
            questions: vec!["Two players?".into()],
            answers: vec!["Yes".into()],
        }));
        assert!(p.user.contains("Q1: Two players?\nA1: Yes"));
        assert!(p.user.contains("\"win_lose_conditions\""));
    }

    #[test]
    fn validate_prompt_embeds_files() {
        let mut files = FileSet::new();
        files.insert("game.js".into(), "let score = 0;".into());
        let p = render(&AgentRequest::Validate(ValidateRequest {
            files,
            blueprint: Blueprint::default(),
        }));
        assert!(p.system.contains("QA Reviewer"));
        assert!(p.user.contains("--- game.js ---\nlet score = 0;"));
    }
}
