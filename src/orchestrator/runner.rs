use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::gate::{self, GateOutcome};
use super::machine::{PipelineMachine, PipelineStage, StageEvent};
use super::outcome::{BuildOutcome, DegradedSuccess, FailureReason};
use super::state::{BuildState, FinalStatus};
use super::MAX_ITERATIONS;
use crate::agent::{AgentPort, FileSet, PhaseKind};
use crate::config::Config;
use crate::errors::{OrchestratorError, PhaseError};
use crate::gates::AnswerSource;
use crate::phase;
use crate::sink::{ArtifactSet, ArtifactSink, BuildReport};
use crate::ui::BuildUI;

/// Knobs that change what a build produces, not how it is sequenced.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Ask for a player guide after a successful build.
    pub run_guide: bool,
    /// File names every Implement response must contain.
    pub required_files: Vec<String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            run_guide: true,
            required_files: crate::smith_config::default_required_files(),
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            run_guide: config.run_guide,
            required_files: config.required_files.clone(),
        }
    }
}

/// Drives one build from prompt to artifact handoff.
pub struct Orchestrator {
    port: Arc<dyn AgentPort>,
    sink: Arc<dyn ArtifactSink>,
    ui: Option<Arc<BuildUI>>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        port: Arc<dyn AgentPort>,
        sink: Arc<dyn ArtifactSink>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            port,
            sink,
            ui: None,
            options,
        }
    }

    pub fn with_ui(mut self, ui: Arc<BuildUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Run the pipeline to a terminal stage and hand the result to the sink.
    ///
    /// Generation failures and a closed answer channel end the build FAILED
    /// and are reported in the outcome. An `Err` means a contract was broken
    /// (or the sink failed) and no outcome exists.
    pub async fn run(
        &self,
        prompt: &str,
        answers: &mut dyn AnswerSource,
    ) -> Result<BuildOutcome, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = BuildState::new(prompt);
        let mut machine = PipelineMachine::new();
        let mut failure: Option<FailureReason> = None;

        info!(%run_id, "Build started");
        if let Some(ui) = &self.ui {
            ui.print_banner(prompt);
        }

        while !machine.stage().is_terminal() {
            let iteration = state.iteration_count();
            match machine.stage() {
                PipelineStage::Init => {
                    machine.fire(StageEvent::PromptReceived, iteration)?;
                }
                PipelineStage::Clarifying => {
                    self.start(PhaseKind::Clarify, "Analyzing your game idea");
                    match phase::clarify::run(self.port.as_ref(), &mut state).await {
                        Ok(()) => {
                            self.done(
                                PhaseKind::Clarify,
                                &format!("{} questions", state.questions()?.len()),
                            );
                            machine.fire(StageEvent::Clarified, iteration)?;
                        }
                        Err(e) => failure = Some(self.fatal(&mut machine, e, iteration)?),
                    }
                }
                PipelineStage::AwaitingAnswers => {
                    if let Some(ui) = &self.ui {
                        ui.show_questions(
                            state.game_type()?,
                            state.complexity()?,
                            state.questions()?.len(),
                        );
                    }
                    match gate::collect_answers(&mut state, answers, self.ui.as_deref()).await? {
                        GateOutcome::Complete => {
                            machine.fire(StageEvent::AnswersCollected, iteration)?;
                        }
                        GateOutcome::Closed { answered, expected } => {
                            let reason =
                                FailureReason::IncompleteClarification { answered, expected };
                            if let Some(ui) = &self.ui {
                                ui.warn(&reason.to_string());
                            }
                            failure = Some(reason);
                            machine.fire(StageEvent::InputClosed, iteration)?;
                        }
                    }
                }
                PipelineStage::Planning => {
                    self.start(PhaseKind::Plan, "Drafting the technical blueprint");
                    match phase::plan::run(self.port.as_ref(), &mut state).await {
                        Ok(()) => {
                            self.done(
                                PhaseKind::Plan,
                                &format!("{} sections", state.blueprint()?.sections().len()),
                            );
                            machine.fire(StageEvent::Planned, iteration)?;
                        }
                        Err(e) => failure = Some(self.fatal(&mut machine, e, iteration)?),
                    }
                }
                PipelineStage::Implementing => {
                    self.start(
                        PhaseKind::Implement,
                        &format!(
                            "Writing game code (iteration {}/{})",
                            iteration + 1,
                            MAX_ITERATIONS
                        ),
                    );
                    if iteration > 0
                        && let Some(ui) = &self.ui
                    {
                        ui.log_step(&format!(
                            "Addressing {} review finding(s)",
                            state.feedback().len()
                        ));
                    }
                    match phase::implement::run(
                        self.port.as_ref(),
                        &mut state,
                        &self.options.required_files,
                    )
                    .await
                    {
                        Ok(current) => {
                            self.done(
                                PhaseKind::Implement,
                                &format!("{} files", state.files()?.len()),
                            );
                            machine.fire(StageEvent::FilesGenerated, current)?;
                        }
                        Err(e) => {
                            let current = state.iteration_count();
                            failure = Some(self.fatal(&mut machine, e, current)?);
                        }
                    }
                }
                PipelineStage::Validating => {
                    self.start(PhaseKind::Validate, "Reviewing the generated game");
                    match phase::validate::run(self.port.as_ref(), &mut state).await {
                        Ok(verdict) => {
                            if let Some(ui) = &self.ui {
                                ui.show_verdict(
                                    verdict,
                                    iteration,
                                    MAX_ITERATIONS,
                                    state.feedback(),
                                );
                            }
                            machine.fire(
                                StageEvent::Validated {
                                    pass: verdict.is_pass(),
                                    iteration,
                                },
                                iteration,
                            )?;
                        }
                        Err(e) => failure = Some(self.fatal(&mut machine, e, iteration)?),
                    }
                }
                PipelineStage::Finalizing => {
                    let last_pass = state.verdict()?.is_pass();
                    let status = if last_pass {
                        FinalStatus::Success
                    } else {
                        FinalStatus::SuccessWithWarning
                    };
                    state.finalize(status)?;
                    machine.fire(StageEvent::Finalized { last_pass }, iteration)?;
                }
                PipelineStage::Succeeded
                | PipelineStage::SucceededWithWarning
                | PipelineStage::Failed => {}
            }
        }

        let status = match machine.stage() {
            PipelineStage::Succeeded => FinalStatus::Success,
            PipelineStage::SucceededWithWarning => FinalStatus::SuccessWithWarning,
            _ => {
                state.finalize(FinalStatus::Failed)?;
                FinalStatus::Failed
            }
        };

        let degraded = (status == FinalStatus::SuccessWithWarning).then(|| {
            let d = DegradedSuccess {
                iterations: state.iteration_count(),
                outstanding_feedback: state.feedback().to_vec(),
            };
            warn!(
                iterations = d.iterations,
                outstanding = d.outstanding_feedback.len(),
                "Iterations exhausted without a passing review; delivering last attempt"
            );
            d
        });

        let guide = if status != FinalStatus::Failed && self.options.run_guide {
            Some(self.write_guide(&state).await)
        } else {
            None
        };

        let delivered = match status {
            FinalStatus::Failed => FileSet::new(),
            _ => state.files()?.clone(),
        };
        let transitions = machine.into_transitions();
        let report = BuildReport::new(
            run_id,
            started_at,
            &state,
            status,
            failure.clone(),
            transitions.clone(),
            &delivered,
        );

        let artifacts = ArtifactSet {
            files: delivered,
            status,
            guide: guide.clone(),
            report: report.clone(),
        };
        self.sink
            .deliver(&artifacts)
            .map_err(OrchestratorError::Sink)?;

        info!(
            %run_id,
            status = %status,
            iterations = state.iteration_count(),
            "Build finished"
        );

        Ok(BuildOutcome {
            status,
            state,
            failure,
            degraded,
            transitions,
            guide,
            report,
        })
    }

    /// Route a phase error: agent failures end the build, contract
    /// violations abort the run.
    fn fatal(
        &self,
        machine: &mut PipelineMachine,
        err: PhaseError,
        iteration: u32,
    ) -> Result<FailureReason, OrchestratorError> {
        match err {
            PhaseError::Agent(e) => {
                let phase = e.phase();
                error!(%phase, error = %e, "Phase failed");
                if let Some(ui) = &self.ui {
                    ui.phase_failed(phase, &e.to_string());
                }
                machine.fire(StageEvent::Fatal, iteration)?;
                Ok(FailureReason::GenerationFailure {
                    phase,
                    detail: e.to_string(),
                })
            }
            PhaseError::State(e) => Err(OrchestratorError::State(e)),
        }
    }

    async fn write_guide(&self, state: &BuildState) -> String {
        self.start(PhaseKind::Guide, "Writing the play guide");
        match phase::guide::run(self.port.as_ref(), state).await {
            Ok(text) => {
                self.done(PhaseKind::Guide, "PLAYING.md");
                text
            }
            Err(e) => {
                warn!(error = %e, "Guide generation failed; using the built-in guide");
                if let Some(ui) = &self.ui {
                    ui.phase_failed(PhaseKind::Guide, "using the built-in guide");
                }
                phase::guide::fallback_guide(state)
            }
        }
    }

    fn start(&self, phase: PhaseKind, detail: &str) {
        info!(%phase, "Phase started");
        if let Some(ui) = &self.ui {
            ui.start_phase(phase, detail);
        }
    }

    fn done(&self, phase: PhaseKind, summary: &str) {
        if let Some(ui) = &self.ui {
            ui.phase_done(phase, summary);
        }
    }
}
