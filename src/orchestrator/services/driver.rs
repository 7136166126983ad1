//! Orchestrator driver: one phase per step, persisted after every step.

use super::error::{OrchestratorError, OrchestratorResult};
use super::handlers::PhaseEffects;
use crate::orchestrator::{
    domain::OrchestratorPhase,
    ports::{AgentMatcher, EscalationSink, TaskDispatcher, TaskPlanner},
};
use crate::project::domain::{Project, ProjectId, ProjectStatus};
use crate::store::{CommitBatch, ports::EntityStore};
use crate::task::domain::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MINUTES, Task, TaskId, TaskStatus};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables of the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Pause after every `MONITOR` pass.
    pub monitor_interval: Duration,
    /// Upper bound on steps taken by one [`OrchestratorService::run`] call.
    pub max_loop_iterations: u32,
    /// Timeout given to planned tasks.
    pub default_timeout_minutes: u32,
    /// Retry budget given to planned tasks.
    pub default_max_retries: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(5),
            max_loop_iterations: 1000,
            default_timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            default_max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// External collaborators of the phase handlers.
#[derive(Clone)]
pub struct OrchestratorPorts {
    /// Decomposes a project during `PLAN`.
    pub planner: Arc<dyn TaskPlanner>,
    /// Decides which agents may take a task during `DELEGATE`.
    pub matcher: Arc<dyn AgentMatcher>,
    /// Receives reports during `ESCALATE`.
    pub escalations: Arc<dyn EscalationSink>,
    /// Work queue fed with assigned tasks.
    pub dispatcher: Arc<dyn TaskDispatcher>,
}

/// How a [`OrchestratorService::run`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The project reached `COMPLETE` and was finalised.
    Completed {
        /// Steps taken by this call.
        iterations: u32,
    },
    /// The project was paused or cancelled while running.
    Halted {
        /// Project status that stopped the loop.
        status: ProjectStatus,
        /// Phase the project was left at.
        phase: OrchestratorPhase,
        /// Steps taken by this call.
        iterations: u32,
    },
    /// The step budget ran out first.
    IterationLimit {
        /// Phase the project was left at.
        phase: OrchestratorPhase,
        /// Steps taken by this call.
        iterations: u32,
    },
}

/// Drives projects through `PLAN`, `DELEGATE`, `MONITOR`, `ESCALATE`,
/// `REASSIGN` and `COMPLETE`.
///
/// Every step runs the handler of the persisted phase, then commits the
/// handler's writes together with the next phase in one batch guarded on
/// the project status seen at the start of the step. Tasks assigned by the
/// step are dispatched only after that commit.
#[derive(Clone)]
pub struct OrchestratorService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    pub(super) store: Arc<S>,
    pub(super) clock: Arc<C>,
    pub(super) ports: OrchestratorPorts,
    pub(super) settings: OrchestratorSettings,
}

impl<S, C> OrchestratorService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a driver with default settings.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, ports: OrchestratorPorts) -> Self {
        Self {
            store,
            clock,
            ports,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Replaces the driver settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the driver settings.
    #[must_use]
    pub const fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    /// Runs the handler of the project's current phase and persists the
    /// phase that follows it.
    ///
    /// Stepping a project at `COMPLETE` finalises it again and keeps it
    /// there.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ProjectNotFound`] for unknown projects,
    /// [`OrchestratorError::ProjectNotRunnable`] for paused or cancelled
    /// ones, and the handler, store or dispatch error otherwise. A store
    /// conflict means the step was not applied; see
    /// [`OrchestratorError::is_conflict`].
    #[tracing::instrument(skip_all, fields(project_id = %project_id))]
    pub async fn step(&self, project_id: ProjectId) -> OrchestratorResult<OrchestratorPhase> {
        let mut project = self.load_project(project_id).await?;
        ensure_runnable(&project)?;
        let observed_status = project.status();
        let phase = project.orchestrator_phase();

        let effects = match phase {
            OrchestratorPhase::Plan => self.plan(&mut project).await?,
            OrchestratorPhase::Delegate => self.delegate(&project).await?,
            OrchestratorPhase::Monitor => self.monitor(&project).await?,
            OrchestratorPhase::Escalate => self.escalate(&project).await?,
            OrchestratorPhase::Reassign => self.reassign(&project).await?,
            OrchestratorPhase::Complete => self.complete(&mut project),
        };
        let PhaseEffects {
            state,
            batch,
            dispatch,
        } = effects;

        let next = phase.next(&state).unwrap_or(phase);
        project.advance_phase(next, &*self.clock);
        self.store
            .commit(batch.update_project_if(project, observed_status))
            .await?;

        for task_id in dispatch {
            self.ports.dispatcher.dispatch(task_id).await?;
            debug!(task_id = %task_id, "task dispatched");
        }
        info!(from = %phase, to = %next, "phase advanced");
        Ok(next)
    }

    /// Steps the project until it completes, halts or runs out of steps.
    ///
    /// A project still at `PLAN` starts there. Any other unfinished project
    /// resumes at `MONITOR`, after its stranded tasks are dispatched again.
    /// A project already at `COMPLETE` returns immediately.
    ///
    /// # Errors
    ///
    /// Returns the first step error that is not a commit conflict. Conflicts
    /// are logged and the phase is tried again.
    pub async fn run(&self, project_id: ProjectId) -> OrchestratorResult<RunOutcome> {
        let Some(mut phase) = self.resume(project_id).await? else {
            return Ok(RunOutcome::Completed { iterations: 0 });
        };

        let mut iterations: u32 = 0;
        while iterations < self.settings.max_loop_iterations {
            let project = self.load_project(project_id).await?;
            if matches!(
                project.status(),
                ProjectStatus::Paused | ProjectStatus::Cancelled
            ) {
                info!(project_id = %project_id, status = %project.status(), "run halted");
                return Ok(RunOutcome::Halted {
                    status: project.status(),
                    phase: project.orchestrator_phase(),
                    iterations,
                });
            }

            iterations = iterations.saturating_add(1);
            let executed = phase;
            match self.step(project_id).await {
                Ok(next) => phase = next,
                Err(err) if err.is_conflict() => {
                    warn!(
                        project_id = %project_id,
                        phase = %executed,
                        error = %err,
                        "step lost a commit race"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            }

            match executed {
                OrchestratorPhase::Complete => return Ok(RunOutcome::Completed { iterations }),
                OrchestratorPhase::Monitor => {
                    tokio::time::sleep(self.settings.monitor_interval).await;
                }
                _ => {}
            }
        }

        warn!(project_id = %project_id, phase = %phase, iterations, "step budget exhausted");
        Ok(RunOutcome::IterationLimit { phase, iterations })
    }

    /// Picks the phase a run starts from, or `None` when there is nothing
    /// left to do.
    async fn resume(&self, project_id: ProjectId) -> OrchestratorResult<Option<OrchestratorPhase>> {
        let mut project = self.load_project(project_id).await?;
        match project.orchestrator_phase() {
            OrchestratorPhase::Complete => return Ok(None),
            OrchestratorPhase::Plan => return Ok(Some(OrchestratorPhase::Plan)),
            phase @ (OrchestratorPhase::Delegate
            | OrchestratorPhase::Monitor
            | OrchestratorPhase::Escalate
            | OrchestratorPhase::Reassign) => {
                if !project.is_active() {
                    return Ok(Some(phase));
                }
            }
        }

        let tasks = self.store.list_project_tasks(project_id).await?;
        let stranded: Vec<TaskId> = tasks
            .iter()
            .filter(|task| is_stranded(task))
            .map(Task::id)
            .collect();

        if project.orchestrator_phase() != OrchestratorPhase::Monitor {
            let observed_status = project.status();
            project.advance_phase(OrchestratorPhase::Monitor, &*self.clock);
            self.store
                .commit(CommitBatch::new().update_project_if(project, observed_status))
                .await?;
        }
        for task_id in &stranded {
            self.ports.dispatcher.dispatch(*task_id).await?;
        }
        info!(project_id = %project_id, redispatched = stranded.len(), "run resumed at MONITOR");
        Ok(Some(OrchestratorPhase::Monitor))
    }

    pub(super) async fn load_project(&self, project_id: ProjectId) -> OrchestratorResult<Project> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(OrchestratorError::ProjectNotFound(project_id))
    }
}

/// Tasks a previous run handed out that may no longer be queued: assigned
/// tasks, and pending tasks still holding an agent while they wait for a
/// retry.
const fn is_stranded(task: &Task) -> bool {
    match task.status() {
        TaskStatus::Assigned => true,
        TaskStatus::Pending => task.assigned_agent_id().is_some(),
        _ => false,
    }
}

fn ensure_runnable(project: &Project) -> OrchestratorResult<()> {
    match project.status() {
        ProjectStatus::Paused | ProjectStatus::Cancelled => {
            Err(OrchestratorError::ProjectNotRunnable {
                project_id: project.id(),
                status: project.status(),
            })
        }
        ProjectStatus::Completed if project.orchestrator_phase() != OrchestratorPhase::Complete => {
            Err(OrchestratorError::ProjectNotRunnable {
                project_id: project.id(),
                status: project.status(),
            })
        }
        _ => Ok(()),
    }
}
