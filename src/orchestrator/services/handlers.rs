//! One handler per orchestrator phase.
//!
//! Handlers read the store and return the writes they want applied; the
//! driver commits them together with the phase advance.

use super::driver::OrchestratorService;
use super::error::{OrchestratorError, OrchestratorResult};
use crate::agent::domain::{Agent, AgentId};
use crate::orchestrator::{
    domain::{OrchestratorPhase, OrchestratorState},
    ports::PlannedTask,
};
use crate::project::domain::{Project, ProjectId, ProjectStatus};
use crate::store::{CommitBatch, ports::EntityStore};
use crate::task::domain::{DependencyGraph, NewTask, Task, TaskId, TaskStatus};
use mockable::Clock;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Writes and follow-up work produced by one phase handler.
pub(super) struct PhaseEffects {
    pub(super) state: OrchestratorState,
    pub(super) batch: CommitBatch,
    pub(super) dispatch: Vec<TaskId>,
}

impl PhaseEffects {
    const fn new(state: OrchestratorState, batch: CommitBatch) -> Self {
        Self {
            state,
            batch,
            dispatch: Vec::new(),
        }
    }
}

impl<S, C> OrchestratorService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// `PLAN`: stores the planner's tasks and activates the project.
    pub(super) async fn plan(&self, project: &mut Project) -> OrchestratorResult<PhaseEffects> {
        let existing = self.store.list_project_tasks(project.id()).await?;
        let mut batch = CommitBatch::new();
        if existing.is_empty() {
            let planned = self.ports.planner.plan(project).await?;
            let tasks = self.build_plan(project.id(), &planned)?;
            info!(task_count = tasks.len(), "project planned");
            for task in tasks {
                batch = batch.insert_task(task);
            }
        } else {
            debug!(task_count = existing.len(), "project already planned");
        }
        if project.status() == ProjectStatus::Planning {
            project.activate(&*self.clock);
        }
        let state = OrchestratorState::new(project.id(), OrchestratorPhase::Plan);
        Ok(PhaseEffects::new(state, batch))
    }

    /// Turns planner output into tasks, resolving plan-local keys.
    fn build_plan(
        &self,
        project_id: ProjectId,
        planned: &[PlannedTask],
    ) -> OrchestratorResult<Vec<Task>> {
        let mut tasks = Vec::with_capacity(planned.len());
        let mut ids: HashMap<&str, TaskId> = HashMap::with_capacity(planned.len());
        for item in planned {
            let mut params = NewTask::new(project_id, item.title())
                .with_priority(item.priority())
                .with_skill_requirements(item.skill_requirements().to_vec())
                .with_timeout_minutes(self.settings.default_timeout_minutes)
                .with_max_retries(self.settings.default_max_retries);
            if let Some(description) = item.description() {
                params = params.with_description(description);
            }
            let task = Task::new(params, &*self.clock)?;
            if ids.insert(item.key(), task.id()).is_some() {
                return Err(OrchestratorError::InvalidPlan(format!(
                    "duplicate task key {}",
                    item.key()
                )));
            }
            tasks.push(task);
        }

        for (task, item) in tasks.iter_mut().zip(planned) {
            for key in item.depends_on() {
                if key == item.key() {
                    return Err(OrchestratorError::InvalidPlan(format!(
                        "task {key} depends on itself"
                    )));
                }
                let dependency_id = ids.get(key.as_str()).ok_or_else(|| {
                    OrchestratorError::InvalidPlan(format!(
                        "task {} depends on unknown key {key}",
                        item.key()
                    ))
                })?;
                task.add_dependency(*dependency_id, &*self.clock);
            }
        }

        if let Some(cycle) = DependencyGraph::from_tasks(&tasks).find_cycle() {
            return Err(OrchestratorError::InvalidPlan(format!(
                "dependency cycle among {} planned tasks",
                cycle.len()
            )));
        }
        Ok(tasks)
    }

    /// `DELEGATE`: blocks tasks waiting on dependencies and hands ready ones
    /// to free agents.
    pub(super) async fn delegate(&self, project: &Project) -> OrchestratorResult<PhaseEffects> {
        let tasks = self.store.list_project_tasks(project.id()).await?;
        let agents = self.store.list_agents().await?;
        let statuses = status_index(&tasks);

        let busy: HashSet<AgentId> = tasks
            .iter()
            .filter(|task| task.status().is_open())
            .filter_map(Task::assigned_agent_id)
            .collect();
        let mut available: Vec<&Agent> = agents
            .iter()
            .filter(|agent| agent.is_idle() && !busy.contains(&agent.id()))
            .collect();

        let mut batch = CommitBatch::new();
        let mut ready: Vec<&Task> = Vec::new();
        let unassigned_pending = tasks.iter().filter(|task| {
            task.status() == TaskStatus::Pending && task.assigned_agent_id().is_none()
        });
        for task in unassigned_pending {
            if dependencies_met(task, &statuses) {
                ready.push(task);
            } else {
                let mut blocked = task.clone();
                blocked.block(&*self.clock);
                batch = batch.update_task_if(blocked, task.revision());
                debug!(task_id = %task.id(), "task blocked on dependencies");
            }
        }
        ready.sort_by_key(|task| Reverse(task.priority()));

        let mut dispatch = Vec::new();
        for task in ready {
            let Some(position) = available
                .iter()
                .position(|agent| self.ports.matcher.matches(agent, task))
            else {
                debug!(task_id = %task.id(), "no eligible agent");
                continue;
            };
            let agent = available.remove(position);
            let mut assigned = task.clone();
            assigned.assign(agent.id(), &*self.clock);
            batch = batch.update_task_if(assigned, task.revision());
            dispatch.push(task.id());
            info!(task_id = %task.id(), agent_id = %agent.id(), "task assigned");
        }

        let state = OrchestratorState::new(project.id(), OrchestratorPhase::Delegate);
        Ok(PhaseEffects {
            state,
            batch,
            dispatch,
        })
    }

    /// `MONITOR`: unblocks tasks whose dependencies completed and snapshots
    /// the project.
    pub(super) async fn monitor(&self, project: &Project) -> OrchestratorResult<PhaseEffects> {
        let mut tasks = self.store.list_project_tasks(project.id()).await?;
        let agents = self.store.list_agents().await?;
        let statuses = status_index(&tasks);

        let mut batch = CommitBatch::new();
        for task in &mut tasks {
            if task.status() == TaskStatus::Blocked && dependencies_met(task, &statuses) {
                let observed = task.revision();
                task.unblock(&*self.clock);
                batch = batch.update_task_if(task.clone(), observed);
                debug!(task_id = %task.id(), "task unblocked");
            }
        }

        let state =
            OrchestratorState::observe(project.id(), OrchestratorPhase::Monitor, &tasks, &agents);
        info!(
            pending = state.pending_tasks(),
            current = state.current_task_ids().len(),
            completed = state.completed_task_ids().len(),
            failed = state.failed_task_ids().len(),
            "project monitored"
        );
        Ok(PhaseEffects::new(state, batch))
    }

    /// `ESCALATE`: reports the condition that sent the project here.
    pub(super) async fn escalate(&self, project: &Project) -> OrchestratorResult<PhaseEffects> {
        let tasks = self.store.list_project_tasks(project.id()).await?;
        let agents = self.store.list_agents().await?;
        let state =
            OrchestratorState::observe(project.id(), OrchestratorPhase::Escalate, &tasks, &agents);
        let Some(escalation) = state.escalation() else {
            debug!("escalation condition cleared");
            return Ok(PhaseEffects::new(state, CommitBatch::new()));
        };
        warn!(reason = %escalation.reason, message = %escalation.message, "escalating");
        self.ports.escalations.escalate(escalation).await?;
        Ok(PhaseEffects::new(state, CommitBatch::new()))
    }

    /// `REASSIGN`: returns failed tasks to the pool of unassigned work.
    pub(super) async fn reassign(&self, project: &Project) -> OrchestratorResult<PhaseEffects> {
        let tasks = self.store.list_project_tasks(project.id()).await?;
        let mut batch = CommitBatch::new();
        for task in tasks
            .into_iter()
            .filter(|task| task.status() == TaskStatus::Failed)
        {
            let previous_agent = task.assigned_agent_id();
            let observed = task.revision();
            let mut released = task;
            released.unassign(&*self.clock);
            info!(
                task_id = %released.id(),
                previous_agent = ?previous_agent,
                "failed task released for reassignment"
            );
            batch = batch.update_task_if(released, observed);
        }
        let state = OrchestratorState::new(project.id(), OrchestratorPhase::Reassign);
        Ok(PhaseEffects::new(state, batch))
    }

    /// `COMPLETE`: finalises the project.
    pub(super) fn complete(&self, project: &mut Project) -> PhaseEffects {
        if project.status() != ProjectStatus::Completed {
            project.complete(&*self.clock);
            info!("project completed");
        }
        let state = OrchestratorState::new(project.id(), OrchestratorPhase::Complete);
        PhaseEffects::new(state, CommitBatch::new())
    }
}

fn status_index(tasks: &[Task]) -> HashMap<TaskId, TaskStatus> {
    tasks.iter().map(|task| (task.id(), task.status())).collect()
}

/// A task is ready once every task it depends on has completed. Unknown
/// dependencies never count as met.
fn dependencies_met(task: &Task, statuses: &HashMap<TaskId, TaskStatus>) -> bool {
    task.dependencies()
        .iter()
        .all(|dependency| statuses.get(dependency) == Some(&TaskStatus::Completed))
}
