//! Projects driven to completion through the worker pool.

use super::helpers::{Services, services};
use crate::test_helpers::ScriptedBackend;
use mockable::DefaultClock;
use orchestrion::agent::domain::{AgentId, AgentStatus, NewAgent};
use orchestrion::execution::{domain::RetryPolicy, services::TaskExecutionService};
use orchestrion::orchestrator::{
    adapters::memory::{RecordingEscalationSink, StaticTaskPlanner},
    domain::OrchestratorPhase,
    ports::PlannedTask,
    services::{
        OrchestratorError, OrchestratorPorts, OrchestratorService, OrchestratorSettings,
        RunOutcome,
    },
};
use orchestrion::project::domain::{NewProject, ProjectStatus};
use orchestrion::skill::{
    adapters::SkillMatcher,
    domain::{SkillDescriptor, SkillRegistry},
};
use orchestrion::store::{adapters::memory::InMemoryEntityStore, ports::EntityStore};
use orchestrion::task::domain::{Task, TaskStatus};
use orchestrion::worker::{WorkerPool, WorkerPoolConfig};
use rstest::rstest;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct Running {
    driver: OrchestratorService<InMemoryEntityStore, DefaultClock>,
    pool: WorkerPool,
    escalations: RecordingEscalationSink,
}

fn skills() -> SkillRegistry {
    let mut registry = SkillRegistry::new();
    registry
        .register(SkillDescriptor::new("api", "HTTP handlers").expect("valid skill"))
        .expect("skill should register");
    registry
        .register(
            SkillDescriptor::new("deploy", "Production rollout")
                .expect("valid skill")
                .with_required_permissions(["prod".to_owned()]),
        )
        .expect("skill should register");
    registry
}

fn plan() -> Vec<PlannedTask> {
    vec![
        PlannedTask::new("schema", "Design schema").with_skill_requirements(["api".to_owned()]),
        PlannedTask::new("pages", "Render pages")
            .with_skill_requirements(["ui".to_owned()])
            .with_depends_on(["schema".to_owned()]),
        PlannedTask::new("release", "Ship release")
            .with_skill_requirements(["deploy".to_owned()])
            .with_depends_on(["pages".to_owned()]),
    ]
}

fn start(services: &Services, backend: &Arc<ScriptedBackend>) -> Running {
    let clock = Arc::new(DefaultClock);
    let pipeline = TaskExecutionService::new(
        Arc::clone(&services.store),
        Arc::clone(backend),
        Arc::clone(&clock),
    )
    .with_retry_policy(RetryPolicy::new(Duration::from_millis(5)));
    let pool = WorkerPool::spawn(
        Arc::new(pipeline),
        WorkerPoolConfig {
            worker_count: 2,
            queue_capacity: 16,
        },
    );
    let escalations = RecordingEscalationSink::new();
    let ports = OrchestratorPorts {
        planner: Arc::new(StaticTaskPlanner::new(plan())),
        matcher: Arc::new(SkillMatcher::new(Arc::new(skills()))),
        escalations: Arc::new(escalations.clone()),
        dispatcher: Arc::new(pool.handle()),
    };
    let settings = OrchestratorSettings {
        monitor_interval: Duration::from_millis(2),
        max_loop_iterations: 10_000,
        ..OrchestratorSettings::default()
    };
    let driver = OrchestratorService::new(Arc::clone(&services.store), clock, ports)
        .with_settings(settings);
    Running {
        driver,
        pool,
        escalations,
    }
}

/// Registers the team and returns agent ids keyed by name.
async fn hire_team(services: &Services) -> HashMap<&'static str, AgentId> {
    let team = [
        (
            "designer",
            NewAgent::new("designer", "frontend").with_skill_tags(["ui".to_owned()]),
        ),
        (
            "engineer",
            NewAgent::new("engineer", "backend")
                .with_skill_tags(["api".to_owned(), "deploy".to_owned()]),
        ),
        (
            "operator",
            NewAgent::new("operator", "ops")
                .with_skill_tags(["deploy".to_owned()])
                .with_permissions(["prod".to_owned()]),
        ),
    ];
    let mut ids = HashMap::new();
    for (name, params) in team {
        let agent = services
            .agents
            .register(params)
            .await
            .expect("agent should register");
        ids.insert(name, agent.id());
    }
    ids
}

async fn run_to_end(running: &Running, services: &Services) -> (RunOutcome, Vec<Task>) {
    let project = services
        .projects
        .create(NewProject::new("Storefront"))
        .await
        .expect("project should be created");
    let outcome = tokio::time::timeout(Duration::from_secs(30), running.driver.run(project.id()))
        .await
        .expect("run should finish in time")
        .expect("run should succeed");
    let stored = services
        .store
        .find_project(project.id())
        .await
        .expect("lookup should succeed")
        .expect("project should exist");
    assert_eq!(stored.status(), ProjectStatus::Completed);
    assert_eq!(stored.orchestrator_phase(), OrchestratorPhase::Complete);
    let tasks = services
        .store
        .list_project_tasks(project.id())
        .await
        .expect("listing should succeed");
    (outcome, tasks)
}

fn titled<'a>(tasks: &'a [Task], title: &str) -> &'a Task {
    tasks
        .iter()
        .find(|task| task.title() == title)
        .expect("task should exist")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn planned_project_runs_to_completion_on_matching_agents(services: Services) {
    let team = hire_team(&services).await;
    let backend = Arc::new(ScriptedBackend::succeeding());
    let running = start(&services, &backend);

    let (outcome, tasks) = run_to_end(&running, &services).await;

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|task| task.status() == TaskStatus::Completed));
    assert_eq!(
        titled(&tasks, "Design schema").assigned_agent_id(),
        team.get("engineer").copied()
    );
    assert_eq!(
        titled(&tasks, "Render pages").assigned_agent_id(),
        team.get("designer").copied()
    );
    assert_eq!(
        titled(&tasks, "Ship release").assigned_agent_id(),
        team.get("operator").copied()
    );
    assert_eq!(
        titled(&tasks, "Ship release").result(),
        Some("done: Ship release")
    );
    assert_eq!(
        backend.calls(),
        vec!["Design schema", "Render pages", "Ship release"]
    );
    assert!(running.escalations.escalations().is_empty());

    let agents = services
        .agents
        .list_all()
        .await
        .expect("listing should succeed");
    assert!(agents.iter().all(|agent| agent.status() == AgentStatus::Idle));
    running.pool.join().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transient_failure_is_retried_within_the_run(services: Services) {
    hire_team(&services).await;
    let backend = Arc::new(ScriptedBackend::succeeding().failing_first("Render pages", 1));
    let running = start(&services, &backend);

    let (outcome, tasks) = run_to_end(&running, &services).await;

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    let pages = titled(&tasks, "Render pages");
    assert_eq!(pages.status(), TaskStatus::Completed);
    assert_eq!(pages.retry_count(), 1);
    assert_eq!(titled(&tasks, "Design schema").retry_count(), 0);
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|title| title.as_str() == "Render pages")
            .count(),
        2
    );
    running.pool.join().await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_project_halts_before_planning(services: Services) {
    let backend = Arc::new(ScriptedBackend::succeeding());
    let running = start(&services, &backend);
    let project = services
        .projects
        .create(NewProject::new("Shelved"))
        .await
        .expect("project should be created");
    services
        .projects
        .cancel(project.id())
        .await
        .expect("cancel should succeed");

    let outcome = running
        .driver
        .run(project.id())
        .await
        .expect("run should succeed");
    let step_err = running
        .driver
        .step(project.id())
        .await
        .expect_err("cancelled project cannot step");

    assert_eq!(
        outcome,
        RunOutcome::Halted {
            status: ProjectStatus::Cancelled,
            phase: OrchestratorPhase::Plan,
            iterations: 0,
        }
    );
    assert!(matches!(
        step_err,
        OrchestratorError::ProjectNotRunnable {
            status: ProjectStatus::Cancelled,
            ..
        }
    ));
    assert!(backend.calls().is_empty());
    running.pool.join().await;
}
