//! Project, task and agent services sharing one store.

use super::helpers::{Services, services};
use orchestrion::agent::domain::{AgentDomainError, AgentStatus, NewAgent};
use orchestrion::agent::services::AgentRegistryError;
use orchestrion::project::domain::{NewProject, ProjectStatus};
use orchestrion::project::services::ProjectServiceError;
use orchestrion::store::ports::EntityStore;
use orchestrion::task::domain::{NewTask, TaskDomainError, TaskStatus};
use orchestrion::task::services::TaskLifecycleError;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_are_created_and_linked_within_a_project(services: Services) {
    let project = services
        .projects
        .create(NewProject::new("Storefront").with_initial_request("build a shop"))
        .await
        .expect("project should be created");
    let schema = services
        .tasks
        .create_task(NewTask::new(project.id(), "Design schema"))
        .await
        .expect("task should be created");
    let api = services
        .tasks
        .create_task(NewTask::new(project.id(), "Build API").with_dependencies([schema.id()]))
        .await
        .expect("dependent task should be created");

    let listed = services
        .store
        .list_project_tasks(project.id())
        .await
        .expect("listing should succeed");

    assert_eq!(listed.len(), 2);
    assert_eq!(project.status(), ProjectStatus::Planning);
    assert!(api.is_blocking(schema.id()));
    assert_eq!(api.status(), TaskStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dependency_closing_a_cycle_is_rejected(services: Services) {
    let project = services
        .projects
        .create(NewProject::new("Cycles"))
        .await
        .expect("project should be created");
    let first = services
        .tasks
        .create_task(NewTask::new(project.id(), "First"))
        .await
        .expect("task should be created");
    let second = services
        .tasks
        .create_task(NewTask::new(project.id(), "Second").with_dependencies([first.id()]))
        .await
        .expect("task should be created");

    let err = services
        .tasks
        .add_dependency(first.id(), second.id())
        .await
        .expect_err("edge closes a cycle");

    assert!(matches!(
        err,
        TaskLifecycleError::Domain(TaskDomainError::DependencyCycle { .. })
    ));
    let stored = services
        .tasks
        .find_by_id(first.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert!(stored.dependencies().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_tasks_stay_cancelled(services: Services) {
    let project = services
        .projects
        .create(NewProject::new("Cancel"))
        .await
        .expect("project should be created");
    let task = services
        .tasks
        .create_task(NewTask::new(project.id(), "Throwaway"))
        .await
        .expect("task should be created");

    let cancelled = services
        .tasks
        .cancel(task.id())
        .await
        .expect("cancel should succeed");
    let err = services
        .tasks
        .cancel(task.id())
        .await
        .expect_err("second cancel should fail");

    assert_eq!(cancelled.status(), TaskStatus::Cancelled);
    assert!(matches!(
        err,
        TaskLifecycleError::Domain(TaskDomainError::AlreadyTerminal { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_project_rejects_new_tasks(services: Services) {
    let project = services
        .projects
        .create(NewProject::new("Abandoned"))
        .await
        .expect("project should be created");
    services
        .projects
        .cancel(project.id())
        .await
        .expect("cancel should succeed");

    let task_err = services
        .tasks
        .create_task(NewTask::new(project.id(), "Too late"))
        .await
        .expect_err("cancelled project is not editable");
    let activate_err = services
        .projects
        .activate(project.id())
        .await
        .expect_err("cancelled project cannot be activated");

    assert!(matches!(task_err, TaskLifecycleError::ProjectNotEditable(id) if id == project.id()));
    assert!(matches!(
        activate_err,
        ProjectServiceError::NotEditable {
            status: ProjectStatus::Cancelled,
            ..
        }
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agents_cycle_through_disable_and_enable(services: Services) {
    let agent = services
        .agents
        .register(NewAgent::new("reviewer", "qa").with_skill_tags(["review".to_owned()]))
        .await
        .expect("agent should register");

    let disabled = services
        .agents
        .disable(agent.id())
        .await
        .expect("idle agent can be disabled");
    let recover_err = services
        .agents
        .recover(agent.id())
        .await
        .expect_err("disabled agent is not in error");
    let enabled = services
        .agents
        .enable(agent.id())
        .await
        .expect("disabled agent can be enabled");
    let beating = services
        .agents
        .heartbeat(agent.id())
        .await
        .expect("heartbeat should succeed");

    assert_eq!(disabled.status(), AgentStatus::Disabled);
    assert!(matches!(
        recover_err,
        AgentRegistryError::Domain(AgentDomainError::InvalidTransition {
            action: "recover",
            ..
        })
    ));
    assert_eq!(enabled.status(), AgentStatus::Idle);
    assert!(beating.last_heartbeat().is_some());
    assert_eq!(
        services
            .agents
            .list_all()
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}
