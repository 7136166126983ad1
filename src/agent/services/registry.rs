//! Agent registry service.

use crate::agent::domain::{Agent, AgentDomainError, AgentId, NewAgent};
use crate::store::{
    CommitBatch,
    ports::{EntityStore, EntityStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for agent registry operations.
#[derive(Debug, Error)]
pub enum AgentRegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// The agent does not exist.
    #[error("agent not found: {0}")]
    NotFound(AgentId),
}

/// Result type for agent registry operations.
pub type AgentRegistryResult<T> = Result<T, AgentRegistryError>;

/// Registers agents and applies administrative status changes.
#[derive(Clone)]
pub struct AgentRegistryService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> AgentRegistryService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a new agent registry service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Registers an `idle` agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Domain`] for a blank name or role.
    pub async fn register(&self, params: NewAgent) -> AgentRegistryResult<Agent> {
        let agent = Agent::new(params, &*self.clock)?;
        self.store
            .commit(CommitBatch::new().insert_agent(agent.clone()))
            .await?;
        tracing::info!(agent_id = %agent.id(), role = agent.role(), "agent registered");
        Ok(agent)
    }

    /// Retrieves an agent by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Store`] when the lookup fails.
    pub async fn find_by_id(&self, id: AgentId) -> AgentRegistryResult<Option<Agent>> {
        Ok(self.store.find_agent(id).await?)
    }

    /// Returns every registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::Store`] when the listing fails.
    pub async fn list_all(&self) -> AgentRegistryResult<Vec<Agent>> {
        Ok(self.store.list_agents().await?)
    }

    /// Disables an agent that is not working.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] for a working agent.
    pub async fn disable(&self, id: AgentId) -> AgentRegistryResult<Agent> {
        self.transition(id, |agent, clock| agent.disable(clock)).await
    }

    /// Re-enables a disabled agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the agent is
    /// disabled.
    pub async fn enable(&self, id: AgentId) -> AgentRegistryResult<Agent> {
        self.transition(id, |agent, clock| agent.enable(clock)).await
    }

    /// Clears an agent's error state.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the agent is in
    /// the error state.
    pub async fn recover(&self, id: AgentId) -> AgentRegistryResult<Agent> {
        self.transition(id, |agent, clock| agent.recover(clock)).await
    }

    /// Records a heartbeat for an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryError::NotFound`] for unknown agents.
    pub async fn heartbeat(&self, id: AgentId) -> AgentRegistryResult<Agent> {
        self.transition(id, |agent, clock| {
            agent.record_heartbeat(clock);
            Ok(())
        })
        .await
    }

    async fn transition(
        &self,
        id: AgentId,
        apply: impl FnOnce(&mut Agent, &C) -> Result<(), AgentDomainError> + Send,
    ) -> AgentRegistryResult<Agent> {
        let mut agent = self
            .store
            .find_agent(id)
            .await?
            .ok_or(AgentRegistryError::NotFound(id))?;
        let observed = agent.status();
        apply(&mut agent, &*self.clock)?;
        self.store
            .commit(CommitBatch::new().update_agent_if(agent.clone(), observed))
            .await?;
        tracing::debug!(agent_id = %id, status = %agent.status(), "agent updated");
        Ok(agent)
    }
}
