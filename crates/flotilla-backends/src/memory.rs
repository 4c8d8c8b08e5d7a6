//! In-memory container engine behind the `debug` backend.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::{ContainerDescription, ContainerEngine, CreationSpec};
use crate::errors::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Running,
    Exited,
}

impl State {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Exited => "exited",
        }
    }
}

#[derive(Debug)]
struct Container {
    id: String,
    name: String,
    image: String,
    state: State,
}

#[derive(Debug, Default)]
struct Inventory {
    next_id: u64,
    containers: Vec<Container>,
}

impl Inventory {
    fn find_mut(&mut self, id: &str) -> Result<&mut Container, EngineError> {
        self.containers
            .iter_mut()
            .find(|container| container.id == id)
            .ok_or_else(|| EngineError::NoSuchContainer(id.to_owned()))
    }
}

/// Container engine that keeps every container in memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    inventory: Mutex<Inventory>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inventory(&self) -> MutexGuard<'_, Inventory> {
        self.inventory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContainerEngine for MemoryEngine {
    fn ping(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(self
            .inventory()
            .containers
            .iter()
            .map(|container| container.name.clone())
            .collect())
    }

    fn create(&self, spec: &str) -> Result<String, EngineError> {
        let spec = CreationSpec::parse(spec)?;
        let mut inventory = self.inventory();
        inventory.next_id += 1;
        let id = format!("{:012x}", inventory.next_id);
        let name = spec.name.unwrap_or_else(|| id.clone());
        if inventory.containers.iter().any(|container| container.name == name) {
            return Err(EngineError::NameConflict(name));
        }
        inventory.containers.push(Container {
            id: id.clone(),
            name,
            image: spec.image,
            state: State::Created,
        });
        Ok(id)
    }

    fn resolve(&self, name: &str) -> Result<Option<String>, EngineError> {
        Ok(self
            .inventory()
            .containers
            .iter()
            .find(|container| container.name == name || container.id == name)
            .map(|container| container.id.clone()))
    }

    fn inspect(&self, id: &str) -> Result<ContainerDescription, EngineError> {
        let mut inventory = self.inventory();
        let container = inventory.find_mut(id)?;
        Ok(ContainerDescription {
            id: container.id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: container.state.as_str().to_owned(),
        })
    }

    fn start(&self, id: &str) -> Result<(), EngineError> {
        let mut inventory = self.inventory();
        let container = inventory.find_mut(id)?;
        if container.state == State::Running {
            return Err(EngineError::AlreadyRunning(container.name.clone()));
        }
        container.state = State::Running;
        Ok(())
    }

    fn stop(&self, id: &str) -> Result<(), EngineError> {
        let mut inventory = self.inventory();
        let container = inventory.find_mut(id)?;
        if container.state != State::Running {
            return Err(EngineError::NotRunning(container.name.clone()));
        }
        container.state = State::Exited;
        Ok(())
    }
}
