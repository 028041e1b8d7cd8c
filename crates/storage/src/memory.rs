use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use serde_json::Value;
use treino_domain::{
    AppState, DraftRepository, ReadError, StateRepository, StorageError, WorkoutDraft, WriteError,
};

use crate::log;

/// Keeps every document in memory. Holds the stored state as JSON, like a
/// file would, so reading it back goes through migration again.
#[derive(Debug, Default)]
pub struct InMemory {
    state: Mutex<Option<Value>>,
    draft: Mutex<Option<WorkoutDraft>>,
    entries: Mutex<VecDeque<log::Entry>>,
}

impl InMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `document` as the stored state, e.g. a legacy export.
    #[must_use]
    pub fn with_state(document: Value) -> Self {
        Self {
            state: Mutex::new(Some(document)),
            ..Self::default()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|err| StorageError::Other(err.to_string().into()))
}

impl StateRepository for InMemory {
    fn read_state(&self) -> Result<Option<Value>, ReadError> {
        Ok(lock(&self.state)?.clone())
    }

    fn write_state(&self, state: &AppState) -> Result<(), WriteError> {
        let document = serde_json::to_value(state).map_err(StorageError::from)?;
        *lock(&self.state)? = Some(document);
        Ok(())
    }
}

impl DraftRepository for InMemory {
    fn read_draft(&self) -> Result<Option<WorkoutDraft>, ReadError> {
        Ok(lock(&self.draft)?.clone())
    }

    fn write_draft(&self, draft: Option<&WorkoutDraft>) -> Result<(), WriteError> {
        *lock(&self.draft)? = draft.cloned();
        Ok(())
    }
}

impl log::Repository for InMemory {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        lock(&self.entries)
            .map(|entries| entries.clone())
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let mut entries = lock(&self.entries).map_err(|err| log::Error::Unknown(err.to_string()))?;
        log::push(&mut entries, entry);
        Ok(())
    }
}
