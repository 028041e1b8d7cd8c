use std::{
    collections::VecDeque,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use treino_domain::{
    AppState, DraftRepository, ReadError, StateRepository, StorageError, WorkoutDraft, WriteError,
};

use crate::log;

const STATE_FILE: &str = "state.json";
const DRAFT_FILE: &str = "draft.json";
const LOG_FILE: &str = "log.json";

/// Stores each document as a JSON file in one directory. A missing file
/// means the document does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFile {
    dir: PathBuf,
}

impl JsonFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `treino` inside the platform's local data directory.
    pub fn default_location() -> Result<Self, StorageError> {
        dirs::data_local_dir()
            .map(|dir| Self::new(dir.join("treino")))
            .ok_or(StorageError::Unavailable)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StorageError> {
        match File::open(self.dir.join(file)) {
            Ok(f) => Ok(Some(serde_json::from_reader(BufReader::new(f))?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes next to the target first and renames, so a crash never leaves
    /// a truncated document behind.
    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        let partial = path.with_extension("json.partial");
        {
            let mut writer = BufWriter::new(File::create(&partial)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&partial, &path)?;
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.dir.join(file)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl StateRepository for JsonFile {
    fn read_state(&self) -> Result<Option<Value>, ReadError> {
        Ok(self.read(STATE_FILE)?)
    }

    fn write_state(&self, state: &AppState) -> Result<(), WriteError> {
        Ok(self.write(STATE_FILE, state)?)
    }
}

impl DraftRepository for JsonFile {
    fn read_draft(&self) -> Result<Option<WorkoutDraft>, ReadError> {
        Ok(self.read(DRAFT_FILE)?)
    }

    fn write_draft(&self, draft: Option<&WorkoutDraft>) -> Result<(), WriteError> {
        match draft {
            Some(draft) => Ok(self.write(DRAFT_FILE, draft)?),
            None => Ok(self.remove(DRAFT_FILE)?),
        }
    }
}

impl log::Repository for JsonFile {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        self.read(LOG_FILE)
            .map(Option::unwrap_or_default)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let mut entries = self.read_entries()?;
        log::push(&mut entries, entry);
        self.write(LOG_FILE, &entries)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }
}
