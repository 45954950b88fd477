use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::Chart;
use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::storage::{Record, RecordStore, RowId, Stored};

/// Rows of one record type with an external-id index
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Table<T> {
    rows: BTreeMap<RowId, T>,
    #[serde(skip)]
    index: HashMap<u32, RowId>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    fn rebuild_index(&mut self) {
        self.index = self
            .rows
            .iter()
            .map(|(id, record)| (record.external_id(), *id))
            .collect();
    }

    fn find(&self, external_id: u32) -> Option<Stored<T>> {
        let id = *self.index.get(&external_id)?;
        self.rows.get(&id).map(|record| Stored {
            id,
            record: record.clone(),
        })
    }

    fn upsert(&mut self, record: T, next_id: &mut u64) -> Stored<T> {
        let id = match self.index.get(&record.external_id()) {
            Some(id) => *id,
            None => {
                *next_id += 1;
                RowId(*next_id)
            }
        };
        self.index.insert(record.external_id(), id);
        self.rows.insert(id, record.clone());
        Stored { id, record }
    }

    fn update(&mut self, row: &Stored<T>) -> Result<()> {
        let Some(existing) = self.rows.get(&row.id) else {
            return Err(Error::Store(format!("no row {}", row.id)));
        };
        if existing.external_id() != row.record.external_id() {
            return Err(Error::Store(format!(
                "row {} holds id {}, refusing to overwrite with id {}",
                row.id,
                existing.external_id(),
                row.record.external_id()
            )));
        }
        self.rows.insert(row.id, row.record.clone());
        Ok(())
    }

    fn external_ids(&self) -> HashSet<u32> {
        self.index.keys().copied().collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    next_id: u64,
    charts: Table<Chart>,
    profiles: Table<Profile>,
}

/// In-process record store with optional JSON file persistence.
///
/// Cloning yields another handle to the same tables.
#[derive(Debug, Clone)]
pub struct LocalStore {
    tables: Arc<Mutex<Tables>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            path: None,
        }
    }

    /// Open a store persisted to `path`, loading it if the file exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut tables = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<Tables>(&content)?
        } else {
            Tables::default()
        };
        tables.charts.rebuild_index();
        tables.profiles.rebuild_index();

        debug!(
            "Opened store {:?} ({} charts, {} profiles)",
            path,
            tables.charts.rows.len(),
            tables.profiles.rows.len()
        );

        Ok(Self {
            tables: Arc::new(Mutex::new(tables)),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change to the tables.
    ///
    /// A persistent store applies it to a copy and swaps the copy in only
    /// once it is on disk, so a failed save leaves memory untouched.
    fn mutate<R>(&self, change: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut tables = self.lock();
        if self.path.is_none() {
            return change(&mut *tables);
        }

        let mut next = tables.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        *tables = next;
        Ok(out)
    }

    /// Write the tables to disk (temp file + rename) if persistent
    fn persist(&self, tables: &Tables) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(tables)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl RecordStore for LocalStore {
    fn find_chart(&self, chart_id: u32) -> Result<Option<Stored<Chart>>> {
        Ok(self.lock().charts.find(chart_id))
    }

    fn insert_chart(&self, chart: Chart) -> Result<Stored<Chart>> {
        self.mutate(|tables| Ok(tables.charts.upsert(chart, &mut tables.next_id)))
    }

    fn update_chart(&self, row: &Stored<Chart>) -> Result<()> {
        self.mutate(|tables| tables.charts.update(row))
    }

    fn chart_ids(&self) -> Result<HashSet<u32>> {
        Ok(self.lock().charts.external_ids())
    }

    fn find_profile(&self, user_id: u32) -> Result<Option<Stored<Profile>>> {
        Ok(self.lock().profiles.find(user_id))
    }

    fn insert_profile(&self, profile: Profile) -> Result<Stored<Profile>> {
        self.mutate(|tables| Ok(tables.profiles.upsert(profile, &mut tables.next_id)))
    }

    fn update_profile(&self, row: &Stored<Profile>) -> Result<()> {
        self.mutate(|tables| tables.profiles.update(row))
    }

    fn profile_ids(&self) -> Result<HashSet<u32>> {
        Ok(self.lock().profiles.external_ids())
    }
}
