//! Per-cell version history and snapshot baseline.
//!
//! Key invariants:
//! - **Bounded**: each path keeps at most `capacity` entries, oldest evicted first
//! - **Idempotent fetches**: recording unchanged content appends nothing
//! - **Decoupled baseline**: a snapshot only marks a baseline; diffs always compare the
//!   last two entries of a path
//!
//! All state sits behind one `Mutex`, so every operation is atomic with respect to the
//! others and the manager can be shared behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::CompressConfig;
use crate::diff::{diff_lines, DiffLine, DiffStats};
use crate::types::Cell;

/// Entries kept per path when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// One recorded version of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub content: String,
    pub output: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    fn from_cell(cell: &Cell, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: cell.content().to_string(),
            output: cell.output().map(str::to_string),
            timestamp,
        }
    }
}

/// Bounded FIFO of versions for one path.
#[derive(Debug, Clone)]
pub struct CellHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl CellHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Second-to-last and last entries.
    pub fn last_two(&self) -> Option<(&HistoryEntry, &HistoryEntry)> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        Some((&self.entries[len - 2], &self.entries[len - 1]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

/// Change payload for one cell: the two compared versions and their line diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDiff {
    pub path: String,
    pub display_name: String,
    pub previous: HistoryEntry,
    pub current: HistoryEntry,
    pub diff: Vec<DiffLine>,
}

impl CellDiff {
    pub fn stats(&self) -> DiffStats {
        DiffStats::from_lines(&self.diff)
    }
}

/// Baseline marker returned by `take_snapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatus {
    pub cell_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct HistoryState {
    cells: HashMap<String, CellHistory>,
    display_names: HashMap<String, String>,
    /// First-seen order of paths, for stable `get_all_diffs` output
    order: Vec<String>,
    baseline: Option<SnapshotStatus>,
}

impl HistoryState {
    fn history_mut(&mut self, cell: &Cell, capacity: usize) -> &mut CellHistory {
        let path = cell.path();
        if !self.cells.contains_key(path) {
            self.order.push(path.to_string());
        }
        self.display_names
            .insert(path.to_string(), cell.display_name().to_string());
        self.cells
            .entry(path.to_string())
            .or_insert_with(|| CellHistory::new(capacity))
    }

    fn diff_for(&self, path: &str) -> Option<CellDiff> {
        let (previous, current) = self.cells.get(path)?.last_two()?;
        Some(CellDiff {
            path: path.to_string(),
            display_name: self
                .display_names
                .get(path)
                .cloned()
                .unwrap_or_else(|| crate::types::display_name_for(path)),
            previous: previous.clone(),
            current: current.clone(),
            diff: diff_lines(&previous.content, &current.content),
        })
    }
}

/// Process-lifetime history store. Nothing is persisted.
#[derive(Debug)]
pub struct HistoryManager {
    capacity: usize,
    state: Mutex<HistoryState>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(HistoryState::default()),
        }
    }

    pub fn from_config(config: &CompressConfig) -> Self {
        Self::new(config.history_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a fetch of `cells`. A path gets a new entry only when its content differs
    /// from its latest entry. Returns the number of entries appended.
    pub fn record_fetch(&self, cells: &[Cell]) -> usize {
        let now = Utc::now();
        let mut state = self.lock();
        let mut appended = 0;

        for cell in cells {
            let history = state.history_mut(cell, self.capacity);
            let unchanged = history
                .latest()
                .is_some_and(|latest| latest.content == cell.content());
            if unchanged {
                continue;
            }
            history.push(HistoryEntry::from_cell(cell, now));
            appended += 1;
            debug!(path = cell.path(), versions = history.len(), "recorded cell version");
        }

        appended
    }

    /// Diff of the last two entries for `path`; `None` with fewer than two entries.
    pub fn get_diff(&self, path: &str) -> Option<CellDiff> {
        self.lock().diff_for(path)
    }

    /// Diffs for every path whose last two entries differ, in first-seen order.
    pub fn get_all_diffs(&self) -> Vec<CellDiff> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|path| state.diff_for(path))
            .filter(|diff| diff.stats().has_changes())
            .collect()
    }

    /// Force an entry for every cell, unchanged or not, and mark a baseline.
    pub fn take_snapshot(&self, cells: &[Cell]) -> SnapshotStatus {
        let now = Utc::now();
        let mut state = self.lock();

        for cell in cells {
            state
                .history_mut(cell, self.capacity)
                .push(HistoryEntry::from_cell(cell, now));
        }

        let status = SnapshotStatus {
            cell_count: cells.len(),
            timestamp: now,
        };
        state.baseline = Some(status);
        info!(cell_count = status.cell_count, "snapshot baseline taken");
        status
    }

    /// The last snapshot marker, if one is active.
    pub fn baseline(&self) -> Option<SnapshotStatus> {
        self.lock().baseline
    }

    /// Remove one path's history, or everything (baseline included) when `path` is `None`.
    pub fn clear_history(&self, path: Option<&str>) {
        let mut state = self.lock();
        match path {
            Some(path) => {
                state.cells.remove(path);
                state.display_names.remove(path);
                state.order.retain(|p| p != path);
                info!(path, "cleared cell history");
            }
            None => {
                *state = HistoryState::default();
                info!("cleared all history");
            }
        }
    }

    /// Recorded versions for `path`, oldest first.
    pub fn entries(&self, path: &str) -> Vec<HistoryEntry> {
        self.lock()
            .cells
            .get(path)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of paths with any history.
    pub fn tracked_paths(&self) -> usize {
        self.lock().cells.len()
    }
}
