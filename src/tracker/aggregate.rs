//! Cross-album warning state.
//!
//! The board holds an entry for every album whose latest grouping differs,
//! plus the set of albums the user dismissed. The visible set is the entries
//! minus the dismissals.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::grouping::CoverGrouping;
use super::types::AlbumId;

/// How long a dismissal suppresses an album's warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalPolicy {
    /// Until the album's differing grouping changes shape
    #[default]
    UntilChanged,
    /// Until the album is removed
    Sticky,
}

/// A differing album as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateEntry {
    pub album_id: AlbumId,
    pub grouping: CoverGrouping,
    pub display_name: Option<String>,
}

impl AggregateEntry {
    /// Display name, or the id when the album has no name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.album_id.as_str())
    }
}

/// Full-replace view of every visible warning, ordered by album id.
pub type WarningView = BTreeMap<AlbumId, AggregateEntry>;

/// Warning state of one album.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningState {
    /// Covers consistent, or album unknown
    Absent,
    /// Covers differ and the warning is shown
    Differing,
    /// Covers differ but the user dismissed the warning
    Dismissed,
}

/// Aggregate table plus dismissal set.
#[derive(Debug, Default)]
pub struct WarningBoard {
    policy: DismissalPolicy,
    entries: HashMap<AlbumId, AggregateEntry>,
    /// Grouping on screen when each dismissal happened
    dismissed: HashMap<AlbumId, Option<CoverGrouping>>,
}

impl WarningBoard {
    pub fn new(policy: DismissalPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DismissalPolicy {
        self.policy
    }

    /// Apply a freshly computed grouping for an album.
    pub fn update(
        &mut self,
        album_id: &AlbumId,
        grouping: &CoverGrouping,
        display_name: Option<&str>,
    ) -> WarningState {
        if !grouping.is_differing() {
            if self.entries.remove(album_id).is_some() {
                info!(target: "tracker::aggregate", album = %album_id, "Covers are consistent again");
            }
            return WarningState::Absent;
        }

        if self.policy == DismissalPolicy::UntilChanged {
            let changed = match self.dismissed.get(album_id) {
                Some(Some(snapshot)) => !snapshot.same_shape(grouping),
                Some(None) => true,
                None => false,
            };
            if changed {
                self.dismissed.remove(album_id);
                info!(target: "tracker::aggregate", album = %album_id, "Covers changed since dismissal, warning shown again");
            }
        }

        let previous = self.entries.insert(
            album_id.clone(),
            AggregateEntry {
                album_id: album_id.clone(),
                grouping: grouping.clone(),
                display_name: display_name.map(str::to_owned),
            },
        );
        if previous.is_none() {
            info!(
                target: "tracker::aggregate",
                album = %album_id,
                covers = grouping.distinct_covers(),
                files = grouping.total_files(),
                "Album has differing covers"
            );
        }

        self.state(album_id)
    }

    /// Suppress an album's warning. Returns whether the album had one.
    ///
    /// Unknown albums are recorded too, so a warning that shows up later
    /// starts out dismissed under the sticky policy.
    pub fn dismiss(&mut self, album_id: &AlbumId) -> bool {
        let snapshot = self.entries.get(album_id).map(|e| e.grouping.clone());
        let existed = snapshot.is_some();
        self.dismissed.insert(album_id.clone(), snapshot);
        debug!(target: "tracker::aggregate", album = %album_id, existed, "Warning dismissed");
        existed
    }

    /// Forget everything about an album. Returns whether anything was held.
    pub fn remove_album(&mut self, album_id: &AlbumId) -> bool {
        let entry = self.entries.remove(album_id).is_some();
        let dismissal = self.dismissed.remove(album_id).is_some();
        entry || dismissal
    }

    pub fn state(&self, album_id: &AlbumId) -> WarningState {
        match (self.entries.contains_key(album_id), self.is_dismissed(album_id)) {
            (false, _) => WarningState::Absent,
            (true, false) => WarningState::Differing,
            (true, true) => WarningState::Dismissed,
        }
    }

    pub fn entry(&self, album_id: &AlbumId) -> Option<&AggregateEntry> {
        self.entries.get(album_id)
    }

    pub fn is_dismissed(&self, album_id: &AlbumId) -> bool {
        self.dismissed.contains_key(album_id)
    }

    /// Albums to show: differing and not dismissed, sorted.
    pub fn visible_set(&self) -> Vec<AlbumId> {
        let mut visible: Vec<AlbumId> = self
            .entries
            .keys()
            .filter(|id| !self.is_dismissed(id))
            .cloned()
            .collect();
        visible.sort();
        visible
    }

    /// Entries of the visible set.
    pub fn view(&self) -> WarningView {
        self.entries
            .iter()
            .filter(|(id, _)| !self.is_dismissed(id))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Number of differing albums, dismissed or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
