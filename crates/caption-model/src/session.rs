//! Copy-on-write cue list snapshots for the editing session.
//!
//! Highlight computation reads the cue list on every frame while the user
//! edits it. Readers hold an `Arc` snapshot; an edit clones the list only if
//! a snapshot is still alive, so a reader never sees a half-applied edit.

use std::sync::Arc;

use crate::cue::Cue;

/// Owner of the session's cue list.
#[derive(Debug, Clone, Default)]
pub struct CueStore {
    cues: Arc<Vec<Cue>>,
    revision: u64,
}

impl CueStore {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        sort_cues(&mut cues);
        Self {
            cues: Arc::new(cues),
            revision: 0,
        }
    }

    /// Cheap, immutable view of the current cue list.
    pub fn snapshot(&self) -> Arc<Vec<Cue>> {
        Arc::clone(&self.cues)
    }

    /// Incremented after every edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply an edit. Outstanding snapshots keep the previous list.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Vec<Cue>) -> R) -> R {
        let cues = Arc::make_mut(&mut self.cues);
        let result = f(cues);
        sort_cues(cues);
        self.revision += 1;
        result
    }

    /// Edit a single cue by id. Returns false when no cue matched.
    pub fn update_cue(&mut self, id: &str, f: impl FnOnce(&mut Cue)) -> bool {
        self.edit(|cues| match cues.iter_mut().find(|c| c.id == id) {
            Some(cue) => {
                f(cue);
                true
            }
            None => false,
        })
    }

    pub fn remove_cue(&mut self, id: &str) -> Option<Cue> {
        self.edit(|cues| {
            let index = cues.iter().position(|c| c.id == id)?;
            Some(cues.remove(index))
        })
    }

    pub fn into_cues(self) -> Vec<Cue> {
        Arc::try_unwrap(self.cues).unwrap_or_else(|shared| (*shared).clone())
    }
}

fn sort_cues(cues: &mut [Cue]) {
    cues.sort_by(|a, b| a.time_range.lower.total_cmp(&b.time_range.lower));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimeRange;

    fn store() -> CueStore {
        CueStore::new(vec![
            Cue::plain("b", "second", TimeRange::new(2.0, 3.0)),
            Cue::plain("a", "first", TimeRange::new(0.0, 1.0)),
        ])
    }

    #[test]
    fn test_new_sorts_by_start() {
        let snapshot = store().snapshot();
        assert_eq!(snapshot[0].id, "a");
        assert_eq!(snapshot[1].id, "b");
    }

    #[test]
    fn test_snapshot_is_isolated_from_edits() {
        let mut store = store();
        let before = store.snapshot();

        assert!(store.update_cue("a", |cue| cue.text = "edited".to_string()));

        assert_eq!(before[0].text, "first");
        assert_eq!(store.snapshot()[0].text, "edited");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_remove_and_missing_ids() {
        let mut store = store();
        assert!(!store.update_cue("zzz", |_| {}));
        assert_eq!(store.remove_cue("a").map(|c| c.id), Some("a".to_string()));
        assert!(store.remove_cue("a").is_none());
        assert_eq!(store.into_cues().len(), 1);
    }
}
