use uuid::Uuid;

use crate::models::version::Version;

/// Records that can be matched across tentative and authoritative copies.
pub trait Keyed {
    fn key(&self) -> Option<&str>;
}

impl Keyed for Version {
    fn key(&self) -> Option<&str> {
        self.tag()
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    record: T,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    id: Uuid,
    /// What the entry held before the tentative change; `None` for inserts.
    previous: Option<T>,
}

/// A list that can show tentative changes before the server confirms them.
///
/// `stage` applies a change under a correlation id. `commit` swaps in the
/// server's record, `discard` rolls the change back. Fresh listings from the
/// server replace everything via `replace_all`, keeping staged changes that
/// are still unresolved.
#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Keyed + Clone> OptimisticList<T> {
    #[cfg(test)]
    pub fn from_records(records: Vec<T>) -> Self {
        let mut list = Self::default();
        list.replace_all(records);
        list
    }

    fn position(&self, key: Option<&str>) -> Option<usize> {
        key.and_then(|k| self.entries.iter().position(|e| e.record.key() == Some(k)))
    }

    /// Applies a tentative insert, or a tentative replacement of the record
    /// with the same key.
    pub fn stage(&mut self, record: T) -> Uuid {
        let id = Uuid::new_v4();
        match self.position(record.key()) {
            Some(i) => {
                let entry = &mut self.entries[i];
                let previous = match entry.pending.take() {
                    // Keep the last confirmed state as the rollback target.
                    Some(p) => p.previous,
                    None => Some(entry.record.clone()),
                };
                entry.record = record;
                entry.pending = Some(Pending { id, previous });
            }
            None => self.entries.push(Entry {
                record,
                pending: Some(Pending { id, previous: None }),
            }),
        }
        id
    }

    fn find_pending(&self, id: Uuid) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.pending.as_ref().map(|p| p.id) == Some(id))
    }

    /// Replaces the tentative record with the authoritative one.
    /// Returns false if the change was already resolved.
    pub fn commit(&mut self, id: Uuid, record: T) -> bool {
        match self.find_pending(id) {
            Some(i) => {
                self.entries[i] = Entry {
                    record,
                    pending: None,
                };
                true
            }
            None => false,
        }
    }

    /// Rolls back a tentative change. Returns false if it was already resolved.
    pub fn discard(&mut self, id: Uuid) -> bool {
        let Some(i) = self.find_pending(id) else {
            return false;
        };
        let pending = self.entries[i].pending.take();
        match pending.and_then(|p| p.previous) {
            Some(previous) => self.entries[i].record = previous,
            None => {
                self.entries.remove(i);
            }
        }
        true
    }

    /// Installs a fresh listing, keeping unresolved tentative entries on top.
    pub fn replace_all(&mut self, records: Vec<T>) {
        let staged: Vec<Entry<T>> = self
            .entries
            .drain(..)
            .filter(|e| e.pending.is_some())
            .collect();

        self.entries = records
            .into_iter()
            .map(|record| Entry {
                record,
                pending: None,
            })
            .collect();

        for entry in staged {
            match self.position(entry.record.key()) {
                Some(i) => self.entries[i] = entry,
                None => self.entries.push(entry),
            }
        }
    }

    /// Inserts or replaces a confirmed record, dropping any tentative state
    /// for the same key.
    pub fn upsert(&mut self, record: T) {
        let entry = Entry {
            record,
            pending: None,
        };
        match self.position(entry.record.key()) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|e| e.record.key() != Some(key));
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.position(Some(key)).map(|i| &self.entries[i].record)
    }

    pub fn records(&self) -> Vec<T> {
        self.entries.iter().map(|e| e.record.clone()).collect()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.pending.is_some())
    }
}
