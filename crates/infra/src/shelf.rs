//! Per-user library and reading progress.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use novelly_core::{ChapterId, DomainError, DomainResult, Entity, NovelId, UserId};

use crate::store::{EntityStore, InMemoryStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub user_id: UserId,
    pub novel_id: NovelId,
    pub added_at: DateTime<Utc>,
}

impl Entity for LibraryEntry {
    type Id = (UserId, NovelId);

    fn id(&self) -> (UserId, NovelId) {
        (self.user_id, self.novel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub user_id: UserId,
    pub novel_id: NovelId,
    pub chapter_id: ChapterId,
    pub last_read_at: DateTime<Utc>,
}

impl Entity for ReadingProgress {
    type Id = (UserId, NovelId);

    fn id(&self) -> (UserId, NovelId) {
        (self.user_id, self.novel_id)
    }
}

/// Library and progress records, one per (user, novel).
///
/// Existence of the referenced novel/chapter is the caller's concern.
#[derive(Debug, Default)]
pub struct ReadingShelf {
    library: InMemoryStore<LibraryEntry>,
    progress: InMemoryStore<ReadingProgress>,
    // Serializes the duplicate check with the insert.
    library_lock: Mutex<()>,
}

impl ReadingShelf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library entries, most recently added first.
    pub fn library(&self, user_id: UserId) -> Vec<LibraryEntry> {
        let mut entries = self.library.filter(|e| e.user_id == user_id);
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        entries
    }

    pub fn in_library(&self, user_id: UserId, novel_id: NovelId) -> bool {
        self.library.get((user_id, novel_id)).is_some()
    }

    pub fn add_to_library(&self, user_id: UserId, novel_id: NovelId) -> DomainResult<LibraryEntry> {
        let _guard = self
            .library_lock
            .lock()
            .map_err(|_| DomainError::conflict("library is unavailable"))?;

        if self.in_library(user_id, novel_id) {
            return Err(DomainError::conflict("novel already in library"));
        }
        let entry = LibraryEntry {
            user_id,
            novel_id,
            added_at: Utc::now(),
        };
        self.library.upsert(entry.clone());
        Ok(entry)
    }

    pub fn remove_from_library(&self, user_id: UserId, novel_id: NovelId) -> DomainResult<()> {
        self.library
            .remove((user_id, novel_id))
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("library entry"))
    }

    /// Progress records, most recently read first.
    pub fn progress(&self, user_id: UserId) -> Vec<ReadingProgress> {
        let mut records = self.progress.filter(|p| p.user_id == user_id);
        records.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at));
        records
    }

    pub fn progress_for(&self, user_id: UserId, novel_id: NovelId) -> Option<ReadingProgress> {
        self.progress.get((user_id, novel_id))
    }

    /// Create or move the bookmark for (user, novel).
    pub fn save_progress(&self, user_id: UserId, novel_id: NovelId, chapter_id: ChapterId) -> ReadingProgress {
        let record = ReadingProgress {
            user_id,
            novel_id,
            chapter_id,
            last_read_at: Utc::now(),
        };
        self.progress.upsert(record.clone());
        record
    }

    pub fn delete_progress(&self, user_id: UserId, novel_id: NovelId) -> DomainResult<()> {
        self.progress
            .remove((user_id, novel_id))
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("reading progress"))
    }

    /// Drop every record pointing at a deleted novel.
    pub fn forget_novel(&self, novel_id: NovelId) {
        self.library.remove_where(&|e: &LibraryEntry| e.novel_id == novel_id);
        self.progress.remove_where(&|p: &ReadingProgress| p.novel_id == novel_id);
    }
}
