//! Novels and chapters.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use novelly_core::{ChapterId, DomainError, DomainResult, Entity, NovelId};

use crate::store::{EntityStore, IdSequence, InMemoryStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    pub novel_id: NovelId,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Novel {
    type Id = NovelId;

    fn id(&self) -> NovelId {
        self.novel_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: ChapterId,
    pub novel_id: NovelId,
    pub chapter_number: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Chapter {
    type Id = ChapterId;

    fn id(&self) -> ChapterId {
        self.chapter_id
    }
}

/// Fields accepted when creating or updating a novel. On update, `None`
/// leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelDraft {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDraft {
    pub chapter_number: Option<i32>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    novels: InMemoryStore<Novel>,
    chapters: InMemoryStore<Chapter>,
    novel_ids: IdSequence,
    chapter_ids: IdSequence,
    // Serializes chapter-number checks with the writes they guard.
    chapter_lock: Mutex<()>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_chapters(&self) -> DomainResult<MutexGuard<'_, ()>> {
        self.chapter_lock
            .lock()
            .map_err(|_| DomainError::conflict("catalog is unavailable"))
    }

    /// Novels, newest first.
    pub fn list_novels(&self) -> Vec<Novel> {
        let mut novels = self.novels.list();
        novels.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.novel_id.cmp(&a.novel_id)));
        novels
    }

    pub fn get_novel(&self, id: NovelId) -> Option<Novel> {
        self.novels.get(id)
    }

    pub fn create_novel(&self, draft: NovelDraft) -> DomainResult<Novel> {
        let title = required(draft.title, "title")?;
        let now = Utc::now();
        let novel = Novel {
            novel_id: NovelId::new(self.novel_ids.next()),
            title,
            author: draft.author,
            description: draft.description,
            cover_image: draft.cover_image,
            created_at: now,
            updated_at: now,
        };
        self.novels.upsert(novel.clone());
        Ok(novel)
    }

    pub fn update_novel(&self, id: NovelId, draft: NovelDraft) -> DomainResult<Novel> {
        let mut novel = self.get_novel(id).ok_or_else(|| DomainError::not_found("novel"))?;
        if let Some(title) = draft.title {
            novel.title = required(Some(title), "title")?;
        }
        if draft.author.is_some() {
            novel.author = draft.author;
        }
        if draft.description.is_some() {
            novel.description = draft.description;
        }
        if draft.cover_image.is_some() {
            novel.cover_image = draft.cover_image;
        }
        novel.updated_at = Utc::now();
        self.novels.upsert(novel.clone());
        Ok(novel)
    }

    /// Delete a novel and its chapters.
    pub fn delete_novel(&self, id: NovelId) -> DomainResult<()> {
        let _guard = self.lock_chapters()?;
        self.novels
            .remove(id)
            .ok_or_else(|| DomainError::not_found("novel"))?;
        let removed = self.chapters.remove_where(&|c: &Chapter| c.novel_id == id);
        tracing::debug!(novel_id = %id, chapters = removed, "novel deleted");
        Ok(())
    }

    /// Chapters of a novel ordered by chapter number.
    pub fn chapters_for(&self, novel_id: NovelId) -> Vec<Chapter> {
        let mut chapters = self.chapters.filter(|c| c.novel_id == novel_id);
        chapters.sort_by_key(|c| c.chapter_number);
        chapters
    }

    pub fn chapter_by_number(&self, novel_id: NovelId, number: i32) -> Option<Chapter> {
        self.chapters
            .find(|c| c.novel_id == novel_id && c.chapter_number == number)
    }

    pub fn get_chapter(&self, id: ChapterId) -> Option<Chapter> {
        self.chapters.get(id)
    }

    /// Add a chapter. Chapter numbers are unique per novel; when omitted the
    /// next number is used.
    pub fn add_chapter(&self, novel_id: NovelId, draft: ChapterDraft) -> DomainResult<Chapter> {
        let title = required(draft.title, "title")?;
        let requested = draft.chapter_number.map(positive_number).transpose()?;

        let _guard = self.lock_chapters()?;
        if self.get_novel(novel_id).is_none() {
            return Err(DomainError::not_found("novel"));
        }
        let number = match requested {
            Some(n) => n,
            None => match self.chapters_for(novel_id).last() {
                Some(last) => last
                    .chapter_number
                    .checked_add(1)
                    .ok_or_else(|| DomainError::validation("no chapter number left after the last chapter"))?,
                None => 1,
            },
        };
        if self.chapter_by_number(novel_id, number).is_some() {
            return Err(DomainError::conflict(format!("chapter {number} already exists")));
        }

        let chapter = Chapter {
            chapter_id: ChapterId::new(self.chapter_ids.next()),
            novel_id,
            chapter_number: number,
            title,
            content: draft.content.unwrap_or_default(),
            created_at: Utc::now(),
        };
        self.chapters.upsert(chapter.clone());
        Ok(chapter)
    }

    pub fn update_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        draft: ChapterDraft,
    ) -> DomainResult<Chapter> {
        let requested = draft.chapter_number.map(positive_number).transpose()?;

        let _guard = self.lock_chapters()?;
        let mut chapter = self
            .get_chapter(chapter_id)
            .filter(|c| c.novel_id == novel_id)
            .ok_or_else(|| DomainError::not_found("chapter"))?;

        if let Some(number) = requested {
            if number != chapter.chapter_number && self.chapter_by_number(novel_id, number).is_some() {
                return Err(DomainError::conflict(format!("chapter {number} already exists")));
            }
            chapter.chapter_number = number;
        }
        if let Some(title) = draft.title {
            chapter.title = required(Some(title), "title")?;
        }
        if let Some(content) = draft.content {
            chapter.content = content;
        }
        self.chapters.upsert(chapter.clone());
        Ok(chapter)
    }

    pub fn delete_chapter(&self, novel_id: NovelId, chapter_id: ChapterId) -> DomainResult<()> {
        match self.get_chapter(chapter_id) {
            Some(c) if c.novel_id == novel_id => {
                self.chapters.remove(chapter_id);
                Ok(())
            }
            _ => Err(DomainError::not_found("chapter")),
        }
    }
}

fn positive_number(number: i32) -> DomainResult<i32> {
    if number < 1 {
        return Err(DomainError::validation("chapterNumber must be positive"));
    }
    Ok(number)
}

fn required(value: Option<String>, field: &str) -> DomainResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn novel(catalog: &Catalog, title: &str) -> Novel {
        catalog
            .create_novel(NovelDraft {
                title: Some(title.to_string()),
                ..NovelDraft::default()
            })
            .unwrap()
    }

    fn chapter(title: &str, number: Option<i32>) -> ChapterDraft {
        ChapterDraft {
            chapter_number: number,
            title: Some(title.to_string()),
            content: Some("...".to_string()),
        }
    }

    #[test]
    fn create_requires_title() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.create_novel(NovelDraft::default()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn update_keeps_unset_fields() {
        let catalog = Catalog::new();
        let n = catalog
            .create_novel(NovelDraft {
                title: Some("Dune".into()),
                author: Some("Herbert".into()),
                ..NovelDraft::default()
            })
            .unwrap();

        let updated = catalog
            .update_novel(n.novel_id, NovelDraft {
                description: Some("spice".into()),
                ..NovelDraft::default()
            })
            .unwrap();

        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author.as_deref(), Some("Herbert"));
        assert_eq!(updated.description.as_deref(), Some("spice"));
    }

    #[test]
    fn chapters_number_sequentially_and_stay_unique() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");

        let first = catalog.add_chapter(n.novel_id, chapter("One", None)).unwrap();
        let second = catalog.add_chapter(n.novel_id, chapter("Two", None)).unwrap();
        assert_eq!((first.chapter_number, second.chapter_number), (1, 2));

        assert!(matches!(
            catalog.add_chapter(n.novel_id, chapter("Again", Some(2))),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(catalog.chapter_by_number(n.novel_id, 2).unwrap().title, "Two");
    }

    #[test]
    fn chapter_numbers_must_be_positive_on_add_and_update() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");
        let c = catalog.add_chapter(n.novel_id, chapter("One", None)).unwrap();

        for bad in [0, -3] {
            assert!(matches!(
                catalog.add_chapter(n.novel_id, chapter("Bad", Some(bad))),
                Err(DomainError::Validation(_))
            ));
            assert!(matches!(
                catalog.update_chapter(n.novel_id, c.chapter_id, chapter("Bad", Some(bad))),
                Err(DomainError::Validation(_))
            ));
        }
        assert_eq!(catalog.get_chapter(c.chapter_id).unwrap().chapter_number, 1);
    }

    #[test]
    fn next_number_after_the_largest_is_a_validation_error() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");
        catalog.add_chapter(n.novel_id, chapter("Last", Some(i32::MAX))).unwrap();

        assert!(matches!(
            catalog.add_chapter(n.novel_id, chapter("Overflow", None)),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(catalog.chapters_for(n.novel_id).len(), 1);
    }

    #[test]
    fn concurrent_adds_never_share_a_number() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");

        let (explicit, auto): (Vec<_>, Vec<_>) = std::thread::scope(|scope| {
            let explicit: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| catalog.add_chapter(n.novel_id, chapter("Same", Some(100)))))
                .collect();
            let auto: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| catalog.add_chapter(n.novel_id, chapter("Next", None))))
                .collect();
            (
                explicit.into_iter().map(|h| h.join().unwrap()).collect(),
                auto.into_iter().map(|h| h.join().unwrap()).collect(),
            )
        });

        assert_eq!(explicit.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(auto.iter().all(|r| r.is_ok()));

        let mut numbers: Vec<i32> = catalog
            .chapters_for(n.novel_id)
            .iter()
            .map(|c| c.chapter_number)
            .collect();
        let total = numbers.len();
        numbers.dedup();
        assert_eq!(numbers.len(), total);
        assert_eq!(total, 9);
    }

    #[test]
    fn chapter_for_unknown_novel_is_not_found() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.add_chapter(NovelId::new(99), chapter("x", None)),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_a_novel_removes_its_chapters() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");
        let c = catalog.add_chapter(n.novel_id, chapter("One", None)).unwrap();

        catalog.delete_novel(n.novel_id).unwrap();
        assert!(catalog.get_chapter(c.chapter_id).is_none());
        assert!(catalog.delete_novel(n.novel_id).is_err());
    }

    #[test]
    fn chapter_ops_are_scoped_to_their_novel() {
        let catalog = Catalog::new();
        let a = novel(&catalog, "A");
        let b = novel(&catalog, "B");
        let c = catalog.add_chapter(a.novel_id, chapter("One", None)).unwrap();

        assert!(catalog.delete_chapter(b.novel_id, c.chapter_id).is_err());
        assert!(catalog.update_chapter(b.novel_id, c.chapter_id, chapter("x", None)).is_err());
        assert!(catalog.delete_chapter(a.novel_id, c.chapter_id).is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let catalog = Catalog::new();
        let n = novel(&catalog, "Dune");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["novelId"], 1);
        assert_eq!(json["title"], "Dune");
    }
}
