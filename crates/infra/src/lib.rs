//! Infrastructure layer: in-memory stores and the file root guard.
//!
//! Everything here is a stand-in for a real database; the API only talks to
//! these types through their public methods.

pub mod catalog;
pub mod files;
pub mod shelf;
pub mod store;
pub mod users;

pub use catalog::{Catalog, Chapter, ChapterDraft, Novel, NovelDraft};
pub use files::{FileAccessError, FileRoot};
pub use shelf::{LibraryEntry, ReadingProgress, ReadingShelf};
pub use store::{EntityStore, IdSequence, InMemoryStore};
pub use users::{UserDirectory, UserRecord};
