//! Note collection repository.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::models::note::{dedup_tags, Note};
use crate::{AppError, Result};

use super::collection::Collection;
use super::kv_store::KeyValueStore;

/// Store key for the note list.
pub const NOTES_KEY: &str = "notes";

/// Title given to notes saved without one.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Fields supplied when creating or editing a note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteDraft {
    /// Heading; blank becomes [`UNTITLED_NOTE`].
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Labels; duplicates are dropped.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attached image as a data URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl NoteDraft {
    fn validate(&self) -> Result<()> {
        let has_image = self.image.as_deref().is_some_and(|img| !img.is_empty());
        if self.title.trim().is_empty() && self.content.trim().is_empty() && !has_image {
            return Err(AppError::InvalidInput(
                "note needs a title, content, or image".into(),
            ));
        }
        Ok(())
    }

    fn title_or_default(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED_NOTE.to_owned()
        } else {
            title.to_owned()
        }
    }
}

/// Repository over the persisted note list. Newest notes come first.
#[derive(Clone)]
pub struct NoteRepo {
    notes: Collection<Note>,
}

impl NoteRepo {
    /// Create a new repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            notes: Collection::new(store, NOTES_KEY),
        }
    }

    /// All notes in store order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Note>> {
        self.notes.load().await
    }

    /// Look up one note.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no note has this id.
    pub async fn get(&self, id: &str) -> Result<Note> {
        self.list()
            .await?
            .into_iter()
            .find(|note| note.id == id)
            .ok_or_else(|| AppError::NotFound(format!("note {id}")))
    }

    /// Create a note from user-entered fields and put it first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` when title, content, and image are
    /// all empty.
    pub async fn create(&self, draft: NoteDraft) -> Result<Note> {
        draft.validate()?;
        let note = Note::new(
            draft.title_or_default(),
            draft.content,
            draft.tags,
            draft.image,
        );
        self.prepend(note).await
    }

    /// Put an already-built note first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn prepend(&self, note: Note) -> Result<Note> {
        let created = note.clone();
        self.notes
            .mutate(move |items| {
                items.insert(0, note);
                Ok(())
            })
            .await?;
        info!(note_id = %created.id, "note created");
        Ok(created)
    }

    /// Replace a note's fields, keeping its id and position.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id or
    /// `AppError::InvalidInput` for an empty draft.
    pub async fn update(&self, id: &str, draft: NoteDraft) -> Result<Note> {
        draft.validate()?;
        let title = draft.title_or_default();
        self.notes
            .mutate(|items| {
                let note = items
                    .iter_mut()
                    .find(|note| note.id == id)
                    .ok_or_else(|| AppError::NotFound(format!("note {id}")))?;
                note.title = title;
                note.content = draft.content;
                note.tags = dedup_tags(draft.tags);
                note.image = draft.image;
                Ok(note.clone())
            })
            .await
    }

    /// Remove a note.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.notes
            .mutate(|items| {
                let before = items.len();
                items.retain(|note| note.id != id);
                if items.len() == before {
                    return Err(AppError::NotFound(format!("note {id}")));
                }
                Ok(())
            })
            .await?;
        info!(note_id = id, "note deleted");
        Ok(())
    }

    /// Notes whose title, content, or tags contain `term`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn search(&self, term: &str) -> Result<Vec<Note>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|note| note.matches(term))
            .collect())
    }
}
