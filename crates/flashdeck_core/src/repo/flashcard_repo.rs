//! Flashcard repository contract and its record-backed implementation.

use crate::model::flashcard::{Difficulty, Flashcard};
use crate::model::validation::ValidationError;
use crate::repo::crud::{CrudRepository, FieldValue, Fields, PageQuery, Record, RecordId};
use crate::repo::schema::{CollectionSchema, FieldDef, FieldKind, IdKind};
use crate::repo::{PersistenceError, RepoResult};

pub const FLASHCARDS_SCHEMA: CollectionSchema = CollectionSchema {
    name: "flashcards",
    id_field: "id",
    id_kind: IdKind::Text,
    fields: &[
        FieldDef::required("user_id", FieldKind::Text),
        FieldDef::required("front", FieldKind::Text),
        FieldDef::required("back", FieldKind::Text),
        FieldDef::required("difficulty", FieldKind::Text),
        FieldDef::required("created_at", FieldKind::Timestamp),
        FieldDef::optional("updated_at", FieldKind::Timestamp),
    ],
};

/// Entity-level persistence for flashcards.
pub trait FlashcardRepository {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Flashcard>>;
    /// All cards referencing `user_id`, identifier order.
    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Vec<Flashcard>>;
    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<Flashcard>>;
    fn save(&self, flashcard: &Flashcard) -> RepoResult<Flashcard>;
    fn delete(&self, id: &str) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
}

impl<T: FlashcardRepository + ?Sized> FlashcardRepository for &T {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Flashcard>> {
        (**self).find_by_id(id)
    }

    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Vec<Flashcard>> {
        (**self).find_by_user_id(user_id)
    }

    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<Flashcard>> {
        (**self).find_all(page)
    }

    fn save(&self, flashcard: &Flashcard) -> RepoResult<Flashcard> {
        (**self).save(flashcard)
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }
}

/// `FlashcardRepository` over a generic record repository.
pub struct RecordFlashcardRepository<R: CrudRepository> {
    records: R,
}

impl<R: CrudRepository> RecordFlashcardRepository<R> {
    /// Wraps `records`, which must serve `FLASHCARDS_SCHEMA`.
    pub fn try_new(records: R) -> RepoResult<Self> {
        if records.schema() != &FLASHCARDS_SCHEMA {
            return Err(PersistenceError::InvalidSchema(format!(
                "flashcard repository needs the `flashcards` schema, got `{}`",
                records.schema().name
            )));
        }
        Ok(Self { records })
    }
}

impl<R: CrudRepository> FlashcardRepository for RecordFlashcardRepository<R> {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Flashcard>> {
        self.records
            .get_by_id(&RecordId::from(id))?
            .map(|record| flashcard_from_record(&record))
            .transpose()
    }

    fn find_by_user_id(&self, user_id: &str) -> RepoResult<Vec<Flashcard>> {
        self.records
            .find_by_field("user_id", &FieldValue::from(user_id), None)?
            .iter()
            .map(flashcard_from_record)
            .collect()
    }

    fn find_all(&self, page: &PageQuery) -> RepoResult<Vec<Flashcard>> {
        self.records
            .get_all(page)?
            .iter()
            .map(flashcard_from_record)
            .collect()
    }

    fn save(&self, flashcard: &Flashcard) -> RepoResult<Flashcard> {
        let record = self
            .records
            .save(&RecordId::from(flashcard.id()), &flashcard_to_fields(flashcard))?;
        flashcard_from_record(&record)
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        self.records.delete(&RecordId::from(id))
    }

    fn count(&self) -> RepoResult<u64> {
        self.records.count()
    }
}

fn flashcard_to_fields(card: &Flashcard) -> Fields {
    [
        ("user_id", FieldValue::from(card.user_id())),
        ("front", FieldValue::from(card.front())),
        ("back", FieldValue::from(card.back())),
        ("difficulty", FieldValue::from(card.difficulty().as_str())),
        ("created_at", FieldValue::Timestamp(card.created_at())),
        (
            "updated_at",
            card.updated_at()
                .map_or(FieldValue::Null, FieldValue::Timestamp),
        ),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

fn flashcard_from_record(record: &Record) -> RepoResult<Flashcard> {
    let invalid = |err: ValidationError| {
        PersistenceError::InvalidData(format!(
            "stored flashcard `{}` is invalid: {err}",
            record.id
        ))
    };
    let difficulty = record
        .text("difficulty")?
        .parse::<Difficulty>()
        .map_err(invalid)?;
    Flashcard::restore(
        record.text_id()?,
        record.text("user_id")?,
        record.text("front")?,
        record.text("back")?,
        difficulty,
        record.timestamp("created_at")?,
        record.optional_timestamp("updated_at")?,
    )
    .map_err(invalid)
}
