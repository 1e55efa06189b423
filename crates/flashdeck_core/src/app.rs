//! Startup wiring and shutdown.
//!
//! # Responsibility
//! - Open the configured backend as one explicitly owned handle.
//! - Build repositories over that handle and hand them to services.
//!
//! # Invariants
//! - Everything wired from a `Backend` borrows it; the handle outlives all
//!   repositories and is closed explicitly afterwards.
//! - No process-wide state: two `Backend`s never share storage unless they
//!   point at the same file.

use crate::config::BackendConfig;
use crate::db::{close_db, open_db, open_db_in_memory};
use crate::repo::crud::CrudRepository;
use crate::repo::document_crud::DocumentCrudRepository;
use crate::repo::document_store::DocumentStore;
use crate::repo::flashcard_repo::{RecordFlashcardRepository, FLASHCARDS_SCHEMA};
use crate::repo::schema::CollectionSchema;
use crate::repo::sqlite_crud::SqliteCrudRepository;
use crate::repo::user_repo::{RecordUserRepository, USERS_SCHEMA};
use crate::repo::RepoResult;
use crate::service::flashcard_service::FlashcardService;
use crate::service::generator::ContentGenerator;
use crate::service::user_service::UserService;
use log::info;
use rusqlite::Connection;

/// Type-erased record repository borrowing a `Backend`.
pub type BoxedRecords<'b> = Box<dyn CrudRepository + 'b>;
pub type WiredUserRepository<'b> = RecordUserRepository<BoxedRecords<'b>>;
pub type WiredFlashcardRepository<'b> = RecordFlashcardRepository<BoxedRecords<'b>>;
pub type WiredUserService<'s, 'b> = UserService<&'s WiredUserRepository<'b>>;
pub type WiredFlashcardService<'s, 'b> = FlashcardService<
    &'s WiredUserRepository<'b>,
    &'s WiredFlashcardRepository<'b>,
    &'s (dyn ContentGenerator + 'b),
>;

/// Open persistence handle.
pub enum Backend {
    Sqlite(Connection),
    Documents(DocumentStore),
}

impl Backend {
    pub fn open(config: &BackendConfig) -> RepoResult<Self> {
        let backend = match config {
            BackendConfig::SqliteFile(path) => Self::Sqlite(open_db(path)?),
            BackendConfig::SqliteMemory => Self::Sqlite(open_db_in_memory()?),
            BackendConfig::Documents(Some(path)) => Self::Documents(DocumentStore::open(path)?),
            BackendConfig::Documents(None) => Self::Documents(DocumentStore::in_memory()),
        };
        info!(
            "event=backend_open module=app status=ok backend={}",
            backend.name()
        );
        Ok(backend)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Documents(_) => "documents",
        }
    }

    /// Builds a record repository for `schema` over this backend.
    pub fn records(&self, schema: CollectionSchema) -> RepoResult<BoxedRecords<'_>> {
        let records: BoxedRecords<'_> = match self {
            Self::Sqlite(conn) => Box::new(SqliteCrudRepository::try_new(conn, schema)?),
            Self::Documents(store) => Box::new(DocumentCrudRepository::try_new(store, schema)?),
        };
        Ok(records)
    }

    /// Releases the handle, flushing the document file when there is one.
    pub fn close(self) -> RepoResult<()> {
        let name = self.name();
        match self {
            Self::Sqlite(conn) => close_db(conn)?,
            Self::Documents(store) => store.close()?,
        }
        info!("event=backend_close module=app status=ok backend={name}");
        Ok(())
    }
}

/// Repositories and the generator wired over one backend.
pub struct AppServices<'b> {
    users: WiredUserRepository<'b>,
    flashcards: WiredFlashcardRepository<'b>,
    generator: Box<dyn ContentGenerator + 'b>,
}

impl<'b> AppServices<'b> {
    pub fn wire(
        backend: &'b Backend,
        generator: Box<dyn ContentGenerator + 'b>,
    ) -> RepoResult<Self> {
        let users = RecordUserRepository::try_new(backend.records(USERS_SCHEMA)?)?;
        let flashcards = RecordFlashcardRepository::try_new(backend.records(FLASHCARDS_SCHEMA)?)?;
        info!(
            "event=services_wire module=app status=ok backend={} generator={}",
            backend.name(),
            generator.model_name()
        );
        Ok(Self {
            users,
            flashcards,
            generator,
        })
    }

    pub fn users(&self) -> WiredUserService<'_, 'b> {
        UserService::new(&self.users)
    }

    pub fn flashcards(&self) -> WiredFlashcardService<'_, 'b> {
        FlashcardService::new(&self.users, &self.flashcards, &*self.generator)
    }
}
