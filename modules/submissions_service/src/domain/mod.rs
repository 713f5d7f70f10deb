//! Domain layer - business logic and services

pub mod catalog;
pub mod delete;
pub mod events;
pub mod field_types;
pub mod files;
pub mod hooks;
pub mod ingestion;
pub mod messages;
pub mod query;
pub mod repository;
pub mod search;
pub mod service;
pub mod stats;
pub mod validation;
pub mod verification;

pub use catalog::{FilterProvider, FormCatalog, InMemoryFormCatalog, SchemaProvider, ViewProvider};
pub use events::{NoOpNotifier, Notifier, SubmissionEvent, SubmissionNotification};
pub use field_types::{
    DateInputTransform, FieldTypeDefinition, FieldTypeRegistry, TransformInput, ValueTransform,
};
pub use files::{FileStorage, FileUploader, NoOpFileStorage, NoOpFileUploader, UploadOutcome};
pub use hooks::{HookContext, HookPhase, HookPoint, HookRegistry, HookStage};
pub use repository::{ColumnValues, SubmissionRepository};
pub use service::{Collaborators, Service};
pub use stats::{InMemorySelectionStore, InMemoryStatsCache, NoOpSelectionStore, SelectionStore, StatsCache};
pub use validation::{FieldSchemaValidator, NoOpValidator, SubmissionValidator};
pub use verification::{BotCheck, Verification};
