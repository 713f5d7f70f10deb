//! Storage layer - per-form tables, statements and repositories

pub mod mapper;
pub mod repositories;
pub mod schema;
pub mod statements;

pub use repositories::SeaOrmSubmissionRepository;
pub use schema::provision_form_table;
