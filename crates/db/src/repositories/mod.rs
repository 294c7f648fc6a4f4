//! Repository implementations for data access.
//!
//! Repositories implement the statement engine's data traits,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod statement;

pub use statement::StatementRepository;
