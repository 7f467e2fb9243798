//! Users and accounts
//!
//! Plain single-row CRUD over PostgreSQL plus input validation. Balance
//! changes never go through here; see [`crate::ledger`].

pub mod models;
pub mod repository;
pub mod validation;

pub use models::{CreateUserParams, User, UserResponse};
pub use repository::{
    AccountRepository, EntryRepository, RepositoryError, TransferRepository, UserRepository,
};
pub use validation::{Currency, Email, PageParams, Username, ValidationError};

pub use crate::db::Database;
