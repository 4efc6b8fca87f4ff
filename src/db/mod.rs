//! Database layer: SQLite pool, migration, and the credential store.

mod pool;
mod store;

pub use pool::{create_pool, run_migrations, DbPool};
pub use store::{User, UserFilter, UserPatch, UserStore};
