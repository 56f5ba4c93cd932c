pub mod connection;
pub mod ledger;
pub mod migration_runner;

pub use connection::Database;
pub use ledger::SqliteLedgerStore;
