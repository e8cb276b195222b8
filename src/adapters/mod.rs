pub mod memory;
pub mod postgres;

pub use memory::{MemoryCatalogRepository, MemoryLeadRepository, MemoryTransactionRepository};
pub use postgres::{
    PostgresCatalogRepository, PostgresLeadRepository, PostgresTransactionRepository,
};
