pub mod catalog;
pub mod history;
pub mod lead;
pub mod transaction;

pub use catalog::{ServiceCategory, ServiceOffering, Setting};
pub use history::HistoryEntry;
pub use lead::{Lead, LeadStatus};
pub use transaction::{PaymentMethod, Transaction, TransactionStatus};
