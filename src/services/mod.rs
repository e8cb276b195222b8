pub mod catalog;
pub mod lead;
pub mod mailer;
pub mod transaction;

pub use catalog::{CatalogService, ServiceInput};
pub use lead::{CreateLead, LeadService};
pub use mailer::{MailTransport, Mailer, SentMail};
pub use transaction::{
    AdminActor, DeclareOutcome, DeclareTransaction, TransactionService, VerifyAction,
    VerifyOutcome,
};
