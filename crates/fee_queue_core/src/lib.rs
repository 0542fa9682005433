pub mod domain;
pub mod error;
pub mod ledger;
pub mod ports;
pub mod processor;
pub mod queries;
pub mod token;

pub use domain::{
    Account, AccountantProfile, CompletedTotals, Counter, CounterQueueItem, CounterQueueRow,
    CounterStats, EntryStatus, FeeType, NewQueueEntry, NewStudent, QueueEntry, Receipt, Role,
    StudentPaymentItem, StudentPaymentRow, StudentProfile,
};
pub use error::{CoreError, CoreResult};
pub use ledger::QueueLedger;
pub use ports::{IdentityStore, QueueStore};
pub use processor::PaymentProcessor;
pub use queries::QueueQueries;
