pub mod authority;
pub mod clock;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod models;
pub mod session;
