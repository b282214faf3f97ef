pub mod outbox;
pub mod registry;
pub mod ticker;
