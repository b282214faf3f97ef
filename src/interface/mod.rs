pub mod mirror;
pub mod protocol;
