pub mod codes;
pub mod standard_chess;
pub mod telemetry;
