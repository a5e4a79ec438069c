pub mod area;
pub mod error;
pub mod writer;
