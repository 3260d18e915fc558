pub mod export;
pub mod field;
pub mod order;
pub mod persist;
pub mod pricing;
pub mod puzzle;
