pub mod correction;
pub mod project;
pub mod returns;
pub mod schedule;
