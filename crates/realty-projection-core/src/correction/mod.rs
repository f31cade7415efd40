pub mod accumulator;
pub mod index;
