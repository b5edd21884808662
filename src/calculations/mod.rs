pub mod builder;
pub mod compression;
