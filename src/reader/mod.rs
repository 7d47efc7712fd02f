// src/reader/mod.rs
mod file_reader;

pub use file_reader::Reader;
