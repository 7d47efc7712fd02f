// src/writer/mod.rs
mod file_writer;

pub use file_writer::Writer;
