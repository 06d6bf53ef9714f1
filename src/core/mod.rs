pub mod ascii;
pub mod binary;
pub mod compression;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod data_handle;
pub mod dataset;
pub mod error;
pub mod format;
pub mod reader;
