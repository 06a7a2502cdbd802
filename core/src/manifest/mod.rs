pub mod files;
pub mod merkle;
