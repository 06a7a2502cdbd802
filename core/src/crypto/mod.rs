pub mod digest;
pub mod signature;
