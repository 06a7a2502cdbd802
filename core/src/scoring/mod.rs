pub mod corroboration;
pub mod domain;
