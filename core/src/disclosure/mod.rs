pub mod bundle;
pub mod evidence_index;
pub mod license_gate;
pub mod writer;
