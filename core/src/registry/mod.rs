pub mod claims;
pub mod evidence;
pub mod model;
pub mod normalize;
