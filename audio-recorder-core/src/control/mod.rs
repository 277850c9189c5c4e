pub mod method;
pub mod surface;
