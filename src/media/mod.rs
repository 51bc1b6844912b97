pub mod buffer;
pub mod capture;
pub mod surface;
pub mod synthetic;
