//! Console V1 endpoints

pub mod locks;
pub mod route;
