pub mod cookies;
pub mod general;
