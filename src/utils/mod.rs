pub mod disposition;
pub mod validation;
