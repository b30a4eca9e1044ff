pub mod appointment;
pub mod emis;
pub mod project;
pub mod publishable;
