pub mod appointments;
pub mod emis;
pub mod projects;
pub mod publishing;
