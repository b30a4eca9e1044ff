pub mod appointments;
pub mod emis;
pub mod health;
pub mod projects;
pub mod publishing;
