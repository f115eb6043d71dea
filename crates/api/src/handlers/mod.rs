pub mod executions;
pub mod projects;
pub mod scripts;
pub mod vehicles;
