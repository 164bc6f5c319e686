pub mod dashboard;
pub mod history;
pub mod levels;
pub mod practice;
