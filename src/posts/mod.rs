pub mod form;
pub mod repository;
