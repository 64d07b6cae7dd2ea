pub mod portfolio;
pub mod profile;
pub mod summary;
pub mod transaction;
