pub mod review;
pub mod shop;
pub mod user;
