pub mod customer;
pub mod movement;
pub mod user;
