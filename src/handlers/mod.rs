pub mod customer;
pub mod movement;
pub mod stats;
pub mod user;
