pub mod auth;
pub mod health;
pub mod managers;
pub mod users;
