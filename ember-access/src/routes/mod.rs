pub mod health;
pub mod internal;
pub mod overlays;
pub mod roles;
pub mod users;
