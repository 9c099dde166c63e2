pub mod access_client;
pub mod action_service;
