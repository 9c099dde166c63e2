pub mod permission_service;
