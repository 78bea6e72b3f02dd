pub mod gate;
pub mod revocation;
pub mod token_service;
