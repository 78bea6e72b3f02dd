pub mod request_log;
pub mod response;
pub mod server;
pub mod streams;
pub mod users;
