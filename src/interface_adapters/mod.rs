pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
