pub mod client_key;
pub mod cors;
pub mod guard;
pub mod middleware;
pub mod principal;
pub mod rejection;
