pub mod domain;
pub mod patterns;
pub mod watch;
