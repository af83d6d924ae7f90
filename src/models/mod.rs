pub mod brand;
pub mod campaign;
pub mod contact;
pub mod email_log;
pub mod user;
pub mod warmup;
