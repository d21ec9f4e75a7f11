pub mod appuntamento;
pub mod auth_log;
pub mod auth_password;
pub mod auth_user;
pub mod bolla;
pub mod cliente;
pub mod pozzo;
