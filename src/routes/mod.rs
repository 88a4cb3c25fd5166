pub mod admin;
pub mod export;
pub mod player_api;
pub mod stream;
