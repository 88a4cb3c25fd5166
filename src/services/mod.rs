pub mod auth;
pub mod catalog_cache;
pub mod epg_cache;
pub mod fetcher;
pub mod m3u_parser;
pub mod refresh;
