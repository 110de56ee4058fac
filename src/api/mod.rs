/// REST API types
pub mod dto;
