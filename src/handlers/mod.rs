/// HTTP and WebSocket handlers
pub mod rest;
mod staging;
pub mod websocket;
