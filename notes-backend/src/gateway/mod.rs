//! WebSocket push channel for list refresh events.

pub mod ws;
