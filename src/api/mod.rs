// Dashboard surface: REST endpoints plus the scan-event websocket feed.

pub mod rest;
pub mod ws;
