// The server module exposes core docs operations as callable tools.
// It owns the tool schemas and the name-to-service dispatch; protocol
// framing stays in main.rs.

#[path = "tools.rs"]
pub mod tools;

#[path = "handler.rs"]
pub mod handler;
