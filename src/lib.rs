//! # sealed-chat
//!
//! Backend for an end-to-end encrypted messenger. The server stores
//! accounts, Diffie-Hellman public keys, encrypted session keys and
//! ciphertext messages, and tells clients about new keys and messages
//! through a long-poll event endpoint. It never sees plaintext.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ChatService, TokenIssuer (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── ResourcePool (pool/)
//!     │
//!     └── PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod pool;
pub mod service;
