//! Consign Server - consignment marketplace backend
//!
//! # Architecture overview
//!
//! The server is organised around the consignment lifecycle: a user
//! submits an intake query, an admin walks it through an approval
//! state machine, an approved query is promoted into a sellable
//! listing, and every sale of a listed unit records a settlement
//! ledger entry owed to the seller.
//!
//! # Module structure
//!
//! ```text
//! consign-server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── db/            # Embedded SurrealDB, models, repositories
//! ├── services/      # Business services and collaborator traits
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging, validation
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export public types
pub use core::{AppState, Config, Server};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger;
