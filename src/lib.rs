//! Programmable HTTP mock server
//!
//! Register a response for a `(path, method)` pair over the admin API and the
//! server replays it, verbatim, to every client that sends a matching request.
//!
//! # Features
//!
//! - **Exact Routing**: Mocks are keyed by exact path and exact method
//! - **Static Responses**: Status, headers and body are replayed as stored
//! - **JSON Bodies**: Structured bodies are serialized with `application/json`
//! - **Latency Simulation**: Per-mock delay, capped at 2000ms
//! - **Admin API**: List, create and delete mocks at runtime
//!
//! # Example Configuration
//!
//! ```yaml
//! mocks:
//!   - path: /hello
//!     method: GET
//!     status_code: 200
//!     response_body:
//!       message: "Hello, World!"
//! ```

pub mod admin;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod registry;
pub mod server;

pub use config::MockServerConfig;
pub use dispatcher::Dispatcher;
pub use mock::{MockDefinition, ResponseBody};
pub use registry::Registry;
pub use server::AppState;
