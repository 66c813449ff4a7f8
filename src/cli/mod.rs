//! # CLI Module
//!
//! Command-line access to parameter decoding, for checking how a document's
//! parameters will treat real-world values.
//!
//! ## Commands
//!
//! ### `inspect`
//!
//! List each operation's parameters with location, style, explode, required
//! flag and schema shape:
//!
//! ```bash
//! brrtparam inspect --spec openapi.yaml
//! ```
//!
//! ### `decode`
//!
//! Decode one raw value and print the typed result as JSON:
//!
//! ```bash
//! brrtparam decode --spec openapi.yaml --operation list_pets --param tags --value "a,b,c"
//! ```
//!
//! A rejected value prints the error report (status, path, message) and
//! exits with status 1.
//!
//! ### `request`
//!
//! Extract and decode every parameter of an operation from a request:
//!
//! ```bash
//! brrtparam request --spec openapi.yaml --operation "GET /pets/{id}" \
//!     --url "/pets/5?verbose=true" -H "X-Trace: abc" --cookie "session=xyz"
//! ```
//!
//! ## Environment
//!
//! Decode limits come from `BRRTR_PARAM_MAX_DEPTH` / `BRRTR_PARAM_MAX_ITEMS`,
//! logging from the `BRRTR_LOG_*` variables.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{describe_schema, execute, run_cli, Cli, Commands};
