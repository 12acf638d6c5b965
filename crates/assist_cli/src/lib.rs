//! Line-oriented terminal front end for the assistant transport.
//!
//! ## Provider bootstrap
//!
//! `ASSIST_PROVIDER` selects the collaborator pair behind the transport:
//!
//! - `mock` (default) streams a local demo echo, no network involved
//! - `http` talks to the assistant service at `ASSIST_BASE_URL`
//!
//! The HTTP provider also reads `ASSIST_ACCESS_TOKEN`, `ASSIST_ENGINE` and
//! `ASSIST_TIMEOUT_SECS`. `ASSIST_SESSION_ID` resumes an existing remote
//! session instead of creating one on the first message.
//!
//! Each non-command input line is one exchange. Ctrl-C cancels the exchange in
//! flight; at the prompt it exits. When `ASSIST_TRANSCRIPT_DIR` is set, both
//! sides of every exchange are appended to a JSONL transcript there.

pub mod chat;
pub mod commands;
pub mod providers;
