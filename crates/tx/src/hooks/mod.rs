//! Hook execution: the WASM sandbox, the host API, and the state commit
//! protocol.

pub mod error;
pub mod host;
pub mod state;

pub use error::{ExitType, DOESNT_EXIST, INTERNAL_ERROR, OUT_OF_BOUNDS, TOO_BIG, TOO_SMALL};
pub use host::{HookOutcome, HookRuntime};
pub use state::{commit_changes, set_hook_state, BufferedState, ChangeBuffer};
