//! Driver for the agent runtime subprocess.
//!
//! Each battle is one invocation of the runtime CLI:
//!
//! ```text
//! RunConfig
//!     │
//!     ▼
//! RuntimeProcess  ← spawns `<runtime> agent -m <instruction>`
//!     │              drains stdout/stderr into bounded buffers
//!     ▼
//! RunResult       ← exit code plus output tails
//! ```
//!
//! Credentials travel only through [`RunConfig::env`]. The runtime is killed
//! if the future driving it is dropped.

pub mod error;
pub mod runner;
pub mod types;

pub(crate) mod process;

pub use error::AgentError;
pub use runner::{locate_runtime, run, runtime_available};
pub use types::{last_chars, RunConfig, RunResult};

pub type Result<T> = std::result::Result<T, AgentError>;
