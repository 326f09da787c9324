//! Review agents: specialist prompts and response parsing
//!
//! Each agent couples a system prompt with a finding category. Agents are
//! stateless; the orchestrator pairs them with files and dispatches the
//! resulting prompts through a provider.

mod kinds;
mod parse;
mod prompt;

pub use kinds::AgentKind;
pub use parse::parse_response;
pub use prompt::{build_prompt, BuiltPrompt};
