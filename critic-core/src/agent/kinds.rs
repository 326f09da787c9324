//! Analysis agent definitions
//!
//! Each agent is a fixed analytical specialization applied to one file
//! via one model call. Specializations are expressed as embedded system
//! prompt templates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::review::Category;

/// Embedded system prompts for each agent kind
const LOGIC_PROMPT: &str = include_str!("prompts/logic.md");
const READABILITY_PROMPT: &str = include_str!("prompts/readability.md");
const PERFORMANCE_PROMPT: &str = include_str!("prompts/performance.md");
const SECURITY_PROMPT: &str = include_str!("prompts/security.md");

/// The analysis specializations available to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Logic errors, edge cases, incorrect algorithms
    Logic,
    /// Clarity, naming, maintainability
    Readability,
    /// Bottlenecks and inefficiencies
    Performance,
    /// Vulnerabilities and unsafe handling of data
    Security,
}

impl AgentKind {
    /// All agents, in the order full mode runs them
    pub fn all() -> &'static [AgentKind] {
        &[
            AgentKind::Logic,
            AgentKind::Readability,
            AgentKind::Performance,
            AgentKind::Security,
        ]
    }

    /// The reduced agent set used by quick mode
    pub fn quick() -> &'static [AgentKind] {
        &[AgentKind::Logic, AgentKind::Security]
    }

    /// Get the short name for this agent
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Logic => "logic",
            AgentKind::Readability => "readability",
            AgentKind::Performance => "performance",
            AgentKind::Security => "security",
        }
    }

    /// Get a description of what this agent looks for
    pub fn description(&self) -> &'static str {
        match self {
            AgentKind::Logic => "Identifies logic errors and bugs",
            AgentKind::Readability => "Checks code clarity and maintainability",
            AgentKind::Performance => "Identifies performance bottlenecks",
            AgentKind::Security => "Detects security vulnerabilities",
        }
    }

    /// The category this agent's findings default to
    pub fn category(&self) -> Category {
        match self {
            AgentKind::Logic => Category::Logic,
            AgentKind::Readability => Category::Readability,
            AgentKind::Performance => Category::Performance,
            AgentKind::Security => Category::Security,
        }
    }

    /// The fixed system instruction for this agent
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentKind::Logic => LOGIC_PROMPT,
            AgentKind::Readability => READABILITY_PROMPT,
            AgentKind::Performance => PERFORMANCE_PROMPT,
            AgentKind::Security => SECURITY_PROMPT,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logic" => Ok(AgentKind::Logic),
            "readability" => Ok(AgentKind::Readability),
            "performance" => Ok(AgentKind::Performance),
            "security" => Ok(AgentKind::Security),
            _ => Err(format!("Unknown agent: {}", s)),
        }
    }
}
