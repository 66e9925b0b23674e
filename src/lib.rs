pub mod batch;
pub mod cli;
pub mod core;
pub mod engine;
pub mod events;
pub mod experiment;
pub mod path;
pub mod rules;
pub mod strategies;
pub mod trace;

pub use batch::{BatchReport, SimConfig, Simulator, StrategyAssignment};
pub use engine::{Match, MatchOutcome, Seat};
pub use rules::{Role, RuleError, Ruleset};
pub use strategies::{Strategy, StrategyKind};

#[cfg(test)]
mod events_test;
#[cfg(test)]
mod rules_test;
