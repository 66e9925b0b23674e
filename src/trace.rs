use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::Resources;
use crate::path::PathTier;
use crate::strategies::EventChoice;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub participant: Option<usize>,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TraceKind {
    CardDrawn {
        card: String,
        remaining: usize,
    },
    DeckExhausted,
    EventResolved {
        card: String,
        choice: EventChoice,
        points: f64,
    },
    Produced {
        amount: Resources,
    },
    ActionTaken {
        action: String,
        points: f64,
        recipient: Option<usize>,
    },
    Passed {
        unused_points: u32,
    },
    UpkeepPaid {
        charged: u32,
        points: f64,
    },
    SmallPathLatched {
        title: String,
    },
    EarlyVictory,
    FinalScore {
        score: u32,
        tier: PathTier,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.round)?;
        if let Some(id) = self.participant {
            write!(f, "P{}: ", id)?;
        }

        match &self.kind {
            TraceKind::CardDrawn { card, remaining } => {
                write!(f, "Drew {} ({} left)", card, remaining)
            }
            TraceKind::DeckExhausted => write!(f, "Event deck exhausted"),
            TraceKind::EventResolved {
                card,
                choice,
                points,
            } => {
                write!(f, "{:?} {} ({:+.2})", choice, card, points)
            }
            TraceKind::Produced { amount } => write!(f, "Produced {}", amount),
            TraceKind::ActionTaken {
                action,
                points,
                recipient,
            } => {
                write!(f, "Took {} ({:+.2})", action, points)?;
                if let Some(to) = recipient {
                    write!(f, " gifting P{}", to)?;
                }
                Ok(())
            }
            TraceKind::Passed { unused_points } => {
                write!(f, "Passed with {} action points left", unused_points)
            }
            TraceKind::UpkeepPaid { charged, points } => {
                write!(f, "Paid {} upkeep ({:+.2})", charged, points)
            }
            TraceKind::SmallPathLatched { title } => {
                write!(f, "Reached the small path of the {}", title)
            }
            TraceKind::EarlyVictory => write!(f, "Full path reached, match ends"),
            TraceKind::FinalScore { score, tier } => {
                write!(f, "Final score {} ({} path)", score, tier)
            }
        }
    }
}

/// Journal of one match, in the order things happened.
#[derive(Debug, Clone, Default)]
pub struct MatchTrace {
    events: Vec<TraceEvent>,
}

impl MatchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, round: u32, participant: Option<usize>, kind: TraceKind) {
        self.events.push(TraceEvent {
            timestamp: Utc::now(),
            round,
            participant,
            kind,
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn for_participant(&self, id: usize) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(move |e| e.participant == Some(id))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| format!("Failed to serialize trace: {}", e))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write trace {}: {}", path.display(), e))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read trace {}: {}", path.display(), e))?;
        let events: Vec<TraceEvent> =
            serde_json::from_str(&json).map_err(|e| format!("Failed to parse trace: {}", e))?;
        Ok(Self { events })
    }
}

impl fmt::Display for MatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        Ok(())
    }
}
