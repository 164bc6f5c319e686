use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Feedback, Profile};

pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;
pub const XP_PER_CORRECT_ANSWER: u32 = 10;
pub const ROUNDS_PER_LEVEL: u32 = 10;
pub const LEVEL_COMPLETION_XP_PER_LEVEL: u32 = 100;
pub const WRONG_ANSWER_PENALTY: u32 = 2;
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(1000);
pub const SIGHT_READING_DURATION: Duration = Duration::from_secs(60);

const SIMPLE_XP_PER_LEVEL: u64 = 100;
const MILESTONE_XP_STEP: u64 = 1000;

/// A validated, strictly positive XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct XpAmount(u32);

impl XpAmount {
    pub fn new(amount: i64) -> Result<Self> {
        if amount <= 0 || amount > u32::MAX as i64 {
            return Err(Error::InvalidXp(amount));
        }
        Ok(Self(amount as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// XP for finishing all rounds of `level`.
    pub fn for_completed_level(level: u32) -> Self {
        Self(level.max(1).saturating_mul(LEVEL_COMPLETION_XP_PER_LEVEL))
    }

    pub fn for_correct_answer() -> Self {
        Self(XP_PER_CORRECT_ANSWER)
    }
}

/// How cumulative XP maps to a level. Both rules exist in the wild; callers
/// pick one explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelingPolicy {
    /// `floor(xp / 100) + 1`.
    Simple,
    /// One level per crossing of `(level + 1) * 1000`. A single award that
    /// crosses several thresholds climbs all of them at once rather than
    /// capping at one level per award.
    #[default]
    Milestone,
}

impl LevelingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelingPolicy::Simple => "simple",
            LevelingPolicy::Milestone => "milestone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simple" | "flat" | "a" => Some(LevelingPolicy::Simple),
            "milestone" | "b" => Some(LevelingPolicy::Milestone),
            _ => None,
        }
    }

    /// Level reached with `xp`, starting from `current_level`.
    pub fn level_for(&self, current_level: u32, xp: u64) -> u32 {
        match self {
            LevelingPolicy::Simple => {
                u32::try_from(xp / SIMPLE_XP_PER_LEVEL + 1).unwrap_or(u32::MAX)
            }
            // Highest level whose threshold `xp` has crossed; never drops.
            LevelingPolicy::Milestone => {
                let crossed = u32::try_from(xp / MILESTONE_XP_STEP).unwrap_or(u32::MAX);
                current_level.max(1).max(crossed)
            }
        }
    }

    /// Cumulative XP at which `level` begins.
    pub fn xp_for_level(&self, level: u32) -> u64 {
        match self {
            LevelingPolicy::Simple => u64::from(level.saturating_sub(1)) * SIMPLE_XP_PER_LEVEL,
            LevelingPolicy::Milestone if level <= 1 => 0,
            LevelingPolicy::Milestone => u64::from(level) * MILESTONE_XP_STEP,
        }
    }

    /// Fraction of the way from the start of `level` to the next one.
    pub fn progress_in_level(&self, level: u32, xp: u64) -> f64 {
        let start = self.xp_for_level(level);
        let next = self.xp_for_level(level.saturating_add(1));
        if next <= start {
            return 1.0;
        }
        let earned = xp.saturating_sub(start).min(next - start);
        earned as f64 / (next - start) as f64
    }

    /// XP still needed to reach the next level.
    pub fn xp_to_next_level(&self, level: u32, xp: u64) -> u64 {
        let next = match self {
            LevelingPolicy::Simple => u64::from(level) * SIMPLE_XP_PER_LEVEL,
            LevelingPolicy::Milestone => (u64::from(level) + 1) * MILESTONE_XP_STEP,
        };
        next.saturating_sub(xp)
    }
}

/// Per-player state carried through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub xp: u64,
    pub level: u32,
    pub score: u32,
    pub feedback: Option<Feedback>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            score: 0,
            feedback: None,
        }
    }
}

impl ProgressionState {
    /// Session start state seeded from the persisted profile.
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            xp: profile.xp,
            level: profile.level.max(1),
            ..Self::default()
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            xp: self.xp,
            level: self.level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpApplied {
    pub state: ProgressionState,
    pub leveled_up: bool,
}

pub fn apply_xp(current: &ProgressionState, gained: XpAmount, policy: LevelingPolicy) -> XpApplied {
    let xp = current.xp.saturating_add(u64::from(gained.get()));
    let level = policy.level_for(current.level, xp);
    let leveled_up = level > current.level;

    if leveled_up {
        info!(from = current.level, to = level, xp, policy = policy.as_str(), "level up");
    }

    XpApplied {
        state: ProgressionState {
            xp,
            level,
            ..*current
        },
        leveled_up,
    }
}

/// Phases of a single practice round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    Idle,
    AwaitingAnswer,
    Correct,
    Incorrect,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::AwaitingAnswer => "awaiting an answer",
            RoundPhase::Correct => "showing correct feedback",
            RoundPhase::Incorrect => "showing incorrect feedback",
        }
    }

    /// A new challenge was generated.
    pub fn present(self) -> Result<Self> {
        match self {
            RoundPhase::Idle => Ok(RoundPhase::AwaitingAnswer),
            other => Err(Error::InvalidTransition {
                action: "present a challenge",
                phase: other.as_str(),
            }),
        }
    }

    pub fn answer(self, correct: bool) -> Result<Self> {
        match self {
            RoundPhase::AwaitingAnswer if correct => Ok(RoundPhase::Correct),
            RoundPhase::AwaitingAnswer => Ok(RoundPhase::Incorrect),
            other => Err(Error::InvalidTransition {
                action: "submit an answer",
                phase: other.as_str(),
            }),
        }
    }

    /// Feedback has been shown; ready for the next challenge.
    pub fn finish(self) -> Result<Self> {
        match self {
            RoundPhase::Correct | RoundPhase::Incorrect => Ok(RoundPhase::Idle),
            other => Err(Error::InvalidTransition {
                action: "finish the round",
                phase: other.as_str(),
            }),
        }
    }

    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            RoundPhase::Correct => Some(Feedback::Correct),
            RoundPhase::Incorrect => Some(Feedback::Incorrect),
            _ => None,
        }
    }
}
