//! # Priority Model
//!
//! Pure value types computing an effective integer rank for a component given
//! an optional execution context. Lower ranks initialize earlier.
//!
//! The rank formula is `clamp(0, 999, round((level * 100 + sub_priority +
//! context_adjustment) * weight))`. Weight and context adjustments can move a
//! component outside its level band; callers that need strict banding should
//! leave both at their defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Maximum effective rank
pub const MAX_RANK: u16 = 999;

/// Coarse priority category, each spanning a reserved band of 100 ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Critical,
    Infrastructure,
    Core,
    Service,
    Feature,
    Extension,
    Presentation,
    Background,
    Monitoring,
    Development,
}

impl PriorityLevel {
    /// Base rank of this level's band
    pub fn band(&self) -> u16 {
        (*self as u16) * 100
    }

    /// Level owning the band a numeric rank falls into
    pub fn from_rank(rank: u16) -> Self {
        match rank.min(MAX_RANK) / 100 {
            0 => Self::Critical,
            1 => Self::Infrastructure,
            2 => Self::Core,
            3 => Self::Service,
            4 => Self::Feature,
            5 => Self::Extension,
            6 => Self::Presentation,
            7 => Self::Background,
            8 => Self::Monitoring,
            _ => Self::Development,
        }
    }
}

impl Default for PriorityLevel {
    fn default() -> Self {
        Self::Service
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "critical",
            Self::Infrastructure => "infrastructure",
            Self::Core => "core",
            Self::Service => "service",
            Self::Feature => "feature",
            Self::Extension => "extension",
            Self::Presentation => "presentation",
            Self::Background => "background",
            Self::Monitoring => "monitoring",
            Self::Development => "development",
        };
        write!(f, "{name}")
    }
}

/// Structured component priority
///
/// Out-of-range inputs are clamped at construction: sub-priority to 0-99,
/// weight to 0.1-2.0, context adjustments to -50..=50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    level: PriorityLevel,
    sub_priority: u8,
    weight: f64,
    context_adjustments: HashMap<String, i32>,
}

impl Priority {
    /// Create a priority at the start of the given level band
    pub fn new(level: PriorityLevel) -> Self {
        Self {
            level,
            sub_priority: 0,
            weight: 1.0,
            context_adjustments: HashMap::new(),
        }
    }

    /// Map a plain numeric rank onto (level, sub-priority) by band division
    pub fn from_rank(rank: u16) -> Self {
        let rank = rank.min(MAX_RANK);
        Self {
            level: PriorityLevel::from_rank(rank),
            sub_priority: (rank % 100) as u8,
            weight: 1.0,
            context_adjustments: HashMap::new(),
        }
    }

    /// Set the sub-priority within the level band (clamped to 0-99)
    pub fn with_sub_priority(mut self, sub_priority: u8) -> Self {
        self.sub_priority = sub_priority.min(99);
        self
    }

    /// Set the weight multiplier (clamped to 0.1-2.0)
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.1, 2.0);
        self
    }

    /// Add an adjustment applied when ranking under the named execution
    /// context (clamped to -50..=50)
    pub fn with_context_adjustment(mut self, context: impl Into<String>, adjustment: i32) -> Self {
        self.context_adjustments
            .insert(context.into(), adjustment.clamp(-50, 50));
        self
    }

    pub fn level(&self) -> PriorityLevel {
        self.level
    }

    pub fn sub_priority(&self) -> u8 {
        self.sub_priority
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Adjustment registered for the given context name, 0 when absent
    pub fn context_adjustment(&self, context: Option<&str>) -> i32 {
        context
            .and_then(|name| self.context_adjustments.get(name))
            .copied()
            .unwrap_or(0)
    }

    /// Effective rank under the given execution context, always in [0, 999]
    pub fn effective_rank(&self, context: Option<&str>) -> u16 {
        let base =
            i32::from(self.level.band()) + i32::from(self.sub_priority) + self.context_adjustment(context);
        let weighted = f64::from(base) * self.weight;
        weighted.round().clamp(0.0, f64::from(MAX_RANK)) as u16
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::new(PriorityLevel::Service)
    }
}

impl From<u16> for Priority {
    fn from(rank: u16) -> Self {
        Self::from_rank(rank)
    }
}

/// Ordering inputs for a single component: its priority plus the declared
/// dependency identifiers and carried capability tags
#[derive(Debug, Clone, Default)]
pub struct OrderingProfile {
    pub priority: Priority,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Decide whether `a` should initialize before `b` under the given context.
///
/// Explicit tag-based dependency declarations win: if `b` declares a
/// dependency on a tag `a` carries, `a` precedes `b` regardless of rank, and
/// inversely. Numeric rank comparison is only the fallback when no tag
/// relationship applies. Equal ranks mean neither strictly precedes the other.
pub fn should_initialize_before(
    a: &OrderingProfile,
    b: &OrderingProfile,
    context: Option<&str>,
) -> bool {
    if b.dependencies.iter().any(|dep| a.tags.contains(dep)) {
        return true;
    }
    if a.dependencies.iter().any(|dep| b.tags.contains(dep)) {
        return false;
    }
    a.priority.effective_rank(context) < b.priority.effective_rank(context)
}
