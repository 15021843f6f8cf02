// SPDX-License-Identifier: MIT OR Apache-2.0
//! Game-side collaborator for effect graphs.
//!
//! Nodes that touch the game world (stats, damage, external events) go
//! through [`EffectHost`], so the engine itself stays free of game state.

use crate::evaluation::Reentry;
use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Character stats an effect can read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    /// Attack damage
    Ad,
    /// Ability power
    Ap,
    /// Attacks per second
    AttackSpeed,
    /// Critical strike chance
    CritChance,
    /// Critical strike damage multiplier
    CritDamage,
    /// Percent armor penetration
    ArmorPen,
    /// Flat armor penetration
    FlatArmorPen,
    /// Percent magic penetration
    MagicPen,
    /// Flat magic penetration
    FlatMagicPen,
    /// Share of damage dealt returned as health
    LifeSteal,
    /// Armor
    Ar,
    /// Magic resist
    Mr,
    /// Crowd control reduction
    Tenacity,
    /// Movement speed
    MoveSpeed,
    /// Ability cooldown reduction
    AbilityHaste,
    /// Melee attack range
    MeleeRange,
    /// Ranged attack range
    RangedRange,
    /// Passive gold income
    GoldGeneration,
    /// Current health
    Health,
    /// Maximum health
    MaxHealth,
    /// Health regenerated per tick
    HealthRegen,
    /// Seconds between health ticks
    HealthRegenRate,
    /// Current mana or energy
    Resource,
    /// Maximum mana or energy
    MaxResource,
    /// Resource regenerated per tick
    ResourceRegen,
    /// Seconds between resource ticks
    ResourceRegenRate,
}

impl StatType {
    /// All stats, in declaration order
    pub fn all() -> &'static [StatType] {
        use StatType::*;
        &[
            Ad, Ap, AttackSpeed, CritChance, CritDamage, ArmorPen, FlatArmorPen, MagicPen,
            FlatMagicPen, LifeSteal, Ar, Mr, Tenacity, MoveSpeed, AbilityHaste, MeleeRange,
            RangedRange, GoldGeneration, Health, MaxHealth, HealthRegen, HealthRegenRate,
            Resource, MaxResource, ResourceRegen, ResourceRegenRate,
        ]
    }
}

impl FromStr for StatType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|stat| format!("{stat:?}").eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Whose stats an effect addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetSelector {
    /// The caster
    #[default]
    Player,
    /// The current target
    Target,
}

impl FromStr for TargetSelector {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "player" => Ok(Self::Player),
            "target" => Ok(Self::Target),
            _ => Err(UnknownOption(s.to_string())),
        }
    }
}

/// Damage classes and their mitigating stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageType {
    /// Mitigated by armor
    #[default]
    Physical,
    /// Mitigated by magic resist
    Magic,
    /// Never mitigated
    True,
}

impl DamageType {
    /// Stat that reduces this damage type
    pub fn resistance(self) -> Option<StatType> {
        match self {
            Self::Physical => Some(StatType::Ar),
            Self::Magic => Some(StatType::Mr),
            Self::True => None,
        }
    }

    /// Damage left after applying `resistance`.
    ///
    /// Positive resistance scales by `100 / (100 + r)`; negative resistance
    /// amplifies by `2 - 100 / (100 - r)`.
    pub fn mitigate(self, damage: f32, resistance: f32) -> f32 {
        if self == Self::True {
            return damage;
        }
        if resistance >= 0.0 {
            damage * (100.0 / (100.0 + resistance))
        } else {
            damage * (2.0 - 100.0 / (100.0 - resistance))
        }
    }
}

impl FromStr for DamageType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "physical" => Ok(Self::Physical),
            "magic" => Ok(Self::Magic),
            "true" => Ok(Self::True),
            _ => Err(UnknownOption(s.to_string())),
        }
    }
}

/// External occurrences event nodes can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostEvent {
    /// The player landed an auto attack
    AutoAttack,
}

/// Game-side services available to nodes
pub trait EffectHost: Send + Sync {
    /// Read a stat
    fn stat(&self, who: TargetSelector, stat: StatType) -> Option<f32>;

    /// Write a stat, returning the previous value.
    ///
    /// `None` means the host does not track this stat and nothing was written.
    fn set_stat(&self, who: TargetSelector, stat: StatType, value: f32) -> Option<f32>;

    /// Register a reentry to fire on every occurrence of `event`
    fn subscribe(&self, event: HostEvent, reentry: Reentry);
}

/// Host with no game world attached
#[derive(Debug, Default)]
pub struct NoHost;

impl EffectHost for NoHost {
    fn stat(&self, _who: TargetSelector, _stat: StatType) -> Option<f32> {
        None
    }

    fn set_stat(&self, _who: TargetSelector, _stat: StatType, _value: f32) -> Option<f32> {
        None
    }

    fn subscribe(&self, event: HostEvent, reentry: Reentry) {
        tracing::debug!(?event, node = %reentry.node_id(), "no host attached, subscription dropped");
    }
}

/// In-memory host with two stat sheets and event listener lists
#[derive(Default)]
pub struct SandboxHost {
    stats: RwLock<HashMap<(TargetSelector, StatType), f32>>,
    listeners: Mutex<HashMap<HostEvent, Vec<Reentry>>>,
}

impl SandboxHost {
    /// Create an empty sandbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stat
    pub fn with_stat(self, who: TargetSelector, stat: StatType, value: f32) -> Self {
        self.stats.write().insert((who, stat), value);
        self
    }

    /// Snapshot of one sheet
    pub fn sheet(&self, who: TargetSelector) -> Vec<(StatType, f32)> {
        let stats = self.stats.read();
        StatType::all()
            .iter()
            .filter_map(|stat| stats.get(&(who, *stat)).map(|v| (*stat, *v)))
            .collect()
    }

    /// Number of reentries registered for an event
    pub fn listener_count(&self, event: HostEvent) -> usize {
        self.listeners.lock().get(&event).map_or(0, Vec::len)
    }

    /// Fire every reentry registered for `event`.
    ///
    /// The returned future completes once every resumed run has finished.
    pub fn emit(&self, event: HostEvent) -> BoxFuture<'static, ()> {
        let reentries = self.listeners.lock().get(&event).cloned().unwrap_or_default();
        tracing::debug!(?event, listeners = reentries.len(), "emitting host event");
        join_all(reentries.into_iter().map(|r| r.fire()))
            .map(|_| ())
            .boxed()
    }
}

impl EffectHost for SandboxHost {
    fn stat(&self, who: TargetSelector, stat: StatType) -> Option<f32> {
        self.stats.read().get(&(who, stat)).copied()
    }

    fn set_stat(&self, who: TargetSelector, stat: StatType, value: f32) -> Option<f32> {
        let mut stats = self.stats.write();
        let slot = stats.get_mut(&(who, stat))?;
        Some(std::mem::replace(slot, value))
    }

    fn subscribe(&self, event: HostEvent, reentry: Reentry) {
        self.listeners.lock().entry(event).or_default().push(reentry);
    }
}

/// A node parameter named an option that does not exist
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown option: {0}")]
pub struct UnknownOption(pub String);
