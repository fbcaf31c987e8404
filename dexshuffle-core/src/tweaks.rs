use serde::Serialize;

use crate::{RandomizerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tweak {
    pub value: u32,
    pub priority: i32,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct TweakRegistry {
    tweaks: Vec<Tweak>,
}

pub const EXP_PATCH: u32 = 1 << 0;
pub const NERF_X_ACCURACY: u32 = 1 << 1;
pub const FIX_CRIT_RATE: u32 = 1 << 2;
pub const FASTEST_TEXT: u32 = 1 << 3;
pub const RUNNING_SHOES_INDOORS: u32 = 1 << 4;
pub const RANDOMIZE_PC_POTION: u32 = 1 << 5;
pub const ALLOW_PIKACHU_EVOLUTION: u32 = 1 << 6;
pub const NATIONAL_DEX_AT_START: u32 = 1 << 7;
pub const UPDATE_TYPE_EFFECTIVENESS: u32 = 1 << 8;
pub const FORCE_CHALLENGE_MODE: u32 = 1 << 9;
pub const LOWER_CASE_NAMES: u32 = 1 << 10;
pub const RANDOMIZE_CATCHING_TUTORIAL: u32 = 1 << 11;
pub const BAN_LUCKY_EGG: u32 = 1 << 12;
pub const NO_FREE_LUCKY_EGG: u32 = 1 << 13;
pub const BAN_BIG_MANIAC_ITEMS: u32 = 1 << 14;
pub const SOS_BATTLES_FOR_ALL: u32 = 1 << 15;
pub const BALANCE_STATIC_LEVELS: u32 = 1 << 16;
pub const RETAIN_ALT_FORMES: u32 = 1 << 17;
pub const RUN_WITHOUT_RUNNING_SHOES: u32 = 1 << 18;

impl TweakRegistry {
    pub fn new() -> Self {
        TweakRegistry { tweaks: Vec::new() }
    }

    /// Add a tweak. Its value must be a power of two not already used.
    pub fn register(
        &mut self,
        value: u32,
        priority: i32,
        name: &'static str,
        description: &'static str,
    ) -> Result<()> {
        if !value.is_power_of_two() {
            return Err(RandomizerError::Config(format!(
                "tweak '{}' has value {:#X}, which is not a single bit",
                name, value
            )));
        }
        if let Some(existing) = self.tweaks.iter().find(|t| t.value == value) {
            return Err(RandomizerError::Config(format!(
                "tweak '{}' reuses bit {:#X} already taken by '{}'",
                name, value, existing.name
            )));
        }

        self.tweaks.push(Tweak {
            value,
            priority,
            name,
            description,
        });
        Ok(())
    }

    pub fn standard() -> Result<Self> {
        let mut r = TweakRegistry::new();
        r.register(EXP_PATCH, 0, "Modern EXP Curve", "Experience gain scales with level difference.")?;
        r.register(NERF_X_ACCURACY, 0, "Nerf X Accuracy", "X Accuracy no longer guarantees one-hit KO moves.")?;
        r.register(FIX_CRIT_RATE, 0, "Fix Crit Rate", "Critical hit rate no longer depends on base speed.")?;
        r.register(FASTEST_TEXT, 0, "Fastest Text", "Text boxes print instantly.")?;
        r.register(RUNNING_SHOES_INDOORS, 0, "Running Shoes Indoors", "Running shoes work inside buildings.")?;
        r.register(RANDOMIZE_PC_POTION, 0, "Randomize PC Potion", "The item in the starting PC is random.")?;
        r.register(ALLOW_PIKACHU_EVOLUTION, 0, "Allow Pikachu Evolution", "The starter Pikachu may evolve.")?;
        r.register(NATIONAL_DEX_AT_START, 0, "National Dex at Start", "The national dex is available from the beginning.")?;
        r.register(UPDATE_TYPE_EFFECTIVENESS, 1, "Update Type Effectiveness", "Type matchups follow the modern chart.")?;
        r.register(FORCE_CHALLENGE_MODE, 0, "Force Challenge Mode", "Challenge mode is always enabled.")?;
        r.register(LOWER_CASE_NAMES, 0, "Lower Case Names", "Species names use mixed case.")?;
        r.register(RANDOMIZE_CATCHING_TUTORIAL, 0, "Randomize Catching Tutorial", "The tutorial catch shows a random species.")?;
        r.register(BAN_LUCKY_EGG, 1, "Ban Lucky Egg", "Lucky Egg is removed from random item pools.")?;
        r.register(NO_FREE_LUCKY_EGG, 0, "No Free Lucky Egg", "The gift Lucky Egg is replaced.")?;
        r.register(BAN_BIG_MANIAC_ITEMS, 1, "Ban Big Maniac Items", "Items that only sell for money are banned.")?;
        r.register(SOS_BATTLES_FOR_ALL, 0, "SOS Battles for All", "Every wild species can call for help.")?;
        r.register(BALANCE_STATIC_LEVELS, 2, "Balance Static Levels", "Static encounter levels are evened out.")?;
        r.register(RETAIN_ALT_FORMES, 0, "Retain Alternate Formes", "Alternate formes keep their look in battle.")?;
        r.register(RUN_WITHOUT_RUNNING_SHOES, 0, "Run Without Running Shoes", "Running is available from the start.")?;
        Ok(r)
    }

    pub fn all(&self) -> &[Tweak] {
        &self.tweaks
    }

    pub fn find(&self, value: u32) -> Option<&Tweak> {
        self.tweaks.iter().find(|t| t.value == value)
    }

    /// Tweaks in application order: higher priority first, registration order
    /// within a priority.
    pub fn ordered(&self) -> Vec<&Tweak> {
        let mut out: Vec<&Tweak> = self.tweaks.iter().collect();
        out.sort_by(|a, b| b.priority.cmp(&a.priority));
        out
    }
}
