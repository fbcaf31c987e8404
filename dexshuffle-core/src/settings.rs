use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::Crc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::bitfield::{BitReader, BitWriter};
use crate::crc::{check_other_crc, resource_crc32};
use crate::{RandomizerError, Result};

pub const SETTINGS_VERSION: u8 = 2;
pub const LENGTH_OF_SETTINGS_DATA: usize = 36;

const NAMES_CRC_OFFSET: usize = 28;
const NAMES_SWITCH_BYTE: usize = 32;
const NAMES_SWITCH_BIT: u8 = 0;

fn header_length(version: u8) -> Option<usize> {
    match version {
        1 => Some(24),
        2 => Some(LENGTH_OF_SETTINGS_DATA),
        _ => None,
    }
}

/// Index of the single set flag, or 0 when none is set.
pub fn exclusive_index(flags: &[bool]) -> Result<usize> {
    let mut found: Option<usize> = None;
    for (i, &set) in flags.iter().enumerate() {
        if !set {
            continue;
        }
        if let Some(first) = found {
            return Err(RandomizerError::Config(format!(
                "options {} and {} of an exclusive group are both selected",
                first, i
            )));
        }
        found = Some(i);
    }
    Ok(found.unwrap_or(0))
}

pub trait ExclusiveGroup: Sized + Copy + PartialEq + 'static {
    const VARIANTS: &'static [Self];

    fn from_flags(flags: &[bool]) -> Result<Self> {
        if flags.len() > Self::VARIANTS.len() {
            return Err(RandomizerError::Config(format!(
                "{} flags given for a group of {}",
                flags.len(),
                Self::VARIANTS.len()
            )));
        }
        Self::from_index(exclusive_index(flags)?)
    }

    fn from_index(index: usize) -> Result<Self> {
        Self::VARIANTS.get(index).copied().ok_or_else(|| {
            RandomizerError::Config(format!("option index {} out of range", index))
        })
    }

    fn index(self) -> usize {
        Self::VARIANTS
            .iter()
            .position(|v| *v == self)
            .unwrap_or(0)
    }

    fn bit_width() -> u32 {
        let n = Self::VARIANTS.len().max(2) - 1;
        usize::BITS - n.leading_zeros()
    }
}

macro_rules! exclusive_group {
    ($(#[$meta:meta])* $name:ident { $first:ident $(, $rest:ident)* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $first,
            $($rest,)*
        }

        impl ExclusiveGroup for $name {
            const VARIANTS: &'static [Self] = &[$name::$first $(, $name::$rest)*];
        }
    };
}

exclusive_group!(BaseStatsMode {
    Unchanged,
    Shuffle,
    Random,
    RandomKeepTotal,
    RandomTotalPercent,
    Equalize,
});

exclusive_group!(AbilitiesMode { Unchanged, Random });

exclusive_group!(TypesMode {
    Unchanged,
    RandomFollowEvolutions,
    CompletelyRandom,
});

exclusive_group!(EvolutionsMode { Unchanged, Random });

exclusive_group!(StartersMode { Unchanged, Custom, Random });

exclusive_group!(LegendaryPolicy { Allow, Ban, Force });

exclusive_group!(MovesetsMode {
    Unchanged,
    RandomPreferSameType,
    CompletelyRandom,
    MetronomeOnly,
});

exclusive_group!(TrainersMode {
    Unchanged,
    Random,
    TypeThemed,
    TypeMatched,
});

exclusive_group!(StaticMode {
    Unchanged,
    RandomMatching,
    CompletelyRandom,
});

exclusive_group!(
    /// Minimum catch rate floor. `Off` leaves catch rates alone.
    CatchRateTier { Off, Tier1, Tier2, Tier3, Tier4 }
);

exclusive_group!(WildMode {
    Unchanged,
    Random,
    AreaMapping,
    GlobalMapping,
});

exclusive_group!(WildRestriction {
    Unrestricted,
    SimilarStrength,
    CatchEmAll,
    TypeThemeAreas,
});

exclusive_group!(MoveListMode { Unchanged, Random });

exclusive_group!(CompatibilityMode {
    Unchanged,
    RandomPreferType,
    CompletelyRandom,
    Full,
});

exclusive_group!(TradesMode {
    Unchanged,
    RandomizeGiven,
    RandomizeGivenAndRequested,
});

exclusive_group!(FieldItemsMode { Unchanged, Shuffle, Random });

exclusive_group!(TypeChartMode {
    Unchanged,
    ShuffleRows,
    Shuffle,
    Random,
});

exclusive_group!(WarpsMode { Unchanged, Random });

impl CatchRateTier {
    /// (normal, legendary) floor for this tier.
    pub fn floors(self) -> Option<(u8, u8)> {
        match self {
            CatchRateTier::Off => None,
            CatchRateTier::Tier1 => Some((75, 37)),
            CatchRateTier::Tier2 => Some((128, 64)),
            CatchRateTier::Tier3 => Some((200, 100)),
            CatchRateTier::Tier4 => Some((255, 255)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesRestriction {
    pub enabled: bool,
    /// Bit n allows generation n + 1.
    pub generations: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveDataSettings {
    pub power: bool,
    pub accuracy: bool,
    pub pp: bool,
    pub types: bool,
    pub category: bool,
}

impl MoveDataSettings {
    pub fn any(&self) -> bool {
        self.power || self.accuracy || self.pp || self.types || self.category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStatsSettings {
    pub mode: BaseStatsMode,
    pub follow_evolutions: bool,
    pub min_percent: u8,
    pub max_percent: u8,
}

impl Default for BaseStatsSettings {
    fn default() -> Self {
        BaseStatsSettings {
            mode: BaseStatsMode::Unchanged,
            follow_evolutions: false,
            min_percent: 100,
            max_percent: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilitySettings {
    pub mode: AbilitiesMode,
    pub allow_wonder_guard: bool,
    pub follow_evolutions: bool,
    pub ban_trapping: bool,
    pub ban_negative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WildHeldItemSettings {
    pub randomize: bool,
    pub ban_bad_items: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSettings {
    pub mode: EvolutionsMode,
    pub similar_strength: bool,
    pub same_typing: bool,
    pub limit_to_three_stages: bool,
    pub force_change: bool,
    pub remove_trade_evolutions: bool,
    pub condense_levels: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterSettings {
    pub mode: StartersMode,
    pub custom: [u16; 3],
    pub required_evolutions: u8,
    pub legendaries: LegendaryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovesetSettings {
    pub mode: MovesetsMode,
    pub start_with_four_moves: bool,
    pub reorder_damaging: bool,
    pub force_good_damaging: bool,
    pub good_damaging_percent: u8,
    pub no_game_breaking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerSettings {
    pub mode: TrainersMode,
    pub similar_strength: bool,
    pub no_legendaries: bool,
    pub no_early_wonder_guard: bool,
    /// Percentage added to every trainer level, -50..=50.
    pub level_modifier: i8,
    pub fill_boss_teams: bool,
    pub randomize_names: bool,
    pub randomize_class_names: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WildSettings {
    pub mode: WildMode,
    pub restriction: WildRestriction,
    pub time_based: bool,
    pub condense_slots: bool,
    pub no_legendaries: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveListSettings {
    pub mode: MoveListMode,
    pub no_game_breaking: bool,
    pub keep_field_moves: bool,
    pub compatibility: CompatibilityMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSettings {
    pub mode: TradesMode,
    pub nicknames: bool,
    pub trainer_names: bool,
    pub ivs: bool,
    pub items: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldItemSettings {
    pub mode: FieldItemsMode,
    pub given_items: bool,
    pub berry_trees: bool,
    pub pickup: bool,
    pub shops: bool,
    pub ban_bad_items: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpSettings {
    pub mode: WarpsMode,
    /// Number of progression gates honoured, 0..=7.
    pub depth: u8,
    pub remove_dead_ends: bool,
    pub relax_gym_order: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub species_pool: SpeciesRestriction,
    pub move_data: MoveDataSettings,
    pub tweaks: u32,
    pub base_stats: BaseStatsSettings,
    pub abilities: AbilitySettings,
    pub types: TypesMode,
    pub wild_held_items: WildHeldItemSettings,
    pub evolutions: EvolutionSettings,
    pub starters: StarterSettings,
    pub movesets: MovesetSettings,
    pub trainers: TrainerSettings,
    pub statics: StaticMode,
    pub minimum_catch_rate: CatchRateTier,
    pub wild: WildSettings,
    pub battle_facility: bool,
    pub tms: MoveListSettings,
    pub tutors: MoveListSettings,
    pub trades: TradeSettings,
    pub field_items: FieldItemSettings,
    pub type_chart: TypeChartMode,
    pub warps: WarpSettings,
    pub custom_names_crc: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub upgraded_from_old_version: bool,
}

fn put_group<G: ExclusiveGroup>(w: &mut BitWriter<'_>, value: G) {
    w.put(G::bit_width(), value.index() as u64);
}

fn take_group<G: ExclusiveGroup>(r: &mut BitReader<'_>) -> Result<G> {
    G::from_index(r.take(G::bit_width()) as usize)
}

fn settings_crc(bytes: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(bytes);
    crc.sum()
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| -> Result<()> { Err(RandomizerError::Config(msg)) };

        if self.species_pool.enabled && self.species_pool.generations == 0 {
            return bad("species restriction enabled with no generation selected".to_string());
        }
        let stats = &self.base_stats;
        if stats.min_percent > stats.max_percent {
            return bad(format!(
                "base stat percent range {}..{} is inverted",
                stats.min_percent, stats.max_percent
            ));
        }
        if stats.mode == BaseStatsMode::RandomTotalPercent && stats.min_percent == 0 {
            return bad("base stat percent range must start above zero".to_string());
        }
        if self.starters.mode == StartersMode::Custom && self.starters.custom.contains(&0) {
            return bad("custom starters must name three species".to_string());
        }
        if self.starters.custom.iter().any(|&id| id >= 1 << 11) {
            return bad("custom starter id out of range".to_string());
        }
        if self.starters.required_evolutions > 2 {
            return bad(format!(
                "starters cannot require {} evolutions",
                self.starters.required_evolutions
            ));
        }
        if self.movesets.good_damaging_percent > 100 {
            return bad(format!(
                "good damaging move percentage {} exceeds 100",
                self.movesets.good_damaging_percent
            ));
        }
        if !(-50..=50).contains(&self.trainers.level_modifier) {
            return bad(format!(
                "trainer level modifier {} outside -50..=50",
                self.trainers.level_modifier
            ));
        }
        if self.warps.depth > 7 {
            return bad(format!("warp progression depth {} exceeds 7", self.warps.depth));
        }
        Ok(())
    }

    pub fn to_header(&self) -> Vec<u8> {
        let mut buf = vec![0u8; LENGTH_OF_SETTINGS_DATA];
        {
            let mut w = BitWriter::new(&mut buf);

            w.put_bool(self.species_pool.enabled);
            w.put(8, self.species_pool.generations as u64);

            let md = &self.move_data;
            for flag in [md.power, md.accuracy, md.pp, md.types, md.category] {
                w.put_bool(flag);
            }

            w.put(32, self.tweaks as u64);

            put_group(&mut w, self.base_stats.mode);
            w.put_bool(self.base_stats.follow_evolutions);
            w.put(8, self.base_stats.min_percent as u64);
            w.put(8, self.base_stats.max_percent as u64);

            let ab = &self.abilities;
            put_group(&mut w, ab.mode);
            for flag in [ab.allow_wonder_guard, ab.follow_evolutions, ab.ban_trapping, ab.ban_negative] {
                w.put_bool(flag);
            }

            put_group(&mut w, self.types);
            w.put_bool(self.wild_held_items.randomize);
            w.put_bool(self.wild_held_items.ban_bad_items);

            let ev = &self.evolutions;
            put_group(&mut w, ev.mode);
            for flag in [
                ev.similar_strength,
                ev.same_typing,
                ev.limit_to_three_stages,
                ev.force_change,
                ev.remove_trade_evolutions,
                ev.condense_levels,
            ] {
                w.put_bool(flag);
            }

            let st = &self.starters;
            put_group(&mut w, st.mode);
            for id in st.custom {
                w.put(11, id as u64);
            }
            w.put(2, st.required_evolutions as u64);
            put_group(&mut w, st.legendaries);

            let mv = &self.movesets;
            put_group(&mut w, mv.mode);
            w.put_bool(mv.start_with_four_moves);
            w.put_bool(mv.reorder_damaging);
            w.put_bool(mv.force_good_damaging);
            w.put(7, mv.good_damaging_percent as u64);
            w.put_bool(mv.no_game_breaking);

            let tr = &self.trainers;
            put_group(&mut w, tr.mode);
            w.put_bool(tr.similar_strength);
            w.put_bool(tr.no_legendaries);
            w.put_bool(tr.no_early_wonder_guard);
            w.put(8, tr.level_modifier as u8 as u64);
            w.put_bool(tr.fill_boss_teams);
            w.put_bool(tr.randomize_names);
            w.put_bool(tr.randomize_class_names);

            put_group(&mut w, self.statics);
            put_group(&mut w, self.minimum_catch_rate);

            let wi = &self.wild;
            put_group(&mut w, wi.mode);
            put_group(&mut w, wi.restriction);
            w.put_bool(wi.time_based);
            w.put_bool(wi.condense_slots);
            w.put_bool(wi.no_legendaries);

            w.put_bool(self.battle_facility);

            for list in [&self.tms, &self.tutors] {
                put_group(&mut w, list.mode);
                w.put_bool(list.no_game_breaking);
                w.put_bool(list.keep_field_moves);
                put_group(&mut w, list.compatibility);
            }

            let td = &self.trades;
            put_group(&mut w, td.mode);
            for flag in [td.nicknames, td.trainer_names, td.ivs, td.items] {
                w.put_bool(flag);
            }

            let fi = &self.field_items;
            put_group(&mut w, fi.mode);
            for flag in [fi.given_items, fi.berry_trees, fi.pickup, fi.shops, fi.ban_bad_items] {
                w.put_bool(flag);
            }

            // Added in version 2.
            put_group(&mut w, self.type_chart);
            let wp = &self.warps;
            put_group(&mut w, wp.mode);
            w.put(3, wp.depth as u64);
            w.put_bool(wp.remove_dead_ends);
            w.put_bool(wp.relax_gym_order);

            debug_assert!(w.position() <= NAMES_CRC_OFFSET * 8);
        }

        if let Some(crc) = self.custom_names_crc {
            buf[NAMES_CRC_OFFSET..NAMES_CRC_OFFSET + 4].copy_from_slice(&crc.to_be_bytes());
            buf[NAMES_SWITCH_BYTE] |= 1 << NAMES_SWITCH_BIT;
        }

        buf
    }

    /// Decode a header written by `version`. Fields the version predates
    /// keep their defaults.
    pub fn from_header(buf: &[u8], version: u8) -> Result<Settings> {
        let expected = header_length(version).ok_or_else(|| {
            RandomizerError::Config(format!("unsupported settings version {}", version))
        })?;
        if buf.len() != expected {
            return Err(RandomizerError::Config(format!(
                "settings header is {} bytes, expected {} for version {}",
                buf.len(),
                expected,
                version
            )));
        }

        let mut s = Settings::default();
        let mut r = BitReader::new(buf);

        s.species_pool.enabled = r.take_bool();
        s.species_pool.generations = r.take(8) as u8;

        s.move_data = MoveDataSettings {
            power: r.take_bool(),
            accuracy: r.take_bool(),
            pp: r.take_bool(),
            types: r.take_bool(),
            category: r.take_bool(),
        };

        s.tweaks = r.take(32) as u32;

        s.base_stats = BaseStatsSettings {
            mode: take_group(&mut r)?,
            follow_evolutions: r.take_bool(),
            min_percent: r.take(8) as u8,
            max_percent: r.take(8) as u8,
        };

        s.abilities = AbilitySettings {
            mode: take_group(&mut r)?,
            allow_wonder_guard: r.take_bool(),
            follow_evolutions: r.take_bool(),
            ban_trapping: r.take_bool(),
            ban_negative: r.take_bool(),
        };

        s.types = take_group(&mut r)?;
        s.wild_held_items = WildHeldItemSettings {
            randomize: r.take_bool(),
            ban_bad_items: r.take_bool(),
        };

        s.evolutions = EvolutionSettings {
            mode: take_group(&mut r)?,
            similar_strength: r.take_bool(),
            same_typing: r.take_bool(),
            limit_to_three_stages: r.take_bool(),
            force_change: r.take_bool(),
            remove_trade_evolutions: r.take_bool(),
            condense_levels: r.take_bool(),
        };

        s.starters.mode = take_group(&mut r)?;
        for slot in s.starters.custom.iter_mut() {
            *slot = r.take(11) as u16;
        }
        s.starters.required_evolutions = r.take(2) as u8;
        s.starters.legendaries = take_group(&mut r)?;

        s.movesets = MovesetSettings {
            mode: take_group(&mut r)?,
            start_with_four_moves: r.take_bool(),
            reorder_damaging: r.take_bool(),
            force_good_damaging: r.take_bool(),
            good_damaging_percent: r.take(7) as u8,
            no_game_breaking: r.take_bool(),
        };

        s.trainers = TrainerSettings {
            mode: take_group(&mut r)?,
            similar_strength: r.take_bool(),
            no_legendaries: r.take_bool(),
            no_early_wonder_guard: r.take_bool(),
            level_modifier: r.take(8) as u8 as i8,
            fill_boss_teams: r.take_bool(),
            randomize_names: r.take_bool(),
            randomize_class_names: r.take_bool(),
        };

        s.statics = take_group(&mut r)?;
        s.minimum_catch_rate = take_group(&mut r)?;

        s.wild = WildSettings {
            mode: take_group(&mut r)?,
            restriction: take_group(&mut r)?,
            time_based: r.take_bool(),
            condense_slots: r.take_bool(),
            no_legendaries: r.take_bool(),
        };

        s.battle_facility = r.take_bool();

        for list in [&mut s.tms, &mut s.tutors] {
            *list = MoveListSettings {
                mode: take_group(&mut r)?,
                no_game_breaking: r.take_bool(),
                keep_field_moves: r.take_bool(),
                compatibility: take_group(&mut r)?,
            };
        }

        s.trades = TradeSettings {
            mode: take_group(&mut r)?,
            nicknames: r.take_bool(),
            trainer_names: r.take_bool(),
            ivs: r.take_bool(),
            items: r.take_bool(),
        };

        s.field_items = FieldItemSettings {
            mode: take_group(&mut r)?,
            given_items: r.take_bool(),
            berry_trees: r.take_bool(),
            pickup: r.take_bool(),
            shops: r.take_bool(),
            ban_bad_items: r.take_bool(),
        };

        if version >= 2 {
            s.type_chart = take_group(&mut r)?;
            s.warps = WarpSettings {
                mode: take_group(&mut r)?,
                depth: r.take(3) as u8,
                remove_dead_ends: r.take_bool(),
                relax_gym_order: r.take_bool(),
            };

            if (buf[NAMES_SWITCH_BYTE] >> NAMES_SWITCH_BIT) & 1 == 1 {
                let mut crc = [0u8; 4];
                crc.copy_from_slice(&buf[NAMES_CRC_OFFSET..NAMES_CRC_OFFSET + 4]);
                s.custom_names_crc = Some(u32::from_be_bytes(crc));
            }
        }

        s.validate()?;
        Ok(s)
    }

    pub fn to_settings_string(&self) -> String {
        let mut bytes = Vec::with_capacity(LENGTH_OF_SETTINGS_DATA + 5);
        bytes.push(SETTINGS_VERSION);
        bytes.extend_from_slice(&self.to_header());
        let crc = settings_crc(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        STANDARD.encode(bytes)
    }

    pub fn from_settings_string(text: &str) -> Result<LoadedSettings> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| RandomizerError::Config(format!("settings string is not base64: {}", e)))?;
        if bytes.len() < 5 {
            return Err(RandomizerError::Config("settings string is too short".to_string()));
        }

        let version = bytes[0];
        if version > SETTINGS_VERSION {
            return Err(RandomizerError::Config(format!(
                "settings version {} is newer than supported version {}",
                version, SETTINGS_VERSION
            )));
        }

        let (body, crc_bytes) = bytes.split_at(bytes.len() - 4);
        let stored = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        if settings_crc(body) != stored {
            return Err(RandomizerError::Config(
                "settings string checksum mismatch".to_string(),
            ));
        }

        let settings = Settings::from_header(&body[1..], version)?;
        if version < SETTINGS_VERSION {
            log::info!("settings upgraded from version {}", version);
        }
        Ok(LoadedSettings {
            settings,
            upgraded_from_old_version: version < SETTINGS_VERSION,
        })
    }

    pub fn write_stream<W: Write>(&self, out: &mut W) -> Result<()> {
        let text = self.to_settings_string();
        let len = u8::try_from(text.len()).map_err(|_| {
            RandomizerError::Config(format!(
                "settings string of {} bytes does not fit the stream format",
                text.len()
            ))
        })?;
        out.write_all(&[SETTINGS_VERSION, len])?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn read_stream<R: Read>(input: &mut R) -> Result<LoadedSettings> {
        let mut head = [0u8; 2];
        input.read_exact(&mut head)?;
        let [version, len] = head;
        if version > SETTINGS_VERSION {
            return Err(RandomizerError::Config(format!(
                "settings file version {} is newer than supported version {}",
                version, SETTINGS_VERSION
            )));
        }

        let mut text = vec![0u8; len as usize];
        input.read_exact(&mut text)?;
        let text = String::from_utf8(text)
            .map_err(|_| RandomizerError::Config("settings file is not UTF-8".to_string()))?;

        let mut loaded = Settings::from_settings_string(&text)?;
        loaded.upgraded_from_old_version |= version < SETTINGS_VERSION;
        Ok(loaded)
    }

    pub fn load(path: &Path) -> Result<LoadedSettings> {
        let data = fs::read(path)?;
        Settings::read_stream(&mut data.as_slice())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = Vec::new();
        self.write_stream(&mut out)?;
        fs::write(path, out)?;
        Ok(())
    }

    pub fn to_preset(&self, rom_name: &str) -> Result<Vec<u8>> {
        let name = rom_name.as_bytes();
        let len = u8::try_from(name.len()).map_err(|_| {
            RandomizerError::Config(format!("ROM name '{}' is too long for a preset", rom_name))
        })?;
        let mut out = self.to_header();
        out.push(len);
        out.extend_from_slice(name);
        Ok(out)
    }

    pub fn from_preset(data: &[u8]) -> Result<(Settings, String)> {
        if data.len() < LENGTH_OF_SETTINGS_DATA + 1 {
            return Err(RandomizerError::Config("preset is truncated".to_string()));
        }
        let name_len = data[LENGTH_OF_SETTINGS_DATA] as usize;
        if data.len() != LENGTH_OF_SETTINGS_DATA + 1 + name_len {
            return Err(RandomizerError::Config(format!(
                "preset is {} bytes, expected {}",
                data.len(),
                LENGTH_OF_SETTINGS_DATA + 1 + name_len
            )));
        }

        let settings = Settings::from_header(&data[..LENGTH_OF_SETTINGS_DATA], SETTINGS_VERSION)?;
        let name = String::from_utf8(data[LENGTH_OF_SETTINGS_DATA + 1..].to_vec())
            .map_err(|_| RandomizerError::Config("preset ROM name is not UTF-8".to_string()))?;
        Ok((settings, name))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RandomizerError::Config(format!("cannot serialise settings: {}", e)))
    }

    pub fn from_json(text: &str) -> Result<Settings> {
        let settings: Settings = serde_json::from_str(text)
            .map_err(|e| RandomizerError::Config(format!("invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn record_names_resource(&mut self, path: &Path) -> Result<()> {
        self.custom_names_crc = Some(resource_crc32(path)?);
        Ok(())
    }

    /// Whether the custom names resource still matches the recorded CRC.
    /// Always true when nothing was recorded.
    pub fn names_resource_current(&self, path: &Path) -> Result<bool> {
        let header = self.to_header();
        check_other_crc(
            &header,
            NAMES_SWITCH_BYTE,
            NAMES_SWITCH_BIT,
            path,
            NAMES_CRC_OFFSET,
        )
    }
}
