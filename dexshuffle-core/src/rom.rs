use std::path::Path;

use crate::bans::{BanLists, ItemList};
use crate::rng::RandomSource;
use crate::settings::{
    AbilitySettings, CompatibilityMode, EvolutionSettings, FieldItemSettings, LegendaryPolicy,
    MoveListSettings, MovesetSettings, SpeciesRestriction, StaticMode, TradeSettings,
    TrainerSettings, TypeChartMode, WarpSettings, WildSettings,
};
use crate::tweaks::Tweak;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesStats {
    pub id: u16,
    pub name: String,
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_atk: u8,
    pub sp_def: u8,
    pub speed: u8,
    pub primary_type: String,
    pub secondary_type: Option<String>,
}

impl SpeciesStats {
    pub fn stat_tuple(&self) -> [u32; 6] {
        [
            self.hp as u32,
            self.attack as u32,
            self.defense as u32,
            self.sp_atk as u32,
            self.sp_def as u32,
            self.speed as u32,
        ]
    }

    pub fn total(&self) -> u32 {
        self.stat_tuple().iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveData {
    pub id: u16,
    pub name: String,
    pub move_type: String,
    pub power: u8,
    pub accuracy: u8,
    pub pp: u8,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearntMove {
    pub level: u8,
    pub move_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moveset {
    pub species: u16,
    pub moves: Vec<LearntMove>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evolution {
    pub from: u16,
    pub to: u16,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartyMember {
    pub species: u16,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trainer {
    pub name: String,
    pub party: Vec<PartyMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterArea {
    pub name: String,
    pub rate: u8,
    pub encounters: Vec<PartyMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InGameTrade {
    pub nickname: String,
    pub given: u16,
    pub requested: u16,
}

/// Per-game data model the pipeline drives.
pub trait RomHandler {
    fn rom_name(&self) -> String;

    // Capabilities.

    fn has_physical_special_split(&self) -> bool;
    fn abilities_per_species(&self) -> usize;
    fn has_move_tutors(&self) -> bool;
    fn has_time_based_encounters(&self) -> bool;
    fn can_change_trainer_text(&self) -> bool;
    fn can_change_starters(&self) -> bool;
    fn has_wild_held_items(&self) -> bool;
    fn has_battle_facility(&self) -> bool;
    fn supports_four_starting_moves(&self) -> bool;
    fn can_condense_encounter_slots(&self) -> bool;
    fn has_type_chart(&self) -> bool;
    fn supports_warp_randomization(&self) -> bool;
    fn misc_tweaks_available(&self) -> u32;

    // Views used for the change log and the check value.

    fn species_stats(&self) -> Vec<SpeciesStats>;
    fn species_name(&self, id: u16) -> Option<String>;
    fn moves(&self) -> Vec<MoveData>;
    fn move_name(&self, id: u16) -> Option<String>;
    fn movesets(&self) -> Vec<Moveset>;
    fn evolutions(&self) -> Vec<Evolution>;
    fn starters(&self) -> Vec<u16>;
    fn trainers(&self) -> Vec<Trainer>;
    fn static_pokemon(&self) -> Vec<u16>;
    fn encounters(&self, use_time_based: bool) -> Vec<EncounterArea>;
    fn tm_moves(&self) -> Vec<u16>;
    fn tutor_moves(&self) -> Vec<u16>;
    fn in_game_trades(&self) -> Vec<InGameTrade>;

    // Stage operations.

    fn restrict_species_pool(&mut self, restriction: &SpeciesRestriction, bans: &BanLists) -> Result<()>;

    fn randomize_move_powers(&mut self, rng: &mut RandomSource) -> Result<()>;
    fn randomize_move_accuracies(&mut self, rng: &mut RandomSource) -> Result<()>;
    fn randomize_move_pps(&mut self, rng: &mut RandomSource) -> Result<()>;
    fn randomize_move_types(&mut self, rng: &mut RandomSource) -> Result<()>;
    fn randomize_move_categories(&mut self, rng: &mut RandomSource) -> Result<()>;

    fn apply_misc_tweak(&mut self, tweak: &Tweak, rng: &mut RandomSource) -> Result<()>;

    fn shuffle_base_stats(&mut self, follow_evolutions: bool, rng: &mut RandomSource) -> Result<()>;
    fn randomize_base_stats(&mut self, follow_evolutions: bool, rng: &mut RandomSource) -> Result<()>;
    fn randomize_base_stats_keep_total(&mut self, follow_evolutions: bool, rng: &mut RandomSource) -> Result<()>;
    fn randomize_base_stat_totals(
        &mut self,
        follow_evolutions: bool,
        min_percent: u8,
        max_percent: u8,
        rng: &mut RandomSource,
    ) -> Result<()>;
    fn equalize_base_stats(&mut self, follow_evolutions: bool) -> Result<()>;

    fn randomize_abilities(&mut self, opts: &AbilitySettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn randomize_types(&mut self, follow_evolutions: bool, rng: &mut RandomSource) -> Result<()>;
    fn randomize_wild_held_items(&mut self, items: &ItemList, rng: &mut RandomSource) -> Result<()>;

    fn randomize_evolutions(&mut self, opts: &EvolutionSettings, rng: &mut RandomSource) -> Result<()>;
    fn remove_trade_evolutions(&mut self) -> Result<()>;
    fn condense_evolution_levels(&mut self) -> Result<()>;

    fn set_starters(&mut self, starters: [u16; 3]) -> Result<()>;
    fn randomize_starters(
        &mut self,
        required_evolutions: u8,
        legendaries: LegendaryPolicy,
        bans: &BanLists,
        rng: &mut RandomSource,
    ) -> Result<()>;

    fn randomize_movesets(&mut self, opts: &MovesetSettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn ensure_four_starting_moves(&mut self) -> Result<()>;
    fn reorder_damaging_moves(&mut self) -> Result<()>;
    fn force_good_damaging_moves(&mut self, percent: u8, rng: &mut RandomSource) -> Result<()>;

    fn randomize_trainer_parties(&mut self, opts: &TrainerSettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn apply_trainer_level_modifier(&mut self, percent: i8) -> Result<()>;
    fn randomize_trainer_names(&mut self, custom_names: bool, rng: &mut RandomSource) -> Result<()>;
    fn randomize_trainer_class_names(&mut self, custom_names: bool, rng: &mut RandomSource) -> Result<()>;

    fn metronome_only_mode(&mut self) -> Result<()>;

    fn randomize_static_pokemon(&mut self, mode: StaticMode, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn set_minimum_catch_rate(&mut self, normal: u8, legendary: u8) -> Result<()>;

    fn randomize_encounters(&mut self, opts: &WildSettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn condense_encounter_slots(&mut self) -> Result<()>;

    fn randomize_battle_facility_teams(&mut self, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;

    fn randomize_tm_moves(&mut self, opts: &MoveListSettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn randomize_tm_compatibility(&mut self, mode: CompatibilityMode, rng: &mut RandomSource) -> Result<()>;
    fn randomize_tutor_moves(&mut self, opts: &MoveListSettings, bans: &BanLists, rng: &mut RandomSource) -> Result<()>;
    fn randomize_tutor_compatibility(&mut self, mode: CompatibilityMode, rng: &mut RandomSource) -> Result<()>;

    fn randomize_in_game_trades(&mut self, opts: &TradeSettings, rng: &mut RandomSource) -> Result<()>;

    fn shuffle_field_items(&mut self, rng: &mut RandomSource) -> Result<()>;
    fn randomize_field_items(
        &mut self,
        opts: &FieldItemSettings,
        items: &ItemList,
        rng: &mut RandomSource,
    ) -> Result<()>;

    fn randomize_type_chart(&mut self, mode: TypeChartMode, rng: &mut RandomSource) -> Result<()>;
    fn randomize_warps(&mut self, opts: &WarpSettings, rng: &mut RandomSource) -> Result<()>;

    // Output.

    fn apply_signature(&mut self) -> Result<()>;
    fn write_check_value(&mut self, check_value: u32) -> Result<()>;
    fn save(&mut self, path: &Path) -> Result<()>;
}
