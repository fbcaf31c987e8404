use std::fs;
use std::io::Write;
use std::path::Path;

use dexshuffle_core::bans::{BanLists, ItemList};
use dexshuffle_core::rom::{
    EncounterArea, Evolution, InGameTrade, LearntMove, MoveData, Moveset, PartyMember,
    SpeciesStats, Trainer,
};
use dexshuffle_core::settings::{
    AbilitiesMode, AbilitySettings, BaseStatsMode, CatchRateTier, CompatibilityMode,
    EvolutionSettings, EvolutionsMode, FieldItemSettings, FieldItemsMode, LegendaryPolicy,
    MoveListMode, MoveListSettings, MovesetSettings, MovesetsMode, SpeciesRestriction,
    StartersMode, StaticMode, TradeSettings, TradesMode, TrainerSettings, TrainersMode,
    TypeChartMode, TypesMode, WarpSettings, WarpsMode, WildMode, WildSettings,
};
use dexshuffle_core::tweaks::{self, Tweak};
use dexshuffle_core::{
    Progress, RandomSource, Randomizer, RandomizerError, Result, RomHandler, Settings,
    TweakRegistry,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// In-memory game that records every stage operation it is asked to run.
struct MockRom {
    calls: Vec<String>,
    species: Vec<SpeciesStats>,
    movesets: Vec<Moveset>,
    trainers: Vec<Trainer>,
    areas: Vec<EncounterArea>,
    statics: Vec<u16>,
    tms: Vec<u16>,
    check_value: Option<u32>,
    tutors: bool,
    type_chart: bool,
    tweaks_available: u32,
    every_capability: bool,
    fail_on: Option<&'static str>,
}

fn species(id: u16, name: &str, stats: [u8; 6]) -> SpeciesStats {
    SpeciesStats {
        id,
        name: name.to_string(),
        hp: stats[0],
        attack: stats[1],
        defense: stats[2],
        sp_atk: stats[3],
        sp_def: stats[4],
        speed: stats[5],
        primary_type: "NORMAL".to_string(),
        secondary_type: None,
    }
}

fn member(species: u16, level: u8) -> PartyMember {
    PartyMember { species, level }
}

impl MockRom {
    fn new() -> Self {
        MockRom {
            calls: Vec::new(),
            species: vec![
                species(1, "Sproutle", [45, 49, 49, 65, 65, 45]),
                species(2, "Embercub", [39, 52, 43, 60, 50, 65]),
                species(3, "Shellpup", [44, 48, 65, 50, 64, 43]),
                species(4, "Voltmouse", [35, 55, 40, 50, 50, 90]),
            ],
            movesets: vec![Moveset {
                species: 1,
                moves: vec![
                    LearntMove { level: 1, move_id: 1 },
                    LearntMove { level: 7, move_id: 99 },
                ],
            }],
            trainers: vec![
                Trainer {
                    name: "Youngster".to_string(),
                    party: vec![member(2, 5), member(4, 7)],
                },
                Trainer {
                    name: "Leader".to_string(),
                    party: vec![member(3, 14)],
                },
            ],
            areas: vec![EncounterArea {
                name: "Route 1".to_string(),
                rate: 25,
                encounters: vec![member(1, 3), member(4, 4)],
            }],
            statics: vec![3],
            tms: vec![1, 2, 3],
            check_value: None,
            tutors: true,
            type_chart: true,
            tweaks_available: 0,
            every_capability: false,
            fail_on: None,
        }
    }

    fn record(&mut self, op: &str) -> Result<()> {
        self.calls.push(op.to_string());
        if self.fail_on == Some(op) {
            return Err(RandomizerError::Rom(format!("{} blew up", op)));
        }
        Ok(())
    }

    fn called(&self, op: &str) -> bool {
        self.calls.iter().any(|c| c == op)
    }

    fn position(&self, op: &str) -> usize {
        self.calls
            .iter()
            .position(|c| c == op)
            .unwrap_or_else(|| panic!("{} was never called", op))
    }

    fn image(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for sp in &self.species {
            out.extend(sp.stat_tuple().iter().map(|&v| v as u8));
        }
        for t in &self.trainers {
            for m in &t.party {
                out.push(m.level);
                out.extend(m.species.to_be_bytes());
            }
        }
        for a in &self.areas {
            for m in &a.encounters {
                out.push(m.level);
                out.extend(m.species.to_be_bytes());
            }
        }
        for &tm in &self.tms {
            out.extend(tm.to_be_bytes());
        }
        out.extend(self.check_value.unwrap_or(0).to_be_bytes());
        out
    }
}

impl RomHandler for MockRom {
    fn rom_name(&self) -> String {
        "Mock Version".to_string()
    }

    fn has_physical_special_split(&self) -> bool {
        self.every_capability
    }
    fn abilities_per_species(&self) -> usize {
        2
    }
    fn has_move_tutors(&self) -> bool {
        self.tutors
    }
    fn has_time_based_encounters(&self) -> bool {
        self.every_capability
    }
    fn can_change_trainer_text(&self) -> bool {
        true
    }
    fn can_change_starters(&self) -> bool {
        true
    }
    fn has_wild_held_items(&self) -> bool {
        true
    }
    fn has_battle_facility(&self) -> bool {
        self.every_capability
    }
    fn supports_four_starting_moves(&self) -> bool {
        true
    }
    fn can_condense_encounter_slots(&self) -> bool {
        self.every_capability
    }
    fn has_type_chart(&self) -> bool {
        self.type_chart
    }
    fn supports_warp_randomization(&self) -> bool {
        self.every_capability
    }
    fn misc_tweaks_available(&self) -> u32 {
        self.tweaks_available
    }

    fn species_stats(&self) -> Vec<SpeciesStats> {
        self.species.clone()
    }
    fn species_name(&self, id: u16) -> Option<String> {
        self.species.iter().find(|s| s.id == id).map(|s| s.name.clone())
    }
    fn moves(&self) -> Vec<MoveData> {
        Vec::new()
    }
    fn move_name(&self, id: u16) -> Option<String> {
        match id {
            1 => Some("Tackle".to_string()),
            2 => Some("Ember".to_string()),
            3 => Some("Bubble".to_string()),
            _ => None,
        }
    }
    fn movesets(&self) -> Vec<Moveset> {
        self.movesets.clone()
    }
    fn evolutions(&self) -> Vec<Evolution> {
        vec![Evolution { from: 1, to: 3, level: 16 }]
    }
    fn starters(&self) -> Vec<u16> {
        vec![1, 2, 3]
    }
    fn trainers(&self) -> Vec<Trainer> {
        self.trainers.clone()
    }
    fn static_pokemon(&self) -> Vec<u16> {
        self.statics.clone()
    }
    fn encounters(&self, _use_time_based: bool) -> Vec<EncounterArea> {
        self.areas.clone()
    }
    fn tm_moves(&self) -> Vec<u16> {
        self.tms.clone()
    }
    fn tutor_moves(&self) -> Vec<u16> {
        vec![2]
    }
    fn in_game_trades(&self) -> Vec<InGameTrade> {
        vec![InGameTrade {
            nickname: "Spot".to_string(),
            given: 4,
            requested: 1,
        }]
    }

    fn restrict_species_pool(&mut self, _restriction: &SpeciesRestriction, _bans: &BanLists) -> Result<()> {
        self.record("restrict_species_pool")
    }

    fn randomize_move_powers(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_move_powers")
    }
    fn randomize_move_accuracies(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_move_accuracies")
    }
    fn randomize_move_pps(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_move_pps")
    }
    fn randomize_move_types(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_move_types")
    }
    fn randomize_move_categories(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_move_categories")
    }

    fn apply_misc_tweak(&mut self, tweak: &Tweak, _rng: &mut RandomSource) -> Result<()> {
        self.record(&format!("tweak:{}", tweak.name))
    }

    fn shuffle_base_stats(&mut self, _follow_evolutions: bool, rng: &mut RandomSource) -> Result<()> {
        self.record("shuffle_base_stats")?;
        for sp in &mut self.species {
            let mut stats = [sp.hp, sp.attack, sp.defense, sp.sp_atk, sp.sp_def, sp.speed];
            stats.shuffle(rng);
            sp.hp = stats[0];
            sp.attack = stats[1];
            sp.defense = stats[2];
            sp.sp_atk = stats[3];
            sp.sp_def = stats[4];
            sp.speed = stats[5];
        }
        Ok(())
    }
    fn randomize_base_stats(&mut self, _follow_evolutions: bool, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_base_stats")
    }
    fn randomize_base_stats_keep_total(&mut self, _follow_evolutions: bool, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_base_stats_keep_total")
    }
    fn randomize_base_stat_totals(
        &mut self,
        _follow_evolutions: bool,
        _min_percent: u8,
        _max_percent: u8,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        self.record("randomize_base_stat_totals")
    }
    fn equalize_base_stats(&mut self, _follow_evolutions: bool) -> Result<()> {
        self.record("equalize_base_stats")
    }

    fn randomize_abilities(&mut self, _opts: &AbilitySettings, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_abilities")
    }
    fn randomize_types(&mut self, _follow_evolutions: bool, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_types")
    }
    fn randomize_wild_held_items(&mut self, _items: &ItemList, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_wild_held_items")
    }

    fn randomize_evolutions(&mut self, _opts: &EvolutionSettings, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_evolutions")
    }
    fn remove_trade_evolutions(&mut self) -> Result<()> {
        self.record("remove_trade_evolutions")
    }
    fn condense_evolution_levels(&mut self) -> Result<()> {
        self.record("condense_evolution_levels")
    }

    fn set_starters(&mut self, _starters: [u16; 3]) -> Result<()> {
        self.record("set_starters")
    }
    fn randomize_starters(
        &mut self,
        _required_evolutions: u8,
        _legendaries: LegendaryPolicy,
        _bans: &BanLists,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        self.record("randomize_starters")
    }

    fn randomize_movesets(&mut self, _opts: &MovesetSettings, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_movesets")
    }
    fn ensure_four_starting_moves(&mut self) -> Result<()> {
        self.record("ensure_four_starting_moves")
    }
    fn reorder_damaging_moves(&mut self) -> Result<()> {
        self.record("reorder_damaging_moves")
    }
    fn force_good_damaging_moves(&mut self, _percent: u8, _rng: &mut RandomSource) -> Result<()> {
        self.record("force_good_damaging_moves")
    }

    fn randomize_trainer_parties(&mut self, _opts: &TrainerSettings, _bans: &BanLists, rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_trainer_parties")?;
        for t in &mut self.trainers {
            for m in &mut t.party {
                m.species = rng.gen_range(1..=4);
            }
        }
        Ok(())
    }
    fn apply_trainer_level_modifier(&mut self, _percent: i8) -> Result<()> {
        self.record("apply_trainer_level_modifier")
    }
    fn randomize_trainer_names(&mut self, custom_names: bool, _rng: &mut RandomSource) -> Result<()> {
        self.record(&format!("randomize_trainer_names:{}", custom_names))
    }
    fn randomize_trainer_class_names(&mut self, custom_names: bool, _rng: &mut RandomSource) -> Result<()> {
        self.record(&format!("randomize_trainer_class_names:{}", custom_names))
    }

    fn metronome_only_mode(&mut self) -> Result<()> {
        self.record("metronome_only_mode")
    }

    fn randomize_static_pokemon(&mut self, _mode: StaticMode, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_static_pokemon")
    }
    fn set_minimum_catch_rate(&mut self, normal: u8, legendary: u8) -> Result<()> {
        self.record(&format!("set_minimum_catch_rate:{}:{}", normal, legendary))
    }

    fn randomize_encounters(&mut self, _opts: &WildSettings, _bans: &BanLists, rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_encounters")?;
        for a in &mut self.areas {
            for m in &mut a.encounters {
                m.species = rng.gen_range(1..=4);
            }
        }
        Ok(())
    }
    fn condense_encounter_slots(&mut self) -> Result<()> {
        self.record("condense_encounter_slots")
    }

    fn randomize_battle_facility_teams(&mut self, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_battle_facility_teams")
    }

    fn randomize_tm_moves(&mut self, _opts: &MoveListSettings, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_tm_moves")
    }
    fn randomize_tm_compatibility(&mut self, _mode: CompatibilityMode, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_tm_compatibility")
    }
    fn randomize_tutor_moves(&mut self, _opts: &MoveListSettings, _bans: &BanLists, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_tutor_moves")
    }
    fn randomize_tutor_compatibility(&mut self, _mode: CompatibilityMode, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_tutor_compatibility")
    }

    fn randomize_in_game_trades(&mut self, _opts: &TradeSettings, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_in_game_trades")
    }

    fn shuffle_field_items(&mut self, _rng: &mut RandomSource) -> Result<()> {
        self.record("shuffle_field_items")
    }
    fn randomize_field_items(
        &mut self,
        _opts: &FieldItemSettings,
        _items: &ItemList,
        _rng: &mut RandomSource,
    ) -> Result<()> {
        self.record("randomize_field_items")
    }

    fn randomize_type_chart(&mut self, _mode: TypeChartMode, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_type_chart")
    }
    fn randomize_warps(&mut self, _opts: &WarpSettings, _rng: &mut RandomSource) -> Result<()> {
        self.record("randomize_warps")
    }

    fn apply_signature(&mut self) -> Result<()> {
        self.record("apply_signature")
    }
    fn write_check_value(&mut self, check_value: u32) -> Result<()> {
        self.record("write_check_value")?;
        self.check_value = Some(check_value);
        Ok(())
    }
    fn save(&mut self, path: &Path) -> Result<()> {
        self.record("save")?;
        fs::write(path, self.image())?;
        Ok(())
    }
}

struct Run {
    rom: MockRom,
    check_value: u32,
    log: String,
    progress: Vec<Progress>,
    image: Vec<u8>,
}

fn run(rom: MockRom, settings: &Settings, seed: u64) -> Result<Run> {
    run_with_names(rom, settings, seed, None)
}

fn run_with_names(
    mut rom: MockRom,
    settings: &Settings,
    seed: u64,
    names: Option<&Path>,
) -> Result<Run> {
    let bans = BanLists::empty();
    let registry = TweakRegistry::standard()?;
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.bin");
    let mut log = Vec::new();
    let mut progress = Vec::new();

    let check_value = {
        let mut randomizer = Randomizer::new(&mut rom, settings, &bans, &registry)?;
        if let Some(names) = names {
            randomizer = randomizer.with_names_resource(names);
        }
        randomizer.randomize(&out, &mut log, seed, |p| progress.push(p))?
    };

    Ok(Run {
        rom,
        check_value,
        log: String::from_utf8(log).unwrap(),
        progress,
        image: fs::read(&out)?,
    })
}

fn shuffle_only() -> Settings {
    let mut settings = Settings::default();
    settings.base_stats.mode = BaseStatsMode::Shuffle;
    settings.trainers.mode = TrainersMode::Unchanged;
    settings.wild.mode = WildMode::Unchanged;
    settings.movesets.mode = MovesetsMode::Unchanged;
    settings
}

#[test]
fn shuffle_only_run_skips_trainers_and_wild_but_folds_them() {
    let result = run(MockRom::new(), &shuffle_only(), 42).unwrap();

    assert!(result.rom.called("shuffle_base_stats"));
    assert!(!result.rom.called("randomize_trainer_parties"));
    assert!(!result.rom.called("randomize_encounters"));
    assert!(result.log.lines().any(|l| l == "Pokemon Movesets: Unchanged."));

    // Trainer and wild pairs still count: changing an untouched trainer
    // level changes the check value.
    let mut tweaked = MockRom::new();
    tweaked.trainers[1].party[0].level = 15;
    let other = run(tweaked, &shuffle_only(), 42).unwrap();
    assert_ne!(result.check_value, other.check_value);

    let mut tweaked = MockRom::new();
    tweaked.areas[0].encounters[0].level = 9;
    let other = run(tweaked, &shuffle_only(), 42).unwrap();
    assert_ne!(result.check_value, other.check_value);
}

#[test]
fn same_seed_same_output() {
    let mut settings = shuffle_only();
    settings.trainers.mode = TrainersMode::Random;
    settings.wild.mode = WildMode::Random;

    let a = run(MockRom::new(), &settings, 7).unwrap();
    let b = run(MockRom::new(), &settings, 7).unwrap();
    assert_eq!(a.check_value, b.check_value);
    assert_eq!(a.image, b.image);
    assert_eq!(a.rom.check_value, Some(a.check_value));
}

#[test]
fn check_value_depends_on_seed() {
    let mut settings = shuffle_only();
    settings.trainers.mode = TrainersMode::Random;
    settings.wild.mode = WildMode::Random;

    let values: Vec<u32> = (0..8)
        .map(|seed| run(MockRom::new(), &settings, seed).unwrap().check_value)
        .collect();
    assert!(values.iter().any(|&v| v != values[0]));
}

#[test]
fn unchanged_settings_still_produce_a_check_value() {
    let a = run(MockRom::new(), &Settings::default(), 1).unwrap();
    let b = run(MockRom::new(), &Settings::default(), 2).unwrap();
    assert_ne!(a.check_value, 0);
    // Nothing draws, so the seed does not matter.
    assert_eq!(a.check_value, b.check_value);
    assert!(a.log.contains("RNG Calls: 0"));
}

#[test]
fn stages_run_in_fixed_order() {
    let mut settings = shuffle_only();
    settings.trainers.mode = TrainersMode::Random;
    settings.wild.mode = WildMode::Random;
    settings.movesets.mode = MovesetsMode::MetronomeOnly;
    settings.statics = StaticMode::CompletelyRandom;
    settings.tms.mode = MoveListMode::Random;

    let result = run(MockRom::new(), &settings, 3).unwrap();
    let order = [
        "restrict_species_pool",
        "shuffle_base_stats",
        "randomize_trainer_parties",
        "metronome_only_mode",
        "randomize_static_pokemon",
        "randomize_encounters",
        "randomize_tm_moves",
        "apply_signature",
        "write_check_value",
        "save",
    ];
    let positions: Vec<usize> = order.iter().map(|op| result.rom.position(op)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", result.rom.calls);
}

#[test]
fn progress_reports_every_stage() {
    let result = run(MockRom::new(), &Settings::default(), 0).unwrap();
    assert_eq!(result.progress.len(), 25);
    for (i, p) in result.progress.iter().enumerate() {
        assert_eq!(p.stage, i + 1);
        assert_eq!(p.total, 25);
    }
    assert_eq!(result.progress[0].name, "species pool");
    assert_eq!(result.progress[24].name, "save");
}

#[test]
fn stage_failure_is_wrapped_and_stops_the_run() {
    let mut rom = MockRom::new();
    rom.fail_on = Some("randomize_encounters");
    let mut settings = Settings::default();
    settings.wild.mode = WildMode::Random;

    let bans = BanLists::empty();
    let registry = TweakRegistry::standard().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut log = Vec::new();
    let mut stages = 0;
    let err = {
        let mut randomizer = Randomizer::new(&mut rom, &settings, &bans, &registry).unwrap();
        randomizer
            .randomize(&dir.path().join("out.bin"), &mut log, 5, |_| stages += 1)
            .unwrap_err()
    };

    match err {
        RandomizerError::Stage { stage, source } => {
            assert_eq!(stage, "wild pokemon");
            assert!(matches!(*source, RandomizerError::Rom(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(stages, 16);
    assert!(!rom.called("save"));
    assert!(!dir.path().join("out.bin").exists());
}

#[test]
fn invalid_settings_rejected_before_any_stage() {
    let mut rom = MockRom::new();
    let mut settings = Settings::default();
    settings.movesets.good_damaging_percent = 120;

    let bans = BanLists::empty();
    let registry = TweakRegistry::standard().unwrap();
    let err = Randomizer::new(&mut rom, &settings, &bans, &registry).err();
    assert!(matches!(err, Some(RandomizerError::Config(_))));
    assert!(rom.calls.is_empty());
}

#[test]
fn unsupported_options_are_skipped_quietly() {
    let mut rom = MockRom::new();
    rom.tutors = false;
    rom.type_chart = false;
    let mut settings = Settings::default();
    settings.tutors = MoveListSettings {
        mode: MoveListMode::Random,
        compatibility: CompatibilityMode::Full,
        ..Default::default()
    };
    settings.type_chart = TypeChartMode::Shuffle;
    settings.move_data.category = true;
    settings.wild.condense_slots = true;
    settings.battle_facility = true;

    let result = run(rom, &settings, 11).unwrap();
    for op in [
        "randomize_tutor_moves",
        "randomize_tutor_compatibility",
        "randomize_type_chart",
        "randomize_move_categories",
        "condense_encounter_slots",
        "randomize_battle_facility_teams",
    ] {
        assert!(!result.rom.called(op), "{} should have been skipped", op);
    }
}

#[test]
fn tweaks_apply_in_priority_order_when_available() {
    let mut rom = MockRom::new();
    rom.tweaks_available = tweaks::FASTEST_TEXT | tweaks::BALANCE_STATIC_LEVELS | tweaks::BAN_LUCKY_EGG;
    let mut settings = Settings::default();
    settings.tweaks = tweaks::FASTEST_TEXT | tweaks::BALANCE_STATIC_LEVELS | tweaks::EXP_PATCH;

    let result = run(rom, &settings, 0).unwrap();
    let applied: Vec<&str> = result
        .rom
        .calls
        .iter()
        .filter(|c| c.starts_with("tweak:"))
        .map(String::as_str)
        .collect();
    assert_eq!(applied, vec!["tweak:Balance Static Levels", "tweak:Fastest Text"]);
}

#[test]
fn tweaks_skipped_when_nothing_overlaps() {
    let mut rom = MockRom::new();
    rom.tweaks_available = tweaks::FASTEST_TEXT;
    let mut settings = Settings::default();
    settings.tweaks = tweaks::EXP_PATCH;

    let result = run(rom, &settings, 0).unwrap();
    assert!(!result.rom.calls.iter().any(|c| c.starts_with("tweak:")));
}

#[test]
fn catch_rate_floor_uses_tier_values() {
    let mut settings = Settings::default();
    settings.minimum_catch_rate = CatchRateTier::Tier2;
    let result = run(MockRom::new(), &settings, 0).unwrap();
    assert!(result.rom.called("set_minimum_catch_rate:128:64"));

    let result = run(MockRom::new(), &Settings::default(), 0).unwrap();
    assert!(!result.rom.calls.iter().any(|c| c.starts_with("set_minimum_catch_rate")));
}

#[test]
fn moveset_log_names_unknown_moves() {
    let mut settings = Settings::default();
    settings.movesets.mode = MovesetsMode::RandomPreferSameType;
    settings.movesets.start_with_four_moves = true;

    let result = run(MockRom::new(), &settings, 0).unwrap();
    assert!(result.rom.called("randomize_movesets"));
    assert!(result.rom.called("ensure_four_starting_moves"));
    assert!(result
        .log
        .lines()
        .any(|l| l == "Sproutle: Lv1 Tackle, Lv7 invalid move #99"));
}

#[test]
fn log_has_header_and_footer() {
    let result = run(MockRom::new(), &shuffle_only(), 42).unwrap();
    assert!(result.log.starts_with("Randomizer Version: "));
    assert!(result.log.contains("Random Seed: 42"));
    assert!(result.log.contains("ROM: Mock Version"));
    assert!(result.log.contains("--Pokemon Base Stats & Types--"));
    assert!(result
        .log
        .contains(&format!("Check value: {:08X}", result.check_value)));
}

fn every_stage_on(movesets: MovesetsMode) -> Settings {
    let mut s = Settings::default();
    s.move_data.power = true;
    s.move_data.accuracy = true;
    s.move_data.pp = true;
    s.move_data.types = true;
    s.move_data.category = true;
    s.tweaks = tweaks::FASTEST_TEXT;
    s.base_stats.mode = BaseStatsMode::Shuffle;
    s.abilities.mode = AbilitiesMode::Random;
    s.types = TypesMode::RandomFollowEvolutions;
    s.wild_held_items.randomize = true;
    s.evolutions.mode = EvolutionsMode::Random;
    s.evolutions.remove_trade_evolutions = true;
    s.evolutions.condense_levels = true;
    s.starters.mode = StartersMode::Random;
    s.movesets.mode = movesets;
    s.movesets.start_with_four_moves = true;
    s.movesets.reorder_damaging = true;
    s.movesets.force_good_damaging = true;
    s.movesets.good_damaging_percent = 40;
    s.trainers.mode = TrainersMode::Random;
    s.trainers.level_modifier = 10;
    s.trainers.randomize_names = true;
    s.trainers.randomize_class_names = true;
    s.statics = StaticMode::RandomMatching;
    s.minimum_catch_rate = CatchRateTier::Tier1;
    s.wild.mode = WildMode::Random;
    s.wild.condense_slots = true;
    s.battle_facility = true;
    s.tms.mode = MoveListMode::Random;
    s.tms.compatibility = CompatibilityMode::RandomPreferType;
    s.tutors.mode = MoveListMode::Random;
    s.tutors.compatibility = CompatibilityMode::RandomPreferType;
    s.trades.mode = TradesMode::RandomizeGiven;
    s.field_items.mode = FieldItemsMode::Random;
    s.type_chart = TypeChartMode::Shuffle;
    s.warps.mode = WarpsMode::Random;
    s
}

fn capable_rom() -> MockRom {
    let mut rom = MockRom::new();
    rom.every_capability = true;
    rom.tweaks_available = tweaks::FASTEST_TEXT;
    rom
}

fn expected_sequence(moveset_ops: &[&'static str], metronome: bool) -> Vec<String> {
    let mut ops = vec![
        "restrict_species_pool",
        "randomize_move_powers",
        "randomize_move_accuracies",
        "randomize_move_pps",
        "randomize_move_types",
        "randomize_move_categories",
        "tweak:Fastest Text",
        "shuffle_base_stats",
        "randomize_abilities",
        "randomize_types",
        "randomize_wild_held_items",
        "randomize_evolutions",
        "remove_trade_evolutions",
        "condense_evolution_levels",
        "randomize_starters",
    ];
    ops.extend_from_slice(moveset_ops);
    ops.extend_from_slice(&[
        "randomize_trainer_parties",
        "apply_trainer_level_modifier",
        "randomize_trainer_names:false",
        "randomize_trainer_class_names:false",
    ]);
    if metronome {
        ops.push("metronome_only_mode");
    }
    ops.extend_from_slice(&[
        "randomize_static_pokemon",
        "set_minimum_catch_rate:75:37",
        "randomize_encounters",
        "condense_encounter_slots",
        "randomize_battle_facility_teams",
        "randomize_tm_moves",
        "randomize_tm_compatibility",
        "randomize_tutor_moves",
        "randomize_tutor_compatibility",
        "randomize_in_game_trades",
        "randomize_field_items",
        "randomize_type_chart",
        "randomize_warps",
        "apply_signature",
        "write_check_value",
        "save",
    ]);
    ops.into_iter().map(String::from).collect()
}

#[test]
fn every_stage_runs_in_order_with_random_movesets() {
    let settings = every_stage_on(MovesetsMode::RandomPreferSameType);
    let result = run(capable_rom(), &settings, 9).unwrap();
    let expected = expected_sequence(
        &[
            "randomize_movesets",
            "ensure_four_starting_moves",
            "reorder_damaging_moves",
            "force_good_damaging_moves",
        ],
        false,
    );
    assert_eq!(result.rom.calls, expected);
}

#[test]
fn every_stage_runs_in_order_with_metronome() {
    let settings = every_stage_on(MovesetsMode::MetronomeOnly);
    let result = run(capable_rom(), &settings, 9).unwrap();
    assert_eq!(result.rom.calls, expected_sequence(&[], true));
}

fn names_run(settings: &Settings, names: Option<&Path>) -> Vec<String> {
    let result = run_with_names(MockRom::new(), settings, 0, names).unwrap();
    result
        .rom
        .calls
        .into_iter()
        .filter(|c| c.starts_with("randomize_trainer_names"))
        .collect()
}

#[test]
fn custom_names_used_only_while_file_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let names = dir.path().join("trainer_names.txt");
    fs::write(&names, "Ash\nMisty\nBrock\n").unwrap();

    let mut settings = Settings::default();
    settings.trainers.randomize_names = true;
    settings.record_names_resource(&names).unwrap();

    assert_eq!(
        names_run(&settings, Some(names.as_path())),
        vec!["randomize_trainer_names:true"]
    );

    // Reformatting without changing the names keeps the CRC.
    fs::write(&names, "  Ash\n\nMisty\r\nBrock").unwrap();
    assert_eq!(
        names_run(&settings, Some(names.as_path())),
        vec!["randomize_trainer_names:true"]
    );

    let mut file = fs::OpenOptions::new().append(true).open(&names).unwrap();
    writeln!(file, "\nGary").unwrap();
    drop(file);
    assert_eq!(
        names_run(&settings, Some(names.as_path())),
        vec!["randomize_trainer_names:false"]
    );
}

#[test]
fn built_in_names_without_a_names_file() {
    let mut settings = Settings::default();
    settings.trainers.randomize_names = true;
    assert_eq!(names_run(&settings, None), vec!["randomize_trainer_names:false"]);
}
