use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::bans::BanLists;
use crate::checksum::CheckValue;
use crate::rng::RandomSource;
use crate::rom::RomHandler;
use crate::settings::{
    AbilitiesMode, BaseStatsMode, CompatibilityMode, EvolutionsMode, FieldItemsMode, MoveListMode,
    MovesetsMode, Settings, StartersMode, StaticMode, TradesMode, TrainersMode, TypeChartMode,
    TypesMode, WarpsMode, WildMode, WildSettings,
};
use crate::tweaks::TweakRegistry;
use crate::{RandomizerError, Result};

pub const STAGE_COUNT: usize = 25;

const SEPARATOR: &str = "------------------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: usize,
    pub total: usize,
    pub name: &'static str,
}

/// Runs the randomization stages against one loaded ROM.
pub struct Randomizer<'a, R: RomHandler + ?Sized> {
    rom: &'a mut R,
    settings: &'a Settings,
    bans: &'a BanLists,
    tweaks: &'a TweakRegistry,
    names_resource: Option<PathBuf>,
    rng: RandomSource,
    stage: usize,
}

fn stage_failed(stage: &'static str, err: RandomizerError) -> RandomizerError {
    RandomizerError::Stage {
        stage,
        source: Box::new(err),
    }
}

impl<'a, R: RomHandler + ?Sized> Randomizer<'a, R> {
    pub fn new(
        rom: &'a mut R,
        settings: &'a Settings,
        bans: &'a BanLists,
        tweaks: &'a TweakRegistry,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Randomizer {
            rom,
            settings,
            bans,
            tweaks,
            names_resource: None,
            rng: RandomSource::new(0),
            stage: 0,
        })
    }

    /// Custom trainer names file, used only while its CRC matches the one
    /// recorded in the settings.
    pub fn with_names_resource(mut self, path: impl Into<PathBuf>) -> Self {
        self.names_resource = Some(path.into());
        self
    }

    pub fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    /// Randomize the loaded ROM, write it to `output_path` and return the
    /// check value. Any stage failure aborts the run; the ROM model should
    /// be discarded afterwards.
    pub fn randomize<W, F>(
        &mut self,
        output_path: &Path,
        log: &mut W,
        seed: u64,
        mut progress: F,
    ) -> Result<u32>
    where
        W: Write + ?Sized,
        F: FnMut(Progress),
    {
        let started = Instant::now();
        self.rng.reseed(seed);
        self.stage = 0;
        let mut cv = CheckValue::new();

        log::info!("randomizing {} with seed {}", self.rom.rom_name(), seed);
        self.write_header(log, seed)?;

        self.run_stage(&mut progress, "species pool", |r| r.restrict_species_pool())?;
        self.run_stage(&mut progress, "move data", |r| r.randomize_move_data(log))?;
        self.run_stage(&mut progress, "tweaks", |r| r.apply_tweaks())?;
        self.run_stage(&mut progress, "base stats", |r| r.randomize_base_stats())?;
        self.run_stage(&mut progress, "abilities", |r| r.randomize_abilities())?;
        self.run_stage(&mut progress, "types", |r| r.randomize_types(log, &mut cv))?;
        self.run_stage(&mut progress, "wild held items", |r| r.randomize_wild_held_items())?;
        self.run_stage(&mut progress, "evolutions", |r| r.randomize_evolutions(log))?;
        self.run_stage(&mut progress, "evolution cleanup", |r| r.clean_up_evolutions(log))?;
        self.run_stage(&mut progress, "starters", |r| r.randomize_starters(log))?;
        self.run_stage(&mut progress, "movesets", |r| r.randomize_movesets(log))?;
        self.run_stage(&mut progress, "trainers", |r| r.randomize_trainers(log, &mut cv))?;
        self.run_stage(&mut progress, "trainer names", |r| r.randomize_trainer_names())?;
        self.run_stage(&mut progress, "metronome", |r| r.apply_metronome_mode())?;
        self.run_stage(&mut progress, "static pokemon", |r| r.randomize_statics(log, &mut cv))?;
        self.run_stage(&mut progress, "catch rates", |r| r.apply_minimum_catch_rate())?;
        self.run_stage(&mut progress, "wild pokemon", |r| r.randomize_wild_pokemon(log, &mut cv))?;
        self.run_stage(&mut progress, "battle facility", |r| r.randomize_battle_facility())?;
        self.run_stage(&mut progress, "tms", |r| r.randomize_tms(log, &mut cv))?;
        self.run_stage(&mut progress, "move tutors", |r| r.randomize_tutors(log))?;
        self.run_stage(&mut progress, "in-game trades", |r| r.randomize_trades(log))?;
        self.run_stage(&mut progress, "field items", |r| r.randomize_field_items())?;
        self.run_stage(&mut progress, "type chart", |r| r.randomize_type_chart())?;
        self.run_stage(&mut progress, "warps", |r| r.randomize_warps())?;
        self.run_stage(&mut progress, "save", |r| r.finish(output_path, &cv))?;

        let check_value = cv.value();
        writeln!(log, "{}", SEPARATOR)?;
        writeln!(log, "Randomization of {} completed.", self.rom.rom_name())?;
        writeln!(log, "Time elapsed: {}ms", started.elapsed().as_millis())?;
        writeln!(log, "RNG Calls: {}", self.rng.draws())?;
        writeln!(log, "Check value: {}", cv)?;
        writeln!(log, "{}", SEPARATOR)?;

        log::info!(
            "randomization finished: check value {}, {} rng draws",
            cv,
            self.rng.draws()
        );
        Ok(check_value)
    }

    fn run_stage<F>(
        &mut self,
        progress: &mut dyn FnMut(Progress),
        name: &'static str,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.stage += 1;
        log::debug!("stage {}/{}: {}", self.stage, STAGE_COUNT, name);
        body(self).map_err(|e| stage_failed(name, e))?;
        progress(Progress {
            stage: self.stage,
            total: STAGE_COUNT,
            name,
        });
        Ok(())
    }

    fn species_label(&self, id: u16) -> String {
        match self.rom.species_name(id) {
            Some(name) => name,
            None => format!("invalid species #{}", id),
        }
    }

    fn move_label(&self, id: u16) -> String {
        match self.rom.move_name(id) {
            Some(name) => name,
            None => format!("invalid move #{}", id),
        }
    }

    fn write_header<W: Write + ?Sized>(&self, log: &mut W, seed: u64) -> Result<()> {
        writeln!(log, "Randomizer Version: {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(log, "Random Seed: {}", seed)?;
        writeln!(log, "Settings String: {}", self.settings.to_settings_string())?;
        writeln!(log)?;
        writeln!(log, "ROM: {}", self.rom.rom_name())?;
        writeln!(log)?;
        Ok(())
    }

    fn restrict_species_pool(&mut self) -> Result<()> {
        self.rom
            .restrict_species_pool(&self.settings.species_pool, self.bans)
    }

    fn randomize_move_data<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let md = self.settings.move_data;
        if md.power {
            self.rom.randomize_move_powers(&mut self.rng)?;
        }
        if md.accuracy {
            self.rom.randomize_move_accuracies(&mut self.rng)?;
        }
        if md.pp {
            self.rom.randomize_move_pps(&mut self.rng)?;
        }
        if md.types {
            self.rom.randomize_move_types(&mut self.rng)?;
        }
        if md.category {
            if self.rom.has_physical_special_split() {
                self.rom.randomize_move_categories(&mut self.rng)?;
            } else {
                log::warn!("move categories requested but this game has no physical/special split");
            }
        }

        if !md.any() {
            writeln!(log, "Move Data: Unchanged.")?;
            writeln!(log)?;
            return Ok(());
        }

        writeln!(log, "--Move Data--")?;
        writeln!(log, "NUM|NAME           |TYPE    |POWER|ACC.|PP|CATEGORY")?;
        for mv in self.rom.moves() {
            writeln!(
                log,
                "{:3}|{:<15}|{:<8}|{:5}|{:4}|{:2}|{}",
                mv.id, mv.name, mv.move_type, mv.power, mv.accuracy, mv.pp, mv.category
            )?;
        }
        writeln!(log)?;
        Ok(())
    }

    fn apply_tweaks(&mut self) -> Result<()> {
        let available = self.rom.misc_tweaks_available();
        let selected = self.settings.tweaks;
        if available & selected == 0 {
            return Ok(());
        }

        for tweak in self.tweaks.ordered() {
            if available & tweak.value != 0 && selected & tweak.value != 0 {
                log::info!("applying tweak {}", tweak.name);
                self.rom.apply_misc_tweak(tweak, &mut self.rng)?;
            }
        }
        Ok(())
    }

    fn randomize_base_stats(&mut self) -> Result<()> {
        let bs = self.settings.base_stats;
        let follow = bs.follow_evolutions;
        match bs.mode {
            BaseStatsMode::Unchanged => Ok(()),
            BaseStatsMode::Shuffle => self.rom.shuffle_base_stats(follow, &mut self.rng),
            BaseStatsMode::Random => self.rom.randomize_base_stats(follow, &mut self.rng),
            BaseStatsMode::RandomKeepTotal => {
                self.rom.randomize_base_stats_keep_total(follow, &mut self.rng)
            }
            BaseStatsMode::RandomTotalPercent => self.rom.randomize_base_stat_totals(
                follow,
                bs.min_percent,
                bs.max_percent,
                &mut self.rng,
            ),
            BaseStatsMode::Equalize => self.rom.equalize_base_stats(follow),
        }
    }

    fn randomize_abilities(&mut self) -> Result<()> {
        let ab = &self.settings.abilities;
        if ab.mode == AbilitiesMode::Unchanged {
            return Ok(());
        }
        if self.rom.abilities_per_species() == 0 {
            log::debug!("game has no abilities, skipping");
            return Ok(());
        }
        self.rom.randomize_abilities(ab, self.bans, &mut self.rng)
    }

    fn randomize_types<W: Write + ?Sized>(&mut self, log: &mut W, cv: &mut CheckValue) -> Result<()> {
        match self.settings.types {
            TypesMode::Unchanged => {}
            TypesMode::RandomFollowEvolutions => self.rom.randomize_types(true, &mut self.rng)?,
            TypesMode::CompletelyRandom => self.rom.randomize_types(false, &mut self.rng)?,
        }

        let changed = self.settings.base_stats.mode != BaseStatsMode::Unchanged
            || self.settings.types != TypesMode::Unchanged
            || self.settings.abilities.mode != AbilitiesMode::Unchanged;
        let species = self.rom.species_stats();

        if changed {
            writeln!(log, "--Pokemon Base Stats & Types--")?;
            writeln!(log, "NUM|NAME      |TYPE             |  HP| ATK| DEF| SPA| SPD| SPE")?;
        } else {
            writeln!(log, "Pokemon Base Stats & Types: Unchanged.")?;
        }

        for sp in &species {
            cv.fold(sp.stat_tuple());
            if changed {
                let typing = match &sp.secondary_type {
                    Some(second) => format!("{}/{}", sp.primary_type, second),
                    None => sp.primary_type.clone(),
                };
                writeln!(
                    log,
                    "{:3}|{:<10}|{:<17}|{:4}|{:4}|{:4}|{:4}|{:4}|{:4}",
                    sp.id, sp.name, typing, sp.hp, sp.attack, sp.defense, sp.sp_atk, sp.sp_def, sp.speed
                )?;
            }
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_wild_held_items(&mut self) -> Result<()> {
        let opts = self.settings.wild_held_items;
        if !opts.randomize {
            return Ok(());
        }
        if !self.rom.has_wild_held_items() {
            log::debug!("game has no wild held items, skipping");
            return Ok(());
        }
        let items = if opts.ban_bad_items {
            &self.bans.non_bad_items
        } else {
            &self.bans.items
        };
        self.rom.randomize_wild_held_items(items, &mut self.rng)
    }

    fn randomize_evolutions<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let ev = &self.settings.evolutions;
        if ev.mode == EvolutionsMode::Unchanged {
            writeln!(log, "Evolutions: Unchanged.")?;
            writeln!(log)?;
            return Ok(());
        }

        self.rom.randomize_evolutions(ev, &mut self.rng)?;

        writeln!(log, "--Randomized Evolutions--")?;
        for evo in self.rom.evolutions() {
            writeln!(
                log,
                "{} -> {} (Lv {})",
                self.species_label(evo.from),
                self.species_label(evo.to),
                evo.level
            )?;
        }
        writeln!(log)?;
        Ok(())
    }

    fn clean_up_evolutions<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let ev = self.settings.evolutions;
        if ev.remove_trade_evolutions {
            self.rom.remove_trade_evolutions()?;
            writeln!(log, "Trade evolutions replaced with level or item evolutions.")?;
        }
        if ev.condense_levels {
            self.rom.condense_evolution_levels()?;
            writeln!(log, "Evolution levels condensed.")?;
        }
        Ok(())
    }

    fn randomize_starters<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let st = self.settings.starters;
        if st.mode == StartersMode::Unchanged {
            return Ok(());
        }
        if !self.rom.can_change_starters() {
            log::warn!("starter changes requested but this game does not support them");
            return Ok(());
        }

        match st.mode {
            StartersMode::Custom => {
                self.rom.set_starters(st.custom)?;
                writeln!(log, "--Custom Starters--")?;
            }
            StartersMode::Random => {
                self.rom.randomize_starters(
                    st.required_evolutions,
                    st.legendaries,
                    self.bans,
                    &mut self.rng,
                )?;
                writeln!(log, "--Random Starters--")?;
            }
            StartersMode::Unchanged => {}
        }

        for (i, id) in self.rom.starters().into_iter().enumerate() {
            writeln!(log, "Set starter {} to {}", i + 1, self.species_label(id))?;
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_movesets<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let mv = self.settings.movesets;
        match mv.mode {
            MovesetsMode::Unchanged => {
                writeln!(log, "Pokemon Movesets: Unchanged.")?;
                writeln!(log)?;
                return Ok(());
            }
            MovesetsMode::MetronomeOnly => {
                writeln!(log, "Pokemon Movesets: Metronome Only.")?;
                writeln!(log)?;
                return Ok(());
            }
            MovesetsMode::RandomPreferSameType | MovesetsMode::CompletelyRandom => {}
        }

        self.rom.randomize_movesets(&mv, self.bans, &mut self.rng)?;
        if mv.start_with_four_moves {
            if self.rom.supports_four_starting_moves() {
                self.rom.ensure_four_starting_moves()?;
            } else {
                log::warn!("four starting moves requested but not supported by this game");
            }
        }
        if mv.reorder_damaging {
            self.rom.reorder_damaging_moves()?;
        }
        if mv.force_good_damaging {
            self.rom
                .force_good_damaging_moves(mv.good_damaging_percent, &mut self.rng)?;
        }

        writeln!(log, "--Pokemon Movesets--")?;
        for set in self.rom.movesets() {
            let moves: Vec<String> = set
                .moves
                .iter()
                .map(|m| format!("Lv{} {}", m.level, self.move_label(m.move_id)))
                .collect();
            writeln!(log, "{}: {}", self.species_label(set.species), moves.join(", "))?;
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_trainers<W: Write + ?Sized>(&mut self, log: &mut W, cv: &mut CheckValue) -> Result<()> {
        let tr = self.settings.trainers;
        if tr.mode != TrainersMode::Unchanged {
            self.rom
                .randomize_trainer_parties(&tr, self.bans, &mut self.rng)?;
        }
        if tr.level_modifier != 0 {
            self.rom.apply_trainer_level_modifier(tr.level_modifier)?;
        }

        let changed = tr.mode != TrainersMode::Unchanged || tr.level_modifier != 0;
        if changed {
            writeln!(log, "--Trainers Pokemon--")?;
        } else {
            writeln!(log, "Trainers: Unchanged.")?;
        }

        for (i, trainer) in self.rom.trainers().into_iter().enumerate() {
            let mut party = Vec::with_capacity(trainer.party.len());
            for member in &trainer.party {
                cv.fold([member.level as u32, member.species as u32]);
                party.push(format!("{} Lv{}", self.species_label(member.species), member.level));
            }
            if changed {
                writeln!(log, "#{} ({}) - {}", i + 1, trainer.name, party.join(", "))?;
            }
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_trainer_names(&mut self) -> Result<()> {
        let tr = self.settings.trainers;
        if !tr.randomize_names && !tr.randomize_class_names {
            return Ok(());
        }
        if !self.rom.can_change_trainer_text() {
            log::warn!("trainer names requested but this game's text cannot be resized");
            return Ok(());
        }

        let custom_names = match (&self.names_resource, self.settings.custom_names_crc) {
            (Some(path), Some(_)) => {
                let current = self.settings.names_resource_current(path)?;
                if !current {
                    log::warn!(
                        "{} changed since these settings were made; using built-in names",
                        path.display()
                    );
                }
                current
            }
            (Some(_), None) => true,
            (None, _) => false,
        };

        if tr.randomize_names {
            self.rom.randomize_trainer_names(custom_names, &mut self.rng)?;
        }
        if tr.randomize_class_names {
            self.rom
                .randomize_trainer_class_names(custom_names, &mut self.rng)?;
        }
        Ok(())
    }

    fn apply_metronome_mode(&mut self) -> Result<()> {
        if self.settings.movesets.mode == MovesetsMode::MetronomeOnly {
            self.rom.metronome_only_mode()?;
        }
        Ok(())
    }

    fn randomize_statics<W: Write + ?Sized>(&mut self, log: &mut W, cv: &mut CheckValue) -> Result<()> {
        let mode = self.settings.statics;
        if mode != StaticMode::Unchanged {
            self.rom
                .randomize_static_pokemon(mode, self.bans, &mut self.rng)?;
            writeln!(log, "--Static Pokemon--")?;
        }

        for id in self.rom.static_pokemon() {
            cv.fold([id as u32]);
            if mode != StaticMode::Unchanged {
                writeln!(log, "{}", self.species_label(id))?;
            }
        }
        if mode != StaticMode::Unchanged {
            writeln!(log)?;
        }
        Ok(())
    }

    fn apply_minimum_catch_rate(&mut self) -> Result<()> {
        if let Some((normal, legendary)) = self.settings.minimum_catch_rate.floors() {
            self.rom.set_minimum_catch_rate(normal, legendary)?;
        }
        Ok(())
    }

    fn randomize_wild_pokemon<W: Write + ?Sized>(
        &mut self,
        log: &mut W,
        cv: &mut CheckValue,
    ) -> Result<()> {
        let wild = self.settings.wild;
        let time_based = wild.time_based && self.rom.has_time_based_encounters();
        let opts = WildSettings { time_based, ..wild };

        if wild.mode != WildMode::Unchanged {
            self.rom.randomize_encounters(&opts, self.bans, &mut self.rng)?;
        }
        if wild.condense_slots {
            if self.rom.can_condense_encounter_slots() {
                self.rom.condense_encounter_slots()?;
            } else {
                log::warn!("slot condensing requested but not supported by this game");
            }
        }

        let changed = wild.mode != WildMode::Unchanged;
        if changed {
            writeln!(log, "--Wild Pokemon--")?;
        } else {
            writeln!(log, "Wild Pokemon: Unchanged.")?;
        }

        for (i, area) in self.rom.encounters(time_based).into_iter().enumerate() {
            let mut slots = Vec::with_capacity(area.encounters.len());
            for enc in &area.encounters {
                cv.fold([enc.level as u32, enc.species as u32]);
                slots.push(format!("{} Lv{}", self.species_label(enc.species), enc.level));
            }
            if changed {
                writeln!(
                    log,
                    "Set #{} - {} (rate={}) - {}",
                    i + 1,
                    area.name,
                    area.rate,
                    slots.join(", ")
                )?;
            }
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_battle_facility(&mut self) -> Result<()> {
        if self.settings.battle_facility && self.rom.has_battle_facility() {
            self.rom
                .randomize_battle_facility_teams(self.bans, &mut self.rng)?;
        }
        Ok(())
    }

    fn randomize_tms<W: Write + ?Sized>(&mut self, log: &mut W, cv: &mut CheckValue) -> Result<()> {
        let tms = self.settings.tms;
        if tms.mode == MoveListMode::Random {
            self.rom.randomize_tm_moves(&tms, self.bans, &mut self.rng)?;
        }
        if tms.compatibility != CompatibilityMode::Unchanged {
            self.rom
                .randomize_tm_compatibility(tms.compatibility, &mut self.rng)?;
        }

        let changed = tms.mode == MoveListMode::Random;
        if changed {
            writeln!(log, "--TM Moves--")?;
        } else {
            writeln!(log, "TM Moves: Unchanged.")?;
        }
        for (i, id) in self.rom.tm_moves().into_iter().enumerate() {
            cv.fold([id as u32]);
            if changed {
                writeln!(log, "TM{:02} {}", i + 1, self.move_label(id))?;
            }
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_tutors<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        if !self.rom.has_move_tutors() {
            return Ok(());
        }
        let tutors = self.settings.tutors;
        if tutors.mode == MoveListMode::Random {
            self.rom
                .randomize_tutor_moves(&tutors, self.bans, &mut self.rng)?;
        }
        if tutors.compatibility != CompatibilityMode::Unchanged {
            self.rom
                .randomize_tutor_compatibility(tutors.compatibility, &mut self.rng)?;
        }

        if tutors.mode == MoveListMode::Unchanged {
            writeln!(log, "Move Tutor Moves: Unchanged.")?;
        } else {
            writeln!(log, "--Move Tutor Moves--")?;
            for (i, id) in self.rom.tutor_moves().into_iter().enumerate() {
                writeln!(log, "Tutor {:02} {}", i + 1, self.move_label(id))?;
            }
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_trades<W: Write + ?Sized>(&mut self, log: &mut W) -> Result<()> {
        let trades = self.settings.trades;
        if trades.mode == TradesMode::Unchanged {
            return Ok(());
        }

        self.rom.randomize_in_game_trades(&trades, &mut self.rng)?;
        writeln!(log, "--In-Game Trades--")?;
        for trade in self.rom.in_game_trades() {
            writeln!(
                log,
                "Trading {} for {} the {}",
                self.species_label(trade.requested),
                trade.nickname,
                self.species_label(trade.given)
            )?;
        }
        writeln!(log)?;
        Ok(())
    }

    fn randomize_field_items(&mut self) -> Result<()> {
        let fi = self.settings.field_items;
        match fi.mode {
            FieldItemsMode::Unchanged => Ok(()),
            FieldItemsMode::Shuffle => self.rom.shuffle_field_items(&mut self.rng),
            FieldItemsMode::Random => {
                let items = if fi.ban_bad_items {
                    &self.bans.non_bad_items
                } else {
                    &self.bans.items
                };
                self.rom.randomize_field_items(&fi, items, &mut self.rng)
            }
        }
    }

    fn randomize_type_chart(&mut self) -> Result<()> {
        let mode = self.settings.type_chart;
        if mode == TypeChartMode::Unchanged {
            return Ok(());
        }
        if !self.rom.has_type_chart() {
            log::warn!("type chart randomization requested but not supported by this game");
            return Ok(());
        }
        self.rom.randomize_type_chart(mode, &mut self.rng)
    }

    fn randomize_warps(&mut self) -> Result<()> {
        let warps = self.settings.warps;
        if warps.mode == WarpsMode::Unchanged {
            return Ok(());
        }
        if !self.rom.supports_warp_randomization() {
            log::warn!("warp randomization requested but not supported by this game");
            return Ok(());
        }
        self.rom.randomize_warps(&warps, &mut self.rng)
    }

    fn finish(&mut self, output_path: &Path, cv: &CheckValue) -> Result<()> {
        self.rom.apply_signature()?;
        self.rom.write_check_value(cv.value())?;
        self.rom.save(output_path)?;
        log::info!("wrote {}", output_path.display());
        Ok(())
    }
}
