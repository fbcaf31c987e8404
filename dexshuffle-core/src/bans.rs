use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{RandomizerError, Result};

pub type NameMap = HashMap<String, u16>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BanSpec {
    pub banned_items: Vec<String>,
    pub banned_bad_items: Vec<String>,
    pub banned_pokemon: Vec<String>,
    pub banned_player_pokemon: Vec<String>,
    pub legendaries: Vec<String>,
    pub game_breaking_moves: Vec<String>,
    pub banned_random_moves: Vec<String>,
    pub banned_damaging_moves: Vec<String>,
    pub trapping_abilities: Vec<String>,
    pub negative_abilities: Vec<String>,
}

impl BanSpec {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| RandomizerError::Config(format!("invalid ban specification: {}", e)))
    }
}

/// Inclusive id range sharing an item type (balls, TMs, berries...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub name: String,
    pub first: u16,
    pub last: u16,
}

impl ItemGroup {
    pub fn contains(&self, id: u16) -> bool {
        id >= self.first && id <= self.last
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemList {
    ids: Vec<u16>,
    groups: Vec<ItemGroup>,
}

impl ItemList {
    fn new(ids: BTreeSet<u16>, groups: Vec<ItemGroup>) -> Self {
        ItemList {
            ids: ids.into_iter().collect(),
            groups,
        }
    }

    pub fn is_allowed(&self, id: u16) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn allowed_ids(&self) -> &[u16] {
        &self.ids
    }

    pub fn groups(&self) -> &[ItemGroup] {
        &self.groups
    }

    pub fn allowed_in_group(&self, group: &str) -> Vec<u16> {
        match self.groups.iter().find(|g| g.name == group) {
            Some(g) => self.ids.iter().copied().filter(|&id| g.contains(id)).collect(),
            None => Vec::new(),
        }
    }

    pub fn random_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<u16> {
        if self.ids.is_empty() {
            return None;
        }
        Some(self.ids[rng.gen_range(0..self.ids.len())])
    }

    pub fn random_item_in_group<R: Rng + ?Sized>(&self, group: &str, rng: &mut R) -> Option<u16> {
        let pool = self.allowed_in_group(group);
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BanLists {
    pub items: ItemList,
    pub non_bad_items: ItemList,
    pub banned_species: Vec<u16>,
    pub player_banned_species: Vec<u16>,
    pub legendaries: Vec<u16>,
    pub game_breaking_moves: Vec<u16>,
    pub banned_random_moves: Vec<u16>,
    pub banned_damaging_moves: Vec<u16>,
    pub trapping_abilities: Vec<u16>,
    pub negative_abilities: Vec<u16>,
}

impl BanLists {
    pub fn empty() -> Self {
        let items = ItemList::new(BTreeSet::new(), Vec::new());
        BanLists {
            items: items.clone(),
            non_bad_items: items,
            banned_species: Vec::new(),
            player_banned_species: Vec::new(),
            legendaries: Vec::new(),
            game_breaking_moves: Vec::new(),
            banned_random_moves: Vec::new(),
            banned_damaging_moves: Vec::new(),
            trapping_abilities: Vec::new(),
            negative_abilities: Vec::new(),
        }
    }

    pub fn is_legendary(&self, species: u16) -> bool {
        self.legendaries.contains(&species)
    }
}

#[derive(Debug, Default)]
pub struct CustomConfig {
    spec: BanSpec,
    species: Option<NameMap>,
    abilities: Option<NameMap>,
    items: Option<NameMap>,
    moves: Option<NameMap>,
    item_groups: Vec<ItemGroup>,
    lists: Option<BanLists>,
}

fn resolve(list: &str, names: &[String], map: &NameMap) -> Result<Vec<u16>> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let id = map.get(name.trim()).ok_or_else(|| {
            RandomizerError::Config(format!("{}: unknown name '{}'", list, name))
        })?;
        out.push(*id);
    }
    Ok(out)
}

fn required<'a>(map: &'a Option<NameMap>, what: &str) -> Result<&'a NameMap> {
    map.as_ref().ok_or_else(|| {
        RandomizerError::Config(format!("{} names must be set before init", what))
    })
}

impl CustomConfig {
    pub fn new(spec: BanSpec) -> Self {
        CustomConfig {
            spec,
            ..Default::default()
        }
    }

    pub fn set_species_names(&mut self, map: NameMap) {
        self.species = Some(map);
    }

    pub fn set_ability_names(&mut self, map: NameMap) {
        self.abilities = Some(map);
    }

    pub fn set_item_names(&mut self, map: NameMap) {
        self.items = Some(map);
    }

    pub fn set_move_names(&mut self, map: NameMap) {
        self.moves = Some(map);
    }

    pub fn set_item_groups(&mut self, groups: Vec<ItemGroup>) {
        self.item_groups = groups;
    }

    pub fn init(&mut self) -> Result<()> {
        if self.lists.is_some() {
            return Err(RandomizerError::Config(
                "ban lists have already been initialised".to_string(),
            ));
        }

        let species = required(&self.species, "species")?;
        let abilities = required(&self.abilities, "ability")?;
        let items = required(&self.items, "item")?;
        let moves = required(&self.moves, "move")?;
        let spec = &self.spec;

        let all_items: BTreeSet<u16> = items.values().copied().collect();
        let banned_items: BTreeSet<u16> =
            resolve("banned_items", &spec.banned_items, items)?.into_iter().collect();
        let bad_items: BTreeSet<u16> =
            resolve("banned_bad_items", &spec.banned_bad_items, items)?.into_iter().collect();

        let general: BTreeSet<u16> = all_items.difference(&banned_items).copied().collect();
        let non_bad: BTreeSet<u16> = general.difference(&bad_items).copied().collect();

        let banned_species = resolve("banned_pokemon", &spec.banned_pokemon, species)?;
        let mut player: BTreeSet<u16> =
            resolve("banned_player_pokemon", &spec.banned_player_pokemon, species)?
                .into_iter()
                .collect();
        player.extend(banned_species.iter().copied());

        let lists = BanLists {
            items: ItemList::new(general, self.item_groups.clone()),
            non_bad_items: ItemList::new(non_bad, self.item_groups.clone()),
            banned_species,
            player_banned_species: player.into_iter().collect(),
            legendaries: resolve("legendaries", &spec.legendaries, species)?,
            game_breaking_moves: resolve("game_breaking_moves", &spec.game_breaking_moves, moves)?,
            banned_random_moves: resolve("banned_random_moves", &spec.banned_random_moves, moves)?,
            banned_damaging_moves: resolve(
                "banned_damaging_moves",
                &spec.banned_damaging_moves,
                moves,
            )?,
            trapping_abilities: resolve("trapping_abilities", &spec.trapping_abilities, abilities)?,
            negative_abilities: resolve("negative_abilities", &spec.negative_abilities, abilities)?,
        };

        log::debug!(
            "ban lists ready: {} allowed items, {} banned species, {} player bans",
            lists.items.allowed_ids().len(),
            lists.banned_species.len(),
            lists.player_banned_species.len()
        );
        self.lists = Some(lists);
        Ok(())
    }

    pub fn lists(&self) -> Result<&BanLists> {
        self.lists.as_ref().ok_or_else(|| {
            RandomizerError::Config("ban lists queried before init".to_string())
        })
    }

    pub fn into_lists(self) -> Result<BanLists> {
        self.lists.ok_or_else(|| {
            RandomizerError::Config("ban lists queried before init".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomSource;

    fn names(pairs: &[(&str, u16)]) -> NameMap {
        pairs.iter().map(|(n, id)| (n.to_string(), *id)).collect()
    }

    fn config(spec: BanSpec) -> CustomConfig {
        let mut cfg = CustomConfig::new(spec);
        cfg.set_species_names(names(&[("Mew", 151), ("Mewtwo", 150), ("Ditto", 132), ("Unown", 201)]));
        cfg.set_ability_names(names(&[("Shadow Tag", 23), ("Arena Trap", 71), ("Truant", 54)]));
        cfg.set_item_names(names(&[
            ("Master Ball", 1),
            ("Ultra Ball", 2),
            ("Potion", 17),
            ("Lucky Punch", 221),
            ("Leftovers", 234),
        ]));
        cfg.set_move_names(names(&[("Sonic Boom", 49), ("Dragon Rage", 82), ("Struggle", 165)]));
        cfg.set_item_groups(vec![ItemGroup {
            name: "balls".to_string(),
            first: 1,
            last: 16,
        }]);
        cfg
    }

    fn spec() -> BanSpec {
        BanSpec::from_json(
            r#"{
                "banned_items": ["Master Ball"],
                "banned_bad_items": ["Lucky Punch"],
                "banned_pokemon": ["Unown"],
                "banned_player_pokemon": ["Ditto", "Unown"],
                "legendaries": ["Mew", "Mewtwo"],
                "game_breaking_moves": ["Sonic Boom", "Dragon Rage"],
                "banned_random_moves": ["Struggle"],
                "trapping_abilities": ["Shadow Tag", "Arena Trap"],
                "negative_abilities": ["Truant"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn resolves_layered_item_lists() {
        let mut cfg = config(spec());
        cfg.init().unwrap();
        let lists = cfg.lists().unwrap();

        assert_eq!(lists.items.allowed_ids(), &[2, 17, 221, 234]);
        assert_eq!(lists.non_bad_items.allowed_ids(), &[2, 17, 234]);
        assert_eq!(lists.items.allowed_in_group("balls"), vec![2]);
        assert!(!lists.items.is_allowed(1));
        assert!(lists.banned_damaging_moves.is_empty());
        assert_eq!(lists.negative_abilities, vec![54]);
    }

    #[test]
    fn global_bans_are_player_bans() {
        let mut cfg = config(spec());
        cfg.init().unwrap();
        let lists = cfg.lists().unwrap();

        assert_eq!(lists.player_banned_species, vec![132, 201]);
        for id in &lists.banned_species {
            assert!(lists.player_banned_species.contains(id));
        }
    }

    #[test]
    fn global_only_ban_still_reaches_player_list() {
        let mut s = spec();
        s.banned_player_pokemon.clear();
        s.banned_pokemon = vec!["Mew".to_string()];
        let mut cfg = config(s);
        cfg.init().unwrap();
        assert_eq!(cfg.lists().unwrap().player_banned_species, vec![151]);
    }

    #[test]
    fn unknown_name_is_config_error() {
        let mut s = spec();
        s.legendaries.push("Missingno".to_string());
        let mut cfg = config(s);
        match cfg.init() {
            Err(RandomizerError::Config(msg)) => assert!(msg.contains("Missingno")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn query_before_init_fails() {
        let cfg = config(spec());
        assert!(cfg.lists().is_err());
    }

    #[test]
    fn init_requires_maps_and_runs_once() {
        let mut bare = CustomConfig::new(spec());
        assert!(bare.init().is_err());

        let mut cfg = config(spec());
        cfg.init().unwrap();
        assert!(cfg.init().is_err());
    }

    #[test]
    fn unknown_spec_key_rejected() {
        assert!(BanSpec::from_json(r#"{"banned_stuff": []}"#).is_err());
    }

    #[test]
    fn random_item_comes_from_allowed_pool() {
        let mut cfg = config(spec());
        cfg.init().unwrap();
        let lists = cfg.into_lists().unwrap();
        let mut rng = RandomSource::new(3);
        for _ in 0..32 {
            let id = lists.non_bad_items.random_item(&mut rng).unwrap();
            assert!(lists.non_bad_items.is_allowed(id));
        }
        assert_eq!(lists.items.random_item_in_group("balls", &mut rng), Some(2));
        assert_eq!(lists.items.random_item_in_group("berries", &mut rng), None);
    }
}
