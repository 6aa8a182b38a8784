//! Persisted ecosystem JSON.
//!
//! Shape: `{monsterPopulation, environmentState, eventFlags}`. A missing
//! document falls back to the initial state. Unparseable data, or a document
//! lacking any species population or biome environment, is logged and also
//! replaced by the initial state, never merged.

use tracing::{info, warn};

use super::EcosystemState;
use crate::generation::Biome;
use crate::error::PersistError;
use crate::monster::species::SpeciesCatalog;
use crate::storage::StateStore;

/// Store key for the ecosystem document
pub const ECOSYSTEM_KEY: &str = "dungeonEcosystem";

impl EcosystemState {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and clamp into documented ranges
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let mut state: EcosystemState = serde_json::from_str(json)?;
        state.sanitize();
        Ok(state)
    }

    /// Every catalog species and every biome must have an entry. Event
    /// flags may be absent; they read as unset.
    pub fn ensure_complete(&self, catalog: &SpeciesCatalog) -> Result<(), PersistError> {
        if let Some(species) = catalog
            .all()
            .iter()
            .map(|s| s.key())
            .find(|key| !self.monster_population.contains_key(key))
        {
            return Err(PersistError::MissingEntry(species));
        }
        if let Some(biome) = Biome::ALL
            .iter()
            .find(|b| !self.environment_state.contains_key(b.key()))
        {
            return Err(PersistError::MissingEntry(biome.key().to_string()));
        }
        Ok(())
    }
}

pub fn save_ecosystem(store: &mut dyn StateStore, state: &EcosystemState) -> Result<(), PersistError> {
    store.save(ECOSYSTEM_KEY, &state.to_json()?)
}

pub fn load_ecosystem(store: &dyn StateStore, catalog: &SpeciesCatalog) -> EcosystemState {
    let Some(raw) = store.load(ECOSYSTEM_KEY) else {
        info!("no saved ecosystem, starting fresh");
        return EcosystemState::initial(catalog);
    };
    let loaded = EcosystemState::from_json(&raw)
        .and_then(|state| state.ensure_complete(catalog).map(|()| state));
    match loaded {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "corrupt ecosystem state discarded");
            EcosystemState::initial(catalog)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::{Ecosystem, EnvironmentState};
    use crate::storage::MemoryStore;

    #[test]
    fn test_json_shape() {
        let catalog = SpeciesCatalog::default();
        let state = EcosystemState::initial(&catalog);
        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        assert_eq!(value["monsterPopulation"]["poisonSlime"], 100);
        assert_eq!(value["environmentState"]["volcano"]["type"], "volcano");
        assert_eq!(value["environmentState"]["cave"]["magicalEnergy"], 0.5);
        assert!(value["environmentState"]["ice"]["pollutionLevel"].is_number());
        assert_eq!(value["eventFlags"]["archlichAwakened"], false);
    }

    /// Initial state as JSON with the given edit applied
    fn edited_initial(catalog: &SpeciesCatalog, edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let state = EcosystemState::initial(catalog);
        let mut value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        edit(&mut value);
        value.to_string()
    }

    #[test]
    fn test_pollution_is_optional_on_load() {
        let catalog = SpeciesCatalog::default();
        let json = edited_initial(&catalog, |value| {
            value["monsterPopulation"]["goblin"] = 12.into();
            value["eventFlags"]["goblinKingEnraged"] = true.into();
            for env in value["environmentState"].as_object_mut().unwrap().values_mut() {
                env.as_object_mut().unwrap().remove("pollutionLevel");
            }
            value["environmentState"]["forest"]["temperature"] = 99.0.into();
        });
        let mut store = MemoryStore::new();
        store.save(ECOSYSTEM_KEY, &json).unwrap();

        let state = load_ecosystem(&store, &catalog);
        assert_eq!(state.population("goblin"), 12);
        let forest = &state.environment_state["forest"];
        assert_eq!(forest.pollution_level, 0.0);
        assert_eq!(forest.temperature, 50.0, "clamped on load");
        assert_eq!(forest.humidity, EnvironmentState::initial(Biome::Forest).humidity);
        assert!(state.flag("goblinKingEnraged"));
    }

    #[test]
    fn test_partial_document_is_treated_as_corrupt() {
        let catalog = SpeciesCatalog::default();
        let initial = EcosystemState::initial(&catalog);
        let mut store = MemoryStore::new();

        store
            .save(ECOSYSTEM_KEY, r#"{"monsterPopulation": {}, "environmentState": {}, "eventFlags": {}}"#)
            .unwrap();
        let loaded = load_ecosystem(&store, &catalog);
        assert_eq!(loaded, initial);
        let mut eco = Ecosystem::new(loaded, Biome::Forest);
        assert!(eco.check_dungeon_events().is_empty(), "no flags flip on a fresh state");

        let no_goblins = edited_initial(&catalog, |value| {
            value["monsterPopulation"].as_object_mut().unwrap().remove("goblin");
        });
        store.save(ECOSYSTEM_KEY, &no_goblins).unwrap();
        assert_eq!(load_ecosystem(&store, &catalog), initial);

        let no_ice = edited_initial(&catalog, |value| {
            value["environmentState"].as_object_mut().unwrap().remove("ice");
        });
        assert!(matches!(
            EcosystemState::from_json(&no_ice).unwrap().ensure_complete(&catalog),
            Err(PersistError::MissingEntry(key)) if key == "ice"
        ));
        store.save(ECOSYSTEM_KEY, &no_ice).unwrap();
        assert_eq!(load_ecosystem(&store, &catalog), initial);
    }

    #[test]
    fn test_missing_event_flags_read_as_unset() {
        let catalog = SpeciesCatalog::default();
        let json = edited_initial(&catalog, |value| {
            value["eventFlags"] = serde_json::json!({});
            value["monsterPopulation"]["goblin"] = 30.into();
        });
        let mut store = MemoryStore::new();
        store.save(ECOSYSTEM_KEY, &json).unwrap();
        let state = load_ecosystem(&store, &catalog);
        assert_eq!(state.population("goblin"), 30);
        assert!(!state.flag("goblinKingEnraged"));
    }

    #[test]
    fn test_store_roundtrip_and_corrupt_fallback() {
        let catalog = SpeciesCatalog::default();
        let mut store = MemoryStore::new();
        assert_eq!(load_ecosystem(&store, &catalog), EcosystemState::initial(&catalog));

        let mut state = EcosystemState::initial(&catalog);
        state.monster_population.insert("goblin".into(), 7);
        save_ecosystem(&mut store, &state).unwrap();
        assert_eq!(load_ecosystem(&store, &catalog), state);

        store.save(ECOSYSTEM_KEY, "{\"monsterPopulation\": {\"goblin\": -4}}").unwrap();
        assert_eq!(load_ecosystem(&store, &catalog), EcosystemState::initial(&catalog));

        store.save(ECOSYSTEM_KEY, "not json").unwrap();
        assert_eq!(load_ecosystem(&store, &catalog), EcosystemState::initial(&catalog));
    }
}
