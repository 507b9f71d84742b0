use std::collections::HashMap;

use puzzle_core::{LevelProgress, PlayerRecord};
use web_sys::{Storage, Window};

const STORAGE_KEY: &str = "puzzle_db";

/// Player levels persisted as a JSON array in `localStorage`.
/// Works in memory when storage is unavailable (private mode, disabled cookies).
pub struct LocalStorageProgress {
    storage: Option<Storage>,
    players: HashMap<String, PlayerRecord>,
}

impl LocalStorageProgress {
    pub fn open(window: &Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        let players = storage
            .as_ref()
            .and_then(|s| s.get_item(STORAGE_KEY).ok().flatten())
            .map(|text| parse_records(&text))
            .unwrap_or_default();
        LocalStorageProgress { storage, players }
    }

    fn save(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let mut records: Vec<&PlayerRecord> = self.players.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        match serde_json::to_string(&records) {
            Ok(text) => {
                if storage.set_item(STORAGE_KEY, &text).is_err() {
                    log::warn!("could not write player progress");
                }
            }
            Err(e) => log::warn!("could not encode player progress: {e}"),
        }
    }

    fn entry(&mut self, player: &str) -> &mut PlayerRecord {
        self.players
            .entry(player.to_string())
            .or_insert_with(|| PlayerRecord::new(player))
    }
}

fn parse_records(text: &str) -> HashMap<String, PlayerRecord> {
    match serde_json::from_str::<Vec<PlayerRecord>>(text) {
        Ok(list) => list.into_iter().map(|r| (r.id.clone(), r)).collect(),
        Err(e) => {
            log::warn!("discarding unreadable player progress: {e}");
            HashMap::new()
        }
    }
}

impl LevelProgress for LocalStorageProgress {
    fn login(&mut self, player: &str) -> PlayerRecord {
        let rec = self.entry(player).clone();
        self.save();
        rec
    }

    fn current_level(&self, player: &str) -> u32 {
        self.players.get(player).map_or(1, |r| r.current_level)
    }

    fn advance_level(&mut self, player: &str) {
        self.entry(player).current_level += 1;
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_parse_by_id_and_garbage_is_dropped() {
        let map = parse_records(r#"[{"id":"a","currentLevel":3},{"id":"b","currentLevel":1}]"#);
        assert_eq!(map["a"].current_level, 3);
        assert_eq!(map.len(), 2);
        assert!(parse_records("not json").is_empty());
    }
}
