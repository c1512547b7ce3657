//! Battle level queries over the metadata preamble.
//!
//! Everything in here is plain traversal of the parsed JSON documents of a
//! [`ReplayHead`]: the first document describes the arena setup, the
//! second (present once the battle has finished) its results. The shapes
//! are the client's own and change between patches, so every query is an
//! `Option` and absent or oddly shaped data is never an error.

use crate::replay::model::ReplayHead;
use crate::vehicles;
use serde::Serialize;
use serde_json::Value;
use time::macros::format_description;
use time::format_description::FormatItem;
use time::PrimitiveDateTime;

const BATTLE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]:[second]");

/// One player's entries across the two documents: the arena setup entry
/// keyed by avatar id, and the per vehicle result list once the battle has
/// finished.
#[derive(Debug, Clone)]
pub struct PlayerRecord<'a> {
    /// The avatar id the client assigned for this battle.
    pub avatar_id: String,
    /// The setup document's `vehicles` entry.
    pub info: Option<&'a Value>,
    /// The results document's entry: a list of per vehicle results.
    pub battle_info: Option<&'a Value>,
}

/// A per player aggregate of the results document, in the shape a
/// scoreboard wants it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerSummary {
    /// The avatar id the client assigned for this battle.
    pub avatar_id: String,
    /// Display name.
    pub name: Option<String>,
    /// The account behind the avatar.
    pub account_id: Option<i64>,
    /// Whether the player survived the battle.
    pub is_alive: Option<bool>,
    /// Whether the recording player's team won; `None` for a draw or an
    /// unfinished battle.
    pub win: Option<bool>,
    /// Short names of the vehicles fielded, deduplicated in battle order.
    pub vehicles: Vec<String>,
    /// Total kills.
    pub frags: i64,
    /// Total shots fired.
    pub shots: i64,
    /// Total direct hits.
    pub hits: i64,
    /// Direct hits that penetrated.
    pub hits_damaged: i64,
    /// Total damage dealt.
    pub damage: i64,
    /// Damage assisted by spotting, tracking, stun, smoke and inspire.
    pub assist: i64,
    /// Damage blocked by armour.
    pub blocked: i64,
}

impl ReplayHead {
    /// The display name of the map the battle ran on.
    pub fn map_display_name(&self) -> Option<&str> {
        self.string_field("mapDisplayName")
    }

    /// The recording player's display name.
    pub fn player_name(&self) -> Option<&str> {
        self.string_field("playerName")
    }

    /// The recording player's account id.
    pub fn player_id(&self) -> Option<i64> {
        self.documents
            .iter()
            .find_map(|doc| doc.get("playerID").and_then(Value::as_i64))
    }

    /// The team the recording player fought on, from the vehicle roster
    /// entry whose name matches the player name.
    pub fn player_team(&self) -> Option<i64> {
        let player_name = self.player_name()?;
        for vehicles in self.rosters() {
            for info in vehicles.values() {
                if info.get("name").and_then(Value::as_str) == Some(player_name) {
                    return info.get("team").and_then(Value::as_i64);
                }
            }
        }
        None
    }

    /// The battle start as a unix timestamp. The document stores a naive
    /// `dd.mm.yyyy hh:mm:ss` local time; it is interpreted as UTC here.
    pub fn battle_timestamp(&self) -> Option<i64> {
        let text = self.string_field("dateTime")?;
        let parsed = PrimitiveDateTime::parse(text, BATTLE_TIME_FORMAT).ok()?;
        Some(parsed.assume_utc().unix_timestamp())
    }

    /// Whether the recording player's team won. `None` when the battle has
    /// no results yet or no winner was recorded.
    pub fn is_player_win(&self) -> Option<bool> {
        let team = self.player_team().filter(|team| *team != 0)?;
        for result in self.battle_results() {
            if let Some(winner) = result
                .get("common")
                .and_then(|common| common.get("winnerTeam"))
                .and_then(Value::as_i64)
            {
                return Some(winner == team);
            }
        }
        None
    }

    /// Both documents' entries for the recording player. `None` when the
    /// preamble does not identify the player.
    pub fn player_info(&self) -> Option<PlayerRecord<'_>> {
        self.player_id()?;
        let player_name = self.player_name()?;
        let avatar_id = self.rosters().find_map(|vehicles| {
            vehicles.iter().find_map(|(avatar_id, info)| {
                if info.get("name").and_then(Value::as_str) == Some(player_name) {
                    Some(avatar_id.clone())
                } else {
                    None
                }
            })
        })?;
        Some(self.player_info_by_avatar(&avatar_id))
    }

    /// Both documents' entries for an arbitrary avatar id.
    pub fn player_info_by_avatar(&self, avatar_id: &str) -> PlayerRecord<'_> {
        let info = self
            .rosters()
            .find_map(|vehicles| vehicles.get(avatar_id));
        let battle_info = self
            .battle_results()
            .find_map(|result| result.get("vehicles").and_then(|v| v.get(avatar_id)));
        PlayerRecord {
            avatar_id: avatar_id.to_string(),
            info,
            battle_info,
        }
    }

    /// Every player on the recording player's team, the player included.
    pub fn team_roster(&self) -> Vec<PlayerRecord<'_>> {
        self.roster_by_side(true)
    }

    /// Every player on the opposing team.
    pub fn enemy_roster(&self) -> Vec<PlayerRecord<'_>> {
        self.roster_by_side(false)
    }

    /// Scoreboard style aggregation of the recording player's team.
    /// Vehicle names come from the [`crate::vehicles`] catalog when one is
    /// installed, with the setup document's `vehicleType` as fallback.
    pub fn team_summary(&self) -> Vec<PlayerSummary> {
        let win = self.is_player_win();
        self.team_roster()
            .into_iter()
            .map(|record| summarize(record, win))
            .collect()
    }

    fn roster_by_side(&self, own_side: bool) -> Vec<PlayerRecord<'_>> {
        let team = match self.player_team() {
            Some(team) if team != 0 => team,
            _ => return Vec::new(),
        };
        let mut records = Vec::new();
        for vehicles in self.rosters() {
            for (avatar_id, info) in vehicles {
                if let Some(vehicle_team) = info.get("team").and_then(Value::as_i64) {
                    if (vehicle_team == team) == own_side {
                        records.push(self.player_info_by_avatar(avatar_id));
                    }
                }
            }
        }
        records
    }

    fn string_field(&self, name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find_map(|doc| doc.get(name).and_then(Value::as_str))
    }

    /// The `vehicles` rosters of the object shaped documents.
    fn rosters(&self) -> impl Iterator<Item = &serde_json::Map<String, Value>> {
        self.documents
            .iter()
            .filter_map(|doc| doc.get("vehicles").and_then(Value::as_object))
    }

    /// The entries of the array shaped results document.
    fn battle_results(&self) -> impl Iterator<Item = &Value> {
        self.documents
            .iter()
            .filter_map(Value::as_array)
            .flatten()
    }
}

fn summarize(record: PlayerRecord<'_>, win: Option<bool>) -> PlayerSummary {
    let mut summary = PlayerSummary {
        avatar_id: record.avatar_id.clone(),
        win,
        ..PlayerSummary::default()
    };

    let mut reserve_name = "Unknown";
    if let Some(info) = record.info {
        summary.name = info.get("name").and_then(Value::as_str).map(str::to_string);
        summary.is_alive = info.get("isAlive").and_then(flag);
        if let Some(vehicle_type) = info.get("vehicleType").and_then(Value::as_str) {
            reserve_name = vehicle_type;
        }
    }

    if let Some(results) = record.battle_info.and_then(Value::as_array) {
        for tank_result in results {
            if let Some(descr) = tank_result.get("typeCompDescr").and_then(Value::as_i64) {
                let name =
                    vehicles::short_name(descr).unwrap_or_else(|| reserve_name.to_string());
                if !summary.vehicles.contains(&name) {
                    summary.vehicles.push(name);
                }
            }
            if summary.account_id.is_none() {
                summary.account_id = tank_result.get("accountDBID").and_then(Value::as_i64);
            }
            summary.frags += int_field(tank_result, "kills");
            summary.shots += int_field(tank_result, "shots");
            summary.hits += int_field(tank_result, "directHits");
            summary.hits_damaged += int_field(tank_result, "piercingEnemyHits");
            summary.damage += int_field(tank_result, "damageDealt");
            summary.assist += int_field(tank_result, "damageAssistedRadio");
            summary.assist += int_field(tank_result, "damageAssistedStun");
            summary.assist += int_field(tank_result, "damageAssistedTrack");
            summary.assist += int_field(tank_result, "damageAssistedSmoke");
            summary.assist += int_field(tank_result, "damageAssistedInspire");
            if let Some(blocked) = tank_result.get("damageBlockedByArmor").and_then(Value::as_i64)
            {
                summary.blocked = blocked;
            }
        }
    }

    summary
}

fn int_field(value: &Value, name: &str) -> i64 {
    value.get(name).and_then(Value::as_i64).unwrap_or(0)
}

/// The results document records flags as 0/1 about as often as booleans.
fn flag(value: &Value) -> Option<bool> {
    value
        .as_bool()
        .or_else(|| value.as_i64().map(|flag| flag != 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn sample_head() -> ReplayHead {
        let setup = serde_json::from_str(indoc! {r#"
            {
                "playerName": "bob",
                "playerID": 9001,
                "mapDisplayName": "Prokhorovka",
                "dateTime": "29.10.2021 09:54:32",
                "vehicles": {
                    "101": {"name": "bob", "team": 1, "isAlive": 1, "vehicleType": "ussr:IS-3"},
                    "102": {"name": "eve", "team": 1, "isAlive": 0, "vehicleType": "ussr:T-34"},
                    "201": {"name": "mallory", "team": 2, "isAlive": 1, "vehicleType": "germany:Tiger"}
                }
            }
        "#})
        .unwrap();
        let results = serde_json::from_str(indoc! {r#"
            [
                {
                    "common": {"winnerTeam": 1},
                    "vehicles": {
                        "101": [{
                            "typeCompDescr": 7169,
                            "accountDBID": 9001,
                            "kills": 3,
                            "shots": 10,
                            "directHits": 7,
                            "piercingEnemyHits": 5,
                            "damageDealt": 1500,
                            "damageAssistedRadio": 200,
                            "damageAssistedTrack": 50,
                            "damageBlockedByArmor": 800
                        }],
                        "102": [{
                            "typeCompDescr": 513,
                            "kills": 0,
                            "shots": 4,
                            "directHits": 2,
                            "damageDealt": 300
                        }],
                        "201": [{"typeCompDescr": 777, "kills": 1}]
                    }
                }
            ]
        "#})
        .unwrap();
        ReplayHead {
            documents: vec![setup, results],
            skipped_documents: 0,
        }
    }

    #[test]
    fn test_basic_queries() {
        let head = sample_head();
        assert_eq!(head.map_display_name(), Some("Prokhorovka"));
        assert_eq!(head.player_name(), Some("bob"));
        assert_eq!(head.player_id(), Some(9001));
        assert_eq!(head.player_team(), Some(1));
        assert_eq!(head.is_player_win(), Some(true));
        assert_eq!(head.battle_timestamp(), Some(1_635_501_272));
    }

    #[test]
    fn test_no_results_document() {
        let mut head = sample_head();
        head.documents.truncate(1);
        assert!(!head.is_full_match());
        assert_eq!(head.is_player_win(), None);
        assert_eq!(head.player_team(), Some(1));
    }

    #[test]
    fn test_player_info() {
        let head = sample_head();
        let record = head.player_info().unwrap();
        assert_eq!(record.avatar_id, "101");
        assert_eq!(record.info.unwrap()["vehicleType"], "ussr:IS-3");
        assert_eq!(record.battle_info.unwrap()[0]["kills"], 3);
    }

    #[test]
    fn test_rosters() {
        let head = sample_head();
        let team: Vec<_> = head.team_roster().into_iter().map(|r| r.avatar_id).collect();
        let enemy: Vec<_> = head
            .enemy_roster()
            .into_iter()
            .map(|r| r.avatar_id)
            .collect();
        assert_eq!(team, ["101", "102"]);
        assert_eq!(enemy, ["201"]);
    }

    #[test]
    fn test_team_summary() {
        let mut catalog = std::collections::HashMap::new();
        catalog.insert(7169, "IS-3".to_string());
        crate::vehicles::install(catalog);

        let head = sample_head();
        let summary = head.team_summary();
        assert_eq!(summary.len(), 2);

        let bob = &summary[0];
        assert_eq!(bob.name.as_deref(), Some("bob"));
        assert_eq!(bob.account_id, Some(9001));
        assert_eq!(bob.is_alive, Some(true));
        assert_eq!(bob.win, Some(true));
        assert_eq!(bob.vehicles, ["IS-3"]);
        assert_eq!(bob.frags, 3);
        assert_eq!(bob.shots, 10);
        assert_eq!(bob.hits, 7);
        assert_eq!(bob.hits_damaged, 5);
        assert_eq!(bob.damage, 1500);
        assert_eq!(bob.assist, 250);
        assert_eq!(bob.blocked, 800);

        // 513 is not in the catalog; the setup document's type is the
        // fallback name
        let eve = &summary[1];
        assert_eq!(eve.name.as_deref(), Some("eve"));
        assert_eq!(eve.is_alive, Some(false));
        assert_eq!(eve.vehicles, ["ussr:T-34"]);
        assert_eq!(eve.damage, 300);
    }
}
