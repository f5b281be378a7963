//! Per-player and per-team spending summaries

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{BUILD_ACTION, ExpenseLedger, MARKET_ACTIONS, QUEUE_ACTIONS, RESEARCH_ACTION};
use crate::economy::{MarketPrices, MarketRates, ResourceVector};
use crate::replay::{PlayerId, Timestamp, format_game_time};
use crate::roster::{Roster, UNALIGNED_TEAM};

/// Research names ending with this are age advancements
const AGE_SUFFIX: &str = "Age";

/// When a player reached an age
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeUp {
    pub name: String,
    pub timestamp: Timestamp,
    /// `h:mm:ss`
    pub time: String,
}

/// Spending of one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub player: PlayerId,
    pub name: String,
    pub team: u8,
    /// Building, production and research costs
    pub spent: ResourceVector,
    /// Net market flow (negative: given away)
    pub traded: ResourceVector,
    /// Gold-equivalent of every record, at the prices of the moment
    pub unified: f64,
    /// Production actions (a batch of five counts once)
    pub queue_actions: u32,
    pub buildings_placed: u32,
    pub researches: u32,
    pub market_actions: u32,
    /// Age advancements, in research order
    pub ages: Vec<AgeUp>,
}

impl PlayerSummary {
    fn new(player: PlayerId, name: String, team: u8) -> Self {
        Self {
            player,
            name,
            team,
            spent: ResourceVector::zero(),
            traded: ResourceVector::zero(),
            unified: 0.0,
            queue_actions: 0,
            buildings_placed: 0,
            researches: 0,
            market_actions: 0,
            ages: Vec::new(),
        }
    }
}

/// Spending of a team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team: u8,
    pub players: Vec<PlayerId>,
    pub spent: ResourceVector,
    pub unified: f64,
}

/// Spending summary of one replay
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    /// Rate table the unified figures were computed with
    pub market_version: String,
    /// Time of the last record
    pub last_record: Timestamp,
    pub players: Vec<PlayerSummary>,
    /// Aligned teams only; players on the unaligned team are listed alone
    pub teams: Vec<TeamSummary>,
}

impl Summary {
    /// Summarize a ledger
    ///
    /// Records without a price snapshot are valued at the rate table's
    /// starting prices.
    pub fn from_ledger(ledger: &ExpenseLedger, roster: &Roster, rates: &MarketRates) -> Self {
        let mut players: BTreeMap<PlayerId, PlayerSummary> = roster
            .iter()
            .map(|p| (p.number, PlayerSummary::new(p.number, p.name.clone(), p.team)))
            .collect();

        for record in ledger {
            let summary = players.entry(record.player).or_insert_with(|| {
                PlayerSummary::new(
                    record.player,
                    roster.display_name(record.player),
                    UNALIGNED_TEAM,
                )
            });

            let prices: MarketPrices = record.prices.unwrap_or(rates.initial_prices);
            summary.unified += prices.gold_equivalent(&record.delta, rates.lot_size);

            let action = record.action.as_str();
            if action == BUILD_ACTION {
                summary.buildings_placed += 1;
            } else if QUEUE_ACTIONS.contains(&action) {
                summary.queue_actions += 1;
            } else if action == RESEARCH_ACTION {
                summary.researches += 1;
                if record.name.ends_with(AGE_SUFFIX) {
                    summary.ages.push(AgeUp {
                        name: record.name.clone(),
                        timestamp: record.timestamp,
                        time: format_game_time(record.timestamp),
                    });
                }
            }

            if MARKET_ACTIONS.contains(&action) {
                summary.traded += record.delta;
                summary.market_actions += 1;
            } else {
                summary.spent += record.delta;
            }
        }

        let teams = roster
            .teams()
            .into_iter()
            .filter(|(team, _)| *team != UNALIGNED_TEAM)
            .map(|(team, members)| {
                let mut total = TeamSummary {
                    team,
                    players: members.clone(),
                    spent: ResourceVector::zero(),
                    unified: 0.0,
                };
                for member in &members {
                    if let Some(p) = players.get(member) {
                        total.spent += p.spent;
                        total.unified += p.unified;
                    }
                }
                total
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            market_version: rates.version.clone(),
            last_record: ledger.last().map(|r| r.timestamp).unwrap_or(0),
            players: players.into_values().collect(),
            teams,
        }
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerSummary> {
        self.players.iter().find(|p| p.player == player)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::record;
    use crate::roster::{PlayerInfo, PlayerKind};

    fn roster() -> Roster {
        let player = |number: PlayerId, name: &str, team: u8| PlayerInfo {
            number,
            name: Some(name.to_string()),
            ai_type: None,
            ai_name: None,
            kind: PlayerKind::Human,
            civ_id: 0,
            color_id: number,
            resolved_team_id: team,
        };
        Roster::from_players(
            &[player(1, "Alice", 2), player(2, "Bob", 3), player(3, "Carol", 2)],
            false,
        )
        .unwrap()
    }

    fn ledger() -> ExpenseLedger {
        vec![
            record(10, "DE_QUEUE", 1, 83, ResourceVector::new(0.0, 50.0, 0.0, 0.0), "Villager"),
            record(20, "QUEUE", 1, 83, ResourceVector::new(0.0, 150.0, 0.0, 0.0), "Villager"),
            record(30, "BUILD", 2, 70, ResourceVector::new(25.0, 0.0, 0.0, 0.0), "House"),
            record(40, "SELL", 3, 0, ResourceVector::new(0.0, -100.0, 70.0, 0.0), "sell food"),
            record(
                671_208,
                "RESEARCH",
                1,
                101,
                ResourceVector::new(0.0, 500.0, 0.0, 0.0),
                "Feudal Age",
            ),
            record(700_000, "RESEARCH", 1, 22, ResourceVector::new(0.0, 50.0, 0.0, 0.0), "Loom"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_player_totals() {
        let summary = Summary::from_ledger(&ledger(), &roster(), &MarketRates::default());

        let alice = summary.player(1).unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.spent, ResourceVector::new(0.0, 750.0, 0.0, 0.0));
        assert_eq!(alice.queue_actions, 2);
        assert_eq!(alice.researches, 2);
        assert_eq!(alice.unified, 750.0);

        let bob = summary.player(2).unwrap();
        assert_eq!(bob.buildings_placed, 1);
        assert_eq!(bob.spent.wood, 25.0);
    }

    #[test]
    fn test_market_records_count_as_trades() {
        let summary = Summary::from_ledger(&ledger(), &roster(), &MarketRates::default());
        let carol = summary.player(3).unwrap();

        assert_eq!(carol.market_actions, 1);
        assert_eq!(carol.spent, ResourceVector::zero());
        assert_eq!(carol.traded, ResourceVector::new(0.0, -100.0, 70.0, 0.0));
        // -100 food at 100 + 70 gold
        assert_eq!(carol.unified, -30.0);
    }

    #[test]
    fn test_age_times() {
        let summary = Summary::from_ledger(&ledger(), &roster(), &MarketRates::default());
        let ages = &summary.player(1).unwrap().ages;
        assert_eq!(ages.len(), 1);
        assert_eq!(ages[0].name, "Feudal Age");
        assert_eq!(ages[0].time, "0:11:11");
    }

    #[test]
    fn test_team_totals_skip_unaligned() {
        let summary = Summary::from_ledger(&ledger(), &roster(), &MarketRates::default());

        assert_eq!(summary.teams.len(), 2);
        let team2 = summary.teams.iter().find(|t| t.team == 2).unwrap();
        assert_eq!(team2.players, vec![1, 3]);
        assert_eq!(team2.spent.food, 750.0);
        assert_eq!(summary.last_record, 700_000);
    }

    #[test]
    fn test_unknown_player_is_still_summarized() {
        let ledger: ExpenseLedger = vec![record(
            5,
            "BUILD",
            7,
            70,
            ResourceVector::new(25.0, 0.0, 0.0, 0.0),
            "House",
        )]
        .into_iter()
        .collect();
        let summary = Summary::from_ledger(&ledger, &Roster::default(), &MarketRates::default());

        let player = summary.player(7).unwrap();
        assert_eq!(player.name, "P7");
        assert_eq!(player.team, UNALIGNED_TEAM);
    }

    #[test]
    fn test_price_snapshot_used_for_unified() {
        let mut stone = record(
            5,
            "BUILD",
            1,
            117,
            ResourceVector::new(0.0, 0.0, 0.0, 100.0),
            "Stone Wall",
        );
        stone.prices = Some(MarketPrices {
            stone: 200.0,
            ..MarketPrices::default()
        });
        let ledger: ExpenseLedger = vec![stone].into_iter().collect();
        let summary = Summary::from_ledger(&ledger, &roster(), &MarketRates::default());
        assert_eq!(summary.player(1).unwrap().unified, 200.0);
    }

    #[test]
    fn test_summary_json() {
        let summary = Summary::from_ledger(&ledger(), &roster(), &MarketRates::default());
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"market_version\": \"de\""));
        assert!(json.contains("\"Feudal Age\""));
    }
}
