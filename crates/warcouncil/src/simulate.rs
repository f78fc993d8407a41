//! Battle simulator lookups.
//!
//! A [`BattleScenario`] names the attacking troops and the defenses they
//! face. Each side is looked up through
//! [`RetrievalEngine::retrieve_for_entities`], then the combined list is
//! deduplicated by `(id, category)` before it becomes the simulator's
//! reference context.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use warcouncil_core::context::{assemble_context, RetrievalContext};
use warcouncil_core::engine::{dedup_ranked, RetrievalEngine};
use warcouncil_core::query::QueryAnalysis;

use crate::config::Config;

pub const TROOP_KIND: &str = "troop";
pub const DEFENSE_KIND: &str = "defense";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleScenario {
    #[serde(default)]
    pub attackers: Vec<String>,
    #[serde(default)]
    pub defenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleContext {
    pub scenario: BattleScenario,
    pub reference: RetrievalContext,
}

impl BattleContext {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Attackers: {}\n", join_or_none(&self.scenario.attackers)));
        out.push_str(&format!("Defenses: {}\n", join_or_none(&self.scenario.defenses)));
        out.push_str(&self.reference.render());
        out
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Look up reference documents for every entity in the scenario.
pub async fn build_battle_context(
    engine: &RetrievalEngine,
    scenario: &BattleScenario,
    max_excerpt_chars: usize,
) -> Result<BattleContext> {
    let mut documents = engine
        .retrieve_for_entities(&scenario.attackers, TROOP_KIND)
        .await?;
    documents.extend(
        engine
            .retrieve_for_entities(&scenario.defenses, DEFENSE_KIND)
            .await?,
    );
    let documents = dedup_ranked(documents);

    let analysis = QueryAnalysis::general(scenario.tier);
    Ok(BattleContext {
        scenario: scenario.clone(),
        reference: assemble_context(&documents, &analysis, max_excerpt_chars),
    })
}

/// `council simulate`: print the reference context for a battle.
pub async fn run_simulate(config: &Config, scenario: BattleScenario, json: bool) -> Result<()> {
    let engine = crate::open_engine(config).await?;
    let battle =
        build_battle_context(&engine, &scenario, config.retrieval.max_excerpt_chars).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&battle)?);
    } else {
        print!("{}", battle.render());
    }
    Ok(())
}
