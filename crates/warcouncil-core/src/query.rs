//! Query interpretation: intent classification and parameter extraction.
//!
//! [`analyze_query`] turns free text into a [`QueryAnalysis`]. It is a pure
//! function over the lower-cased query and never fails; a signal that is not
//! present in the text leaves its field as `None`.
//!
//! # Classification
//!
//! Intents are tested in the fixed order of [`INTENT_RULES`]:
//!
//! | Order | Intent | Example trigger |
//! |-------|--------|-----------------|
//! | 1 | `upgrade_priority` | "what should I upgrade" |
//! | 2 | `attack_strategy` | "best army to raid with" |
//! | 3 | `base_design` | "war base layout" |
//! | 4 | `resource_management` | "how to farm dark elixir" |
//!
//! The first rule with a matching keyword wins; no match yields `general`.
//! Upgrade and attack vocabularies overlap ("army", "troop"), so the order
//! is part of the behavior.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Matches a tier mention such as `T9`, `th9`, `tier 9`, `tier-9` or
/// `town hall 9`, capturing the number.
pub(crate) static TIER_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:th|t|tier[\s-]?|town\s?hall\s?)(\d{1,2})\b").expect("valid tier regex")
});

/// Intent discriminant, serialized as the snake_case intent name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    General,
    UpgradePriority,
    AttackStrategy,
    BaseDesign,
    ResourceManagement,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::General => "general",
            IntentKind::UpgradePriority => "upgrade_priority",
            IntentKind::AttackStrategy => "attack_strategy",
            IntentKind::BaseDesign => "base_design",
            IntentKind::ResourceManagement => "resource_management",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an attack or a base layout is optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    War,
    Farming,
    Trophy,
    Hybrid,
}

/// In-game currency a resource question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Gold,
    Elixir,
    DarkElixir,
    Gems,
}

/// What the player wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGoal {
    Save,
    Spend,
    Farm,
    Protect,
}

/// Classified intent with the parameters that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", content = "params", rename_all = "snake_case")]
pub enum Intent {
    General,
    UpgradePriority {
        #[serde(skip_serializing_if = "Option::is_none")]
        item_type: Option<String>,
    },
    AttackStrategy {
        #[serde(skip_serializing_if = "Option::is_none")]
        focus_unit: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        purpose: Option<Purpose>,
    },
    BaseDesign {
        #[serde(skip_serializing_if = "Option::is_none")]
        purpose: Option<Purpose>,
    },
    ResourceManagement {
        #[serde(skip_serializing_if = "Option::is_none")]
        resource: Option<Resource>,
        #[serde(skip_serializing_if = "Option::is_none")]
        goal: Option<ResourceGoal>,
    },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::General => IntentKind::General,
            Intent::UpgradePriority { .. } => IntentKind::UpgradePriority,
            Intent::AttackStrategy { .. } => IntentKind::AttackStrategy,
            Intent::BaseDesign { .. } => IntentKind::BaseDesign,
            Intent::ResourceManagement { .. } => IntentKind::ResourceManagement,
        }
    }

    /// Human-readable `(label, value)` pairs for the populated parameters.
    pub fn describe_params(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        match self {
            Intent::General => {}
            Intent::UpgradePriority { item_type } => {
                if let Some(t) = item_type {
                    out.push(("item type", t.clone()));
                }
            }
            Intent::AttackStrategy {
                focus_unit,
                purpose,
            } => {
                if let Some(u) = focus_unit {
                    out.push(("focus unit", u.clone()));
                }
                if let Some(p) = purpose {
                    out.push(("purpose", format!("{:?}", p).to_lowercase()));
                }
            }
            Intent::BaseDesign { purpose } => {
                if let Some(p) = purpose {
                    out.push(("purpose", format!("{:?}", p).to_lowercase()));
                }
            }
            Intent::ResourceManagement { resource, goal } => {
                if let Some(r) = resource {
                    let label = match r {
                        Resource::Gold => "gold",
                        Resource::Elixir => "elixir",
                        Resource::DarkElixir => "dark elixir",
                        Resource::Gems => "gems",
                    };
                    out.push(("resource", label.to_string()));
                }
                if let Some(g) = goal {
                    out.push(("goal", format!("{:?}", g).to_lowercase()));
                }
            }
        }
        out
    }
}

/// Result of interpreting one query. Transient, created per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    #[serde(flatten)]
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_level: Option<u32>,
}

impl QueryAnalysis {
    pub fn general(tier_level: Option<u32>) -> Self {
        Self {
            intent: Intent::General,
            tier_level,
        }
    }

    pub fn kind(&self) -> IntentKind {
        self.intent.kind()
    }
}

/// One row of the classification table.
pub struct IntentRule {
    pub kind: IntentKind,
    pub keywords: &'static [&'static str],
    pub extract: fn(&str) -> Intent,
}

impl IntentRule {
    pub fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| mentions(lower, k))
    }
}

/// True when `keyword` occurs in `lower` starting at a word boundary.
///
/// Suffixes are allowed ("walls", "farming") but a keyword buried inside
/// another word is not ("determine" does not mention "mine").
pub fn mentions(lower: &str, keyword: &str) -> bool {
    lower.match_indices(keyword).any(|(i, _)| {
        lower[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Ordered classification table. The first matching rule wins.
pub static INTENT_RULES: [IntentRule; 4] = [
    IntentRule {
        kind: IntentKind::UpgradePriority,
        keywords: &[
            "upgrade",
            "prioritize",
            "priority",
            "level up",
            "max out",
            "rush",
            "build next",
        ],
        extract: extract_upgrade,
    },
    IntentRule {
        kind: IntentKind::AttackStrategy,
        keywords: &[
            "attack",
            "raid",
            "army",
            "troop",
            "strategy",
            "3 star",
            "three star",
            "triple",
        ],
        extract: extract_attack,
    },
    IntentRule {
        kind: IntentKind::BaseDesign,
        keywords: &["base", "layout", "design", "defend against"],
        extract: extract_base,
    },
    IntentRule {
        kind: IntentKind::ResourceManagement,
        keywords: &[
            "resource",
            "gold",
            "elixir",
            "loot",
            "farm",
            "economy",
            "collector",
            "storage",
            "gems",
        ],
        extract: extract_resource,
    },
];

/// Upgrade item keywords mapped to the corpus `type` they target.
const ITEM_TYPES: &[(&str, &str)] = &[
    ("defense", "defense"),
    ("defence", "defense"),
    ("tower", "defense"),
    ("cannon", "defense"),
    ("mortar", "defense"),
    ("wall", "wall"),
    ("hero", "hero"),
    ("king", "hero"),
    ("queen", "hero"),
    ("warden", "hero"),
    ("spell", "spell"),
    ("troop", "troop"),
    ("army", "troop"),
    ("laboratory", "troop"),
    ("collector", "resource"),
    ("mine", "resource"),
    ("storage", "resource"),
];

/// Named units, scanned in this order. Longer names precede names they
/// contain so "electro dragon" is not reported as "dragon".
const FOCUS_UNITS: &[&str] = &[
    "electro dragon",
    "baby dragon",
    "dragon rider",
    "dragon",
    "hog rider",
    "root rider",
    "lava hound",
    "wall breaker",
    "balloon",
    "pekka",
    "golem",
    "giant",
    "wizard",
    "witch",
    "bowler",
    "miner",
    "valkyrie",
    "yeti",
    "healer",
    "minion",
    "goblin",
    "archer",
    "barbarian",
];

const PURPOSES: &[(&str, Purpose)] = &[
    ("clan war", Purpose::War),
    ("war base", Purpose::War),
    ("war attack", Purpose::War),
    ("cwl", Purpose::War),
    ("for war", Purpose::War),
    ("hybrid", Purpose::Hybrid),
    ("farm", Purpose::Farming),
    ("loot", Purpose::Farming),
    ("trophy", Purpose::Trophy),
    ("trophies", Purpose::Trophy),
    ("push", Purpose::Trophy),
];

const RESOURCES: &[(&str, Resource)] = &[
    ("dark elixir", Resource::DarkElixir),
    ("dark", Resource::DarkElixir),
    ("elixir", Resource::Elixir),
    ("gold", Resource::Gold),
    ("gem", Resource::Gems),
];

const GOALS: &[(&str, ResourceGoal)] = &[
    ("save", ResourceGoal::Save),
    ("spend", ResourceGoal::Spend),
    ("farm", ResourceGoal::Farm),
    ("protect", ResourceGoal::Protect),
    ("defend", ResourceGoal::Protect),
];

fn first_match<T: Copy>(lower: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(kw, _)| mentions(lower, kw))
        .map(|(_, v)| *v)
}

fn extract_upgrade(lower: &str) -> Intent {
    Intent::UpgradePriority {
        item_type: first_match(lower, ITEM_TYPES).map(str::to_string),
    }
}

fn extract_attack(lower: &str) -> Intent {
    Intent::AttackStrategy {
        focus_unit: FOCUS_UNITS
            .iter()
            .find(|u| mentions(lower, u))
            .map(|u| u.to_string()),
        purpose: first_match(lower, PURPOSES),
    }
}

fn extract_base(lower: &str) -> Intent {
    Intent::BaseDesign {
        purpose: first_match(lower, PURPOSES),
    }
}

fn extract_resource(lower: &str) -> Intent {
    Intent::ResourceManagement {
        resource: first_match(lower, RESOURCES),
        goal: first_match(lower, GOALS),
    }
}

/// Extract the first tier number mentioned in `text`, if any.
pub fn extract_tier(text: &str) -> Option<u32> {
    TIER_MENTION
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .find(|n| *n >= 1)
}

/// Classify `query` and extract its parameters.
pub fn analyze_query(query: &str) -> QueryAnalysis {
    let lower = query.to_lowercase();
    let tier_level = extract_tier(&lower);

    let intent = INTENT_RULES
        .iter()
        .find(|rule| rule.matches(&lower))
        .map(|rule| (rule.extract)(&lower))
        .unwrap_or(Intent::General);

    QueryAnalysis { intent, tier_level }
}
