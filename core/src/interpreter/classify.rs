//! Action kind classification

use std::fmt;

/// Actions that cost resources but are not modelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnmodelledAction {
    /// Scenario-editor spawn
    Create,
    /// Resource gift to another player
    Tribute,
}

impl UnmodelledAction {
    pub fn tag(self) -> &'static str {
        match self {
            UnmodelledAction::Create => "CREATE",
            UnmodelledAction::Tribute => "TRIBUTE",
        }
    }
}

/// Action tags known to have no resource effect
pub const IGNORED_ACTIONS: &[&str] = &[
    "AI_ORDER",
    "ATTACK_GROUND",
    "BACK_TO_WORK",
    "DELETE",
    "DE_ATTACK_MOVE",
    "DE_AUTOSCOUT",
    "DE_UNKNOWN_196",
    "DE_UNKNOWN_39",
    "DE_UNKNOWN_41",
    "FLARE",
    "FORMATION",
    "GAME",
    "GATE",
    "GATHER_POINT",
    "GUARD",
    "MAKE",
    "MOVE",
    "ORDER",
    "PATROL",
    "REPAIR",
    "RESIGN",
    "SPECIAL",
    "STANCE",
    "STOP",
    "TOWN_BELL",
    "UNGARRISON",
    "WALL",
    "WORK",
];

/// Closed set of action kinds the interpreter dispatches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Build,
    Queue,
    DeQueue,
    Research,
    Buy,
    Sell,
    Unmodelled(UnmodelledAction),
    Ignored(&'static str),
    /// Tag this crate has never seen
    Unclassified(String),
}

impl ActionKind {
    /// Whether actions of this kind can produce a ledger record
    pub fn is_costed(&self) -> bool {
        matches!(
            self,
            ActionKind::Build
                | ActionKind::Queue
                | ActionKind::DeQueue
                | ActionKind::Research
                | ActionKind::Buy
                | ActionKind::Sell
        )
    }

    /// Canonical action tag
    pub fn tag(&self) -> &str {
        match self {
            ActionKind::Build => "BUILD",
            ActionKind::Queue => "QUEUE",
            ActionKind::DeQueue => "DE_QUEUE",
            ActionKind::Research => "RESEARCH",
            ActionKind::Buy => "BUY",
            ActionKind::Sell => "SELL",
            ActionKind::Unmodelled(action) => action.tag(),
            ActionKind::Ignored(tag) => *tag,
            ActionKind::Unclassified(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classify a raw action tag
///
/// Tags are matched after trimming and upper-casing; anything unknown is
/// [`ActionKind::Unclassified`] with the tag as found.
pub fn classify(tag: &str) -> ActionKind {
    let normalized = tag.trim().to_ascii_uppercase();
    match normalized.as_str() {
        "BUILD" => ActionKind::Build,
        "QUEUE" => ActionKind::Queue,
        "DE_QUEUE" => ActionKind::DeQueue,
        "RESEARCH" => ActionKind::Research,
        "BUY" => ActionKind::Buy,
        "SELL" => ActionKind::Sell,
        "CREATE" => ActionKind::Unmodelled(UnmodelledAction::Create),
        "TRIBUTE" => ActionKind::Unmodelled(UnmodelledAction::Tribute),
        other => match IGNORED_ACTIONS.iter().copied().find(|known| *known == other) {
            Some(known) => ActionKind::Ignored(known),
            None => ActionKind::Unclassified(tag.to_string()),
        },
    }
}
