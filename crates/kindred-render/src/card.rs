//! Card pieces shared by the tree and mindmap views.

use kindred_core::{spouse_role, PersonCard};
use kindred_graph::SpouseLink;
use serde::{Deserialize, Serialize};

/// A spouse card shown beside a main card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpouseCard {
    pub card: PersonCard,
    /// "Husband" or "Wife".
    pub role: String,
    pub note: Option<String>,
}

impl From<&SpouseLink> for SpouseCard {
    fn from(link: &SpouseLink) -> Self {
        Self {
            card: PersonCard::from_person(&link.person),
            role: spouse_role(link.person.gender).to_string(),
            note: link.note.clone(),
        }
    }
}

/// One-line text form of a card: `Name (life span) [badges]`.
pub fn card_label(card: &PersonCard) -> String {
    let mut label = format!("{} ({})", card.name, card.life_span);
    for badge in &card.badges {
        label.push_str(&format!(" [{}]", badge));
    }
    label
}

/// Spouse text: `Name (life span) (Wife, note)`.
pub fn spouse_label(spouse: &SpouseCard) -> String {
    match &spouse.note {
        Some(note) if !note.is_empty() => {
            format!("{} ({}, {})", card_label(&spouse.card), spouse.role, note)
        }
        _ => format!("{} ({})", card_label(&spouse.card), spouse.role),
    }
}
