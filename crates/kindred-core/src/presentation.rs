//! Presentation rules shared by every view.
//!
//! Cards in the list, tree and mindmap all derive their color, badges and
//! date line from the same rules here so the views never disagree.

use crate::date::format_life_span;
use crate::model::{Gender, Person, PersonId};
use serde::{Deserialize, Serialize};

/// Avatar background fallback, one per gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarColor {
    Sky,
    Rose,
    Stone,
}

impl AvatarColor {
    pub fn for_gender(gender: Gender) -> Self {
        match gender {
            Gender::Male => AvatarColor::Sky,
            Gender::Female => AvatarColor::Rose,
            Gender::Other => AvatarColor::Stone,
        }
    }

    /// Hex value used by HTML-capable clients.
    pub fn hex(&self) -> &'static str {
        match self {
            AvatarColor::Sky => "#0369a1",
            AvatarColor::Rose => "#be123c",
            AvatarColor::Stone => "#78716c",
        }
    }
}

pub const DECEASED_BADGE: &str = "Deceased";

/// Label of the in-law badge.
pub fn in_law_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "Son-in-law",
        Gender::Female => "Daughter-in-law",
        Gender::Other => "In-law",
    }
}

/// Role of a spouse shown next to the main person.
pub fn spouse_role(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "Husband",
        _ => "Wife",
    }
}

/// Display model of one person, as used by every card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCard {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub color: AvatarColor,
    pub avatar_url: Option<String>,
    pub life_span: String,
    pub deceased: bool,
    /// Desaturate the card.
    pub muted: bool,
    pub badges: Vec<String>,
}

impl PersonCard {
    pub fn from_person(person: &Person) -> Self {
        let deceased = person.is_deceased();
        let mut badges = Vec::new();
        if deceased {
            badges.push(DECEASED_BADGE.to_string());
        }
        if person.is_in_law {
            badges.push(in_law_label(person.gender).to_string());
        }

        Self {
            id: person.id.clone(),
            name: person.full_name.clone(),
            gender: person.gender,
            color: AvatarColor::for_gender(person.gender),
            avatar_url: person.avatar_url.clone(),
            life_span: format_life_span(person),
            deceased,
            muted: deceased,
            badges,
        }
    }

    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }
}

impl From<&Person> for PersonCard {
    fn from(person: &Person) -> Self {
        Self::from_person(person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_per_gender() {
        assert_eq!(AvatarColor::for_gender(Gender::Male), AvatarColor::Sky);
        assert_eq!(AvatarColor::for_gender(Gender::Female), AvatarColor::Rose);
        assert_eq!(AvatarColor::for_gender(Gender::Other), AvatarColor::Stone);
    }

    #[test]
    fn test_deceased_flag_without_dates_keeps_badge() {
        let person = Person::new("p", "Pham Van A", Gender::Male).deceased();
        let card = PersonCard::from_person(&person);

        assert!(card.deceased);
        assert!(card.muted);
        assert!(card.has_badge(DECEASED_BADGE));
        assert_eq!(card.life_span, "Unknown - Unknown");
    }

    #[test]
    fn test_in_law_badge() {
        let person = Person::new("p", "Tran Thi B", Gender::Female).in_law();
        let card = PersonCard::from_person(&person);

        assert!(!card.deceased);
        assert_eq!(card.badges, vec!["Daughter-in-law".to_string()]);
    }
}
