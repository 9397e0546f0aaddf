//! Member detail panel.
//!
//! Public fields are shown to everyone. The contact block is filled only
//! for admins; everyone else gets a notice in its place.

use crate::card::{card_label, spouse_label, SpouseCard};
use kindred_core::{
    FamilyDataset, PersonCard, PersonId, PrivateDetails, RelationshipKind, Viewer,
};
use kindred_graph::{FamilyGraph, GraphError, SpouseLink};
use serde::{Deserialize, Serialize};

pub const NO_NOTE: &str = "No notes.";
pub const PRIVATE_NOTICE: &str = "Contact details are visible to administrators only.";
/// Shown for an empty private field.
pub const BLANK_FIELD: &str = "---";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentCard {
    pub card: PersonCard,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDetail {
    pub card: PersonCard,
    pub note: String,
    pub parents: Vec<ParentCard>,
    pub spouses: Vec<SpouseCard>,
    pub children: Vec<PersonCard>,
    /// Present only for admins. A person without a private row gets an
    /// all-empty record.
    pub private: Option<PrivateDetails>,
    pub private_notice: Option<String>,
    pub can_edit: bool,
}

impl MemberDetail {
    pub fn build(
        graph: &FamilyGraph,
        dataset: &FamilyDataset,
        id: &PersonId,
        viewer: Viewer,
    ) -> Result<Self, GraphError> {
        let unit = graph
            .resolve(id)
            .ok_or_else(|| GraphError::PersonNotFound(id.clone()))?;

        let note = unit
            .person
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(NO_NOTE)
            .to_string();

        let parents = graph
            .parents(id)
            .into_iter()
            .map(|parent| ParentCard {
                card: PersonCard::from_person(parent.person),
                kind: parent.kind,
            })
            .collect();

        let spouses = unit
            .spouses
            .iter()
            .map(|spouse| {
                SpouseCard::from(&SpouseLink {
                    person: spouse.person.clone(),
                    note: spouse.note.map(str::to_string),
                })
            })
            .collect();

        let (private, private_notice) = if viewer.can_see_private() {
            let details = dataset
                .private_details(id)
                .cloned()
                .unwrap_or_else(|| PrivateDetails::empty(id.clone()));
            (Some(details), None)
        } else {
            (None, Some(PRIVATE_NOTICE.to_string()))
        };

        Ok(Self {
            card: PersonCard::from_person(unit.person),
            note,
            parents,
            spouses,
            children: unit.children.into_iter().map(PersonCard::from_person).collect(),
            private,
            private_notice,
            can_edit: viewer.can_edit(),
        })
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![card_label(&self.card), String::new(), self.note.clone()];

        if !self.parents.is_empty() {
            lines.push(String::new());
            lines.push("Parents:".to_string());
            for parent in &self.parents {
                let suffix = match parent.kind {
                    RelationshipKind::AdoptedChild => " (adoptive)",
                    _ => "",
                };
                lines.push(format!("  {}{}", card_label(&parent.card), suffix));
            }
        }

        if !self.spouses.is_empty() {
            lines.push(String::new());
            lines.push("Spouses:".to_string());
            lines.extend(self.spouses.iter().map(|s| format!("  {}", spouse_label(s))));
        }

        if !self.children.is_empty() {
            lines.push(String::new());
            lines.push("Children:".to_string());
            lines.extend(self.children.iter().map(|c| format!("  {}", card_label(c))));
        }

        lines.push(String::new());
        match (&self.private, &self.private_notice) {
            (Some(private), _) => {
                let field = |v: &Option<String>| v.clone().unwrap_or_else(|| BLANK_FIELD.to_string());
                lines.push(format!("Phone: {}", field(&private.phone_number)));
                lines.push(format!("Occupation: {}", field(&private.occupation)));
                lines.push(format!("Residence: {}", field(&private.current_residence)));
            }
            (None, Some(notice)) => lines.push(notice.clone()),
            (None, None) => {}
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{Gender, Person, Relationship};

    fn dataset() -> FamilyDataset {
        let mut private = PrivateDetails::empty("kid".into());
        private.phone_number = Some("0900 000 000".to_string());

        FamilyDataset::new(
            vec![
                Person::new("dad", "Dad", Gender::Male).with_birth(Some(1950), None, None),
                Person::new("mom", "Mom", Gender::Female).with_birth(Some(1952), None, None),
                Person::new("kid", "Kid", Gender::Male).with_birth(Some(1980), None, None),
                Person::new("wife", "Wife", Gender::Female).in_law(),
                Person::new("grandkid", "Grandkid", Gender::Female),
            ],
            vec![
                Relationship::marriage("dad", "mom"),
                Relationship::child("dad", "kid"),
                Relationship::adopted("mom", "kid"),
                Relationship::marriage("kid", "wife"),
                Relationship::child("kid", "grandkid"),
            ],
            vec![private],
        )
    }

    #[test]
    fn test_admin_sees_private_details() {
        let data = dataset();
        let graph = FamilyGraph::from_dataset(&data);
        let detail = MemberDetail::build(&graph, &data, &"kid".into(), Viewer::ADMIN).unwrap();

        assert_eq!(detail.parents.len(), 2);
        assert_eq!(detail.parents[1].kind, RelationshipKind::AdoptedChild);
        assert_eq!(detail.spouses[0].role, "Wife");
        assert_eq!(detail.children.len(), 1);
        assert_eq!(
            detail.private.as_ref().and_then(|p| p.phone_number.as_deref()),
            Some("0900 000 000")
        );
        assert!(detail.can_edit);
        assert!(detail.render_text().contains("Occupation: ---"));
    }

    #[test]
    fn test_guest_gets_notice() {
        let data = dataset();
        let graph = FamilyGraph::from_dataset(&data);
        let detail = MemberDetail::build(&graph, &data, &"kid".into(), Viewer::GUEST).unwrap();

        assert!(detail.private.is_none());
        assert_eq!(detail.private_notice.as_deref(), Some(PRIVATE_NOTICE));
        assert!(!detail.can_edit);
        assert!(!detail.render_text().contains("Phone"));
    }

    #[test]
    fn test_missing_private_row_is_empty() {
        let data = dataset();
        let graph = FamilyGraph::from_dataset(&data);
        let detail = MemberDetail::build(&graph, &data, &"dad".into(), Viewer::ADMIN).unwrap();

        assert_eq!(detail.private, Some(PrivateDetails::empty("dad".into())));
        assert_eq!(detail.note, NO_NOTE);
    }

    #[test]
    fn test_unknown_member() {
        let data = dataset();
        let graph = FamilyGraph::from_dataset(&data);
        assert_eq!(
            MemberDetail::build(&graph, &data, &"nobody".into(), Viewer::GUEST),
            Err(GraphError::PersonNotFound("nobody".into()))
        );
    }
}
