//! Member list with search, filter and sort.

use kindred_core::{Gender, Person, PersonCard};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const EMPTY_FAMILY: &str = "No members yet. Add the first member.";
pub const NO_MATCH: &str = "No matching members found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberFilter {
    #[default]
    All,
    Male,
    Female,
    /// Daughters-in-law.
    InLawFemale,
    /// Sons-in-law.
    InLawMale,
    Deceased,
}

impl MemberFilter {
    pub fn matches(&self, person: &Person) -> bool {
        match self {
            MemberFilter::All => true,
            MemberFilter::Male => person.gender == Gender::Male,
            MemberFilter::Female => person.gender == Gender::Female,
            MemberFilter::InLawFemale => person.gender == Gender::Female && person.is_in_law,
            MemberFilter::InLawMale => person.gender == Gender::Male && person.is_in_law,
            MemberFilter::Deceased => person.is_deceased(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberFilter::All => "all",
            MemberFilter::Male => "male",
            MemberFilter::Female => "female",
            MemberFilter::InLawFemale => "in_law_female",
            MemberFilter::InLawMale => "in_law_male",
            MemberFilter::Deceased => "deceased",
        }
    }
}

impl fmt::Display for MemberFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(MemberFilter::All),
            "male" => Ok(MemberFilter::Male),
            "female" => Ok(MemberFilter::Female),
            "in_law_female" => Ok(MemberFilter::InLawFemale),
            "in_law_male" => Ok(MemberFilter::InLawMale),
            "deceased" => Ok(MemberFilter::Deceased),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSort {
    /// Eldest first; unknown birth years last.
    #[default]
    BirthAsc,
    /// Youngest first; unknown birth years last.
    BirthDesc,
    NameAsc,
    NameDesc,
}

impl MemberSort {
    fn compare(&self, a: &Person, b: &Person) -> Ordering {
        match self {
            MemberSort::BirthAsc => {
                let key = |p: &Person| p.birth.known_year().unwrap_or(9999);
                key(a).cmp(&key(b))
            }
            MemberSort::BirthDesc => {
                let key = |p: &Person| p.birth.known_year().unwrap_or(0);
                key(b).cmp(&key(a))
            }
            MemberSort::NameAsc => compare_names(&a.full_name, &b.full_name),
            MemberSort::NameDesc => compare_names(&b.full_name, &a.full_name),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberSort::BirthAsc => "birth_asc",
            MemberSort::BirthDesc => "birth_desc",
            MemberSort::NameAsc => "name_asc",
            MemberSort::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for MemberSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "birth_asc" => Ok(MemberSort::BirthAsc),
            "birth_desc" => Ok(MemberSort::BirthDesc),
            "name_asc" => Ok(MemberSort::NameAsc),
            "name_desc" => Ok(MemberSort::NameDesc),
            other => Err(format!("unknown sort '{}'", other)),
        }
    }
}

/// Case-insensitive name order, ties broken by the raw text.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: String,
    pub filter: MemberFilter,
    pub sort: MemberSort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberList {
    pub cards: Vec<PersonCard>,
    pub total: usize,
    /// Set when `cards` is empty.
    pub empty_message: Option<String>,
}

impl MemberList {
    pub fn build<'a, I>(persons: I, query: &ListQuery) -> Self
    where
        I: IntoIterator<Item = &'a Person>,
    {
        let needle = query.search.trim().to_lowercase();
        let mut total = 0;
        let mut matched: Vec<&Person> = persons
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|p| needle.is_empty() || p.full_name.to_lowercase().contains(&needle))
            .filter(|p| query.filter.matches(p))
            .collect();

        matched.sort_by(|a, b| query.sort.compare(a, b));

        let empty_message = match (matched.is_empty(), total) {
            (false, _) => None,
            (true, 0) => Some(EMPTY_FAMILY.to_string()),
            (true, _) => Some(NO_MATCH.to_string()),
        };

        Self {
            cards: matched.into_iter().map(PersonCard::from_person).collect(),
            total,
            empty_message,
        }
    }

    pub fn render_text(&self) -> String {
        if let Some(message) = &self.empty_message {
            return message.clone();
        }
        self.cards
            .iter()
            .map(crate::card::card_label)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Vec<Person> {
        vec![
            Person::new("1", "Nguyen Van Binh", Gender::Male).with_birth(Some(1950), None, None),
            Person::new("2", "Tran Thi An", Gender::Female)
                .with_birth(Some(1955), None, None)
                .in_law(),
            Person::new("3", "Le Van Cuong", Gender::Male).in_law(),
            Person::new("4", "nguyen thi dung", Gender::Female)
                .with_birth(Some(1920), None, None)
                .with_death(Some(1999), None, None),
        ]
    }

    fn ids(list: &MemberList) -> Vec<&str> {
        list.cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_default_sort_is_birth_ascending_unknown_last() {
        let persons = family();
        let list = MemberList::build(&persons, &ListQuery::default());
        assert_eq!(ids(&list), vec!["4", "1", "2", "3"]);
    }

    #[test]
    fn test_birth_descending_unknown_last() {
        let persons = family();
        let query = ListQuery {
            sort: MemberSort::BirthDesc,
            ..Default::default()
        };
        assert_eq!(ids(&MemberList::build(&persons, &query)), vec!["2", "1", "4", "3"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let persons = family();
        let query = ListQuery {
            search: "NGUYEN".to_string(),
            sort: MemberSort::NameAsc,
            ..Default::default()
        };
        assert_eq!(ids(&MemberList::build(&persons, &query)), vec!["1", "4"]);
    }

    #[test]
    fn test_filters() {
        let persons = family();
        let run = |filter| {
            let query = ListQuery {
                filter,
                ..Default::default()
            };
            MemberList::build(&persons, &query)
                .cards
                .into_iter()
                .map(|c| c.id.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(MemberFilter::InLawMale), vec!["3"]);
        assert_eq!(run(MemberFilter::InLawFemale), vec!["2"]);
        assert_eq!(run(MemberFilter::Deceased), vec!["4"]);
        assert_eq!(run(MemberFilter::Female), vec!["4", "2"]);
    }

    #[test]
    fn test_empty_messages() {
        let none: Vec<Person> = Vec::new();
        let empty = MemberList::build(&none, &ListQuery::default());
        assert_eq!(empty.render_text(), EMPTY_FAMILY);

        let persons = family();
        let query = ListQuery {
            search: "zzz".to_string(),
            ..Default::default()
        };
        let no_match = MemberList::build(&persons, &query);
        assert_eq!(no_match.total, 4);
        assert_eq!(no_match.empty_message.as_deref(), Some(NO_MATCH));
    }

    #[test]
    fn test_filter_and_sort_parse() {
        assert_eq!("in_law_male".parse::<MemberFilter>(), Ok(MemberFilter::InLawMale));
        assert_eq!("name_desc".parse::<MemberSort>(), Ok(MemberSort::NameDesc));
        assert!("oldest".parse::<MemberSort>().is_err());
    }
}
