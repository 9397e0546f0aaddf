//! Kindred Core - Family records and presentation rules
//!
//! This crate defines the records Kindred works with (persons, private
//! details, relationships), the dataset snapshot that holds them, and the
//! rules every view shares: date formatting, the deceased rule, avatar
//! colors and badges.
//!
//! # Example
//!
//! ```
//! use kindred_core::{format_display_date, Gender, Person, PersonCard};
//!
//! let person = Person::new("p1", "Pham Huu A", Gender::Male)
//!     .with_birth(Some(1920), Some(3), Some(7))
//!     .deceased();
//!
//! let card = PersonCard::from_person(&person);
//! assert!(card.deceased);
//! assert_eq!(format_display_date(Some(1920), Some(3), Some(7)), "07/03/1920");
//! ```

mod config;
mod dataset;
mod date;
mod draft;
mod error;
mod model;
mod presentation;
mod viewer;

pub use config::{KindredConfig, CONFIG_DIR, CONFIG_FILE, SITE_NAME_ENV};
pub use dataset::FamilyDataset;
pub use date::{format_date, format_display_date, format_life_span, UNKNOWN_DATE};
pub use draft::{PersonDraft, PrivateDraft, RelationshipDraft};
pub use error::{CoreError, Result};
pub use model::{DateParts, Gender, Person, PersonId, PrivateDetails, Relationship, RelationshipKind};
pub use presentation::{in_law_label, spouse_role, AvatarColor, PersonCard, DECEASED_BADGE};
pub use viewer::{AppState, ViewMode, Viewer};
