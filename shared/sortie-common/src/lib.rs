//! Sortie Common Library
//!
//! Domain rules shared by the server and any client: the category tag set,
//! payload validators and the event participation state machine.
//! Nothing in here performs I/O.

pub mod category;
pub mod participation;
pub mod validation;

pub use category::{CategoryTag, InvalidCategoryTag};
pub use participation::{MemberState, Outcome, ParticipationError, Roster};
pub use validation::{parse_payload, Payload, ValidationReport};
