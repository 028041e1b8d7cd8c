use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Tag used to cluster categories into training days ("push day", "legs").
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum GroupLetter {
    #[default]
    A,
    B,
    C,
    D,
    E,
    F,
}

impl GroupLetter {
    pub const FIRST: GroupLetter = GroupLetter::A;
}
