//! Fact records as persisted by the store.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

use super::Category;

pub type FactId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub id: FactId,
    pub text: String,
    pub source: String,
    pub category: Category,
    pub votes_interesting: u32,
    pub votes_mindblowing: u32,
    pub votes_false: u32,
    pub created_in: i32,
}

impl Fact {
    /// More false votes than interesting and mind-blowing votes combined.
    pub fn is_disputed(&self) -> bool {
        u64::from(self.votes_interesting) + u64::from(self.votes_mindblowing)
            < u64::from(self.votes_false)
    }

    pub fn votes(&self, field: VoteField) -> u32 {
        match field {
            VoteField::Interesting => self.votes_interesting,
            VoteField::Mindblowing => self.votes_mindblowing,
            VoteField::False => self.votes_false,
        }
    }
}

/// Submission payload; the store fills in everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewFact {
    pub text: String,
    pub source: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoteField {
    #[serde(rename = "votesInteresting")]
    Interesting,
    #[serde(rename = "votesMindblowing")]
    Mindblowing,
    #[serde(rename = "votesFalse")]
    False,
}

impl VoteField {
    pub const ALL: [VoteField; 3] = [VoteField::Interesting, VoteField::Mindblowing, VoteField::False];

    /// Column name in the store.
    pub fn column(self) -> &'static str {
        match self {
            VoteField::Interesting => "votesInteresting",
            VoteField::Mindblowing => "votesMindblowing",
            VoteField::False => "votesFalse",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            VoteField::Interesting => "👍",
            VoteField::Mindblowing => "🤯",
            VoteField::False => "⛔️",
        }
    }
}

impl fmt::Display for VoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for VoteField {
    type Err = Error;

    /// Accepts the column name or the short form (`interesting`, `mindblowing`, `false`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "votesInteresting" | "interesting" => Ok(VoteField::Interesting),
            "votesMindblowing" | "mindblowing" => Ok(VoteField::Mindblowing),
            "votesFalse" | "false" => Ok(VoteField::False),
            other => Err(anyhow!("unknown vote field '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact_with_votes(interesting: u32, mindblowing: u32, false_votes: u32) -> Fact {
        Fact {
            id: 1,
            text: "Water boils at lower temperatures at altitude".into(),
            source: "https://example.com".into(),
            category: Category::Science,
            votes_interesting: interesting,
            votes_mindblowing: mindblowing,
            votes_false: false_votes,
            created_in: 2024,
        }
    }

    #[test]
    fn disputed_when_false_votes_outweigh_the_rest() {
        assert!(fact_with_votes(1, 0, 2).is_disputed());
        assert!(!fact_with_votes(5, 0, 2).is_disputed());
        assert!(!fact_with_votes(1, 1, 2).is_disputed());
        assert!(!fact_with_votes(0, 0, 0).is_disputed());
    }

    #[test]
    fn disputed_does_not_overflow() {
        assert!(!fact_with_votes(u32::MAX, u32::MAX, u32::MAX).is_disputed());
    }

    #[test]
    fn uses_store_column_names_on_the_wire() {
        let json = serde_json::to_value(fact_with_votes(3, 2, 1)).unwrap();
        assert_eq!(json["votesInteresting"], 3);
        assert_eq!(json["votesMindblowing"], 2);
        assert_eq!(json["votesFalse"], 1);
        assert_eq!(json["createdIn"], 2024);
        assert_eq!(json["category"], "science");

        let field: VoteField = serde_json::from_str("\"votesFalse\"").unwrap();
        assert_eq!(field, VoteField::False);
    }

    #[test]
    fn parses_vote_fields() {
        assert_eq!("mindblowing".parse::<VoteField>().unwrap(), VoteField::Mindblowing);
        assert_eq!("votesInteresting".parse::<VoteField>().unwrap(), VoteField::Interesting);
        assert!("likes".parse::<VoteField>().is_err());
    }

    #[test]
    fn every_field_reads_its_own_counter() {
        let fact = fact_with_votes(3, 2, 1);
        let counts: Vec<u32> = VoteField::ALL.iter().map(|field| fact.votes(*field)).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        for field in VoteField::ALL {
            assert_eq!(field.column().parse::<VoteField>().unwrap(), field);
        }
    }
}
