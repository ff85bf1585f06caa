use serde::{Deserialize, Serialize};

use crate::models::RatingField;
use crate::models::RatingField::*;

/// A chart option: one rating field, or an aggregate category of several.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DimensionSpec {
    pub name: &'static str,
    pub fields: &'static [RatingField],
    pub is_aggregate: bool,
}

const fn direct(name: &'static str, fields: &'static [RatingField]) -> DimensionSpec {
    DimensionSpec {
        name,
        fields,
        is_aggregate: false,
    }
}

const fn aggregate(name: &'static str, fields: &'static [RatingField]) -> DimensionSpec {
    DimensionSpec {
        name,
        fields,
        is_aggregate: true,
    }
}

pub static DIMENSIONS: [DimensionSpec; 13] = [
    direct("Clarity in Change Needed", &[ChangeClarity]),
    direct("Clarity in Roles and Responsibilities", &[RoleClarity]),
    direct("Confident in the Goals", &[GoalConfident]),
    direct("More Equipped", &[Equipped]),
    direct("Equipped and Supported", &[Supported]),
    direct("Understand Instruction State", &[Understanding]),
    direct("Valuable Use of Time", &[Valuable]),
    direct("Clear in Work Ahead", &[WorkClarity]),
    direct("Learned Something", &[Learned]),
    direct("Would Recommend", &[Recommend]),
    aggregate(
        "Clarity of Communication",
        &[ChangeClarity, RoleClarity, Understanding, WorkClarity],
    ),
    aggregate("Equipping People for Success", &[Equipped, Supported]),
    aggregate(
        "Evaluative Metrics",
        &[Recommend, GoalConfident, Learned, Valuable],
    ),
];

pub fn find(name: &str) -> Option<&'static DimensionSpec> {
    DIMENSIONS.iter().find(|spec| spec.name == name)
}

/// The "Aggregate?" sidebar choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    #[default]
    Direct,
    Aggregate,
}

impl Grouping {
    pub const ALL: [Grouping; 2] = [Grouping::Direct, Grouping::Aggregate];

    pub fn label(self) -> &'static str {
        match self {
            Grouping::Direct => "No, direct options",
            Grouping::Aggregate => "Yes, aggregate",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Grouping::Direct => "direct",
            Grouping::Aggregate => "aggregate",
        }
    }

    pub fn options(self) -> impl Iterator<Item = &'static DimensionSpec> {
        let wanted = self == Grouping::Aggregate;
        DIMENSIONS.iter().filter(move |spec| spec.is_aggregate == wanted)
    }

    /// Resolves the radio choice, falling back to the first option of this grouping.
    pub fn option(self, name: Option<&str>) -> &'static DimensionSpec {
        let mut options = self.options();
        let first = options.next().unwrap_or(&DIMENSIONS[0]);
        match name {
            Some(name) => std::iter::once(first)
                .chain(options)
                .find(|spec| spec.name == name)
                .unwrap_or(first),
            None => first,
        }
    }
}
