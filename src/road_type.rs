// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::Serialize;

/// Classification of a road segment, based on its
/// [highway=*](https://wiki.openstreetmap.org/wiki/Key:highway) tag.
///
/// Road types don't influence routing directly - the offline preprocessing step
/// already baked them into [Edge](crate::Edge) speeds and pollution multipliers.
/// They are only carried to describe routes in [RouteStats](crate::RouteStats).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
    Unclassified,
    Residential,
    LivingStreet,
    Busway,
    #[default]
    Unknown,
}

impl RoadType {
    /// Interprets the value of a `highway` attribute.
    ///
    /// Snapshots written by osmnx store merged ways with multiple highway values
    /// as a list literal, e.g. `['residential', 'tertiary']`. In that case only the
    /// first value is considered.
    pub fn from_highway(value: &str) -> Self {
        let value = value
            .trim()
            .trim_start_matches('[')
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches(|c| c == '\'' || c == '"' || c == ']');

        match value {
            "motorway" => Self::Motorway,
            "motorway_link" => Self::MotorwayLink,
            "trunk" => Self::Trunk,
            "trunk_link" => Self::TrunkLink,
            "primary" => Self::Primary,
            "primary_link" => Self::PrimaryLink,
            "secondary" => Self::Secondary,
            "secondary_link" => Self::SecondaryLink,
            "tertiary" => Self::Tertiary,
            "tertiary_link" => Self::TertiaryLink,
            "unclassified" => Self::Unclassified,
            "residential" => Self::Residential,
            "living_street" => Self::LivingStreet,
            "busway" => Self::Busway,
            _ => Self::Unknown,
        }
    }
}
