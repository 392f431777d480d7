use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A building type that can be stored on a tag.
///
/// The declaration order is significant: it is the order returned by
/// [`BuildingType::all`], and the first match in that order wins whenever
/// two types end up sharing a byte value. `Ord` follows the same order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingType {
    CityCenter,
    CityCenterA,
    CityCenterB,
    CityCenterC,
    CityCenterD,
    CityCenterE,
    CityCenterF,
    Factory,
    Stadium,
    Hospital,
    University,
    Airport,
    ShoppingMall,
    TechnologyCenter,
    Farm,
    LivingQuarterSmall,
    LivingQuarterLarge,
    School,
}

/// The catalogue: (type, symbolic name, default byte value).
const CATALOGUE: [(BuildingType, &str, u8); 18] = [
    (BuildingType::CityCenter, "CITY_CENTER", 0),
    (BuildingType::CityCenterA, "CITY_CENTER_A", 1),
    (BuildingType::CityCenterB, "CITY_CENTER_B", 2),
    (BuildingType::CityCenterC, "CITY_CENTER_C", 3),
    (BuildingType::CityCenterD, "CITY_CENTER_D", 4),
    (BuildingType::CityCenterE, "CITY_CENTER_E", 5),
    (BuildingType::CityCenterF, "CITY_CENTER_F", 6),
    (BuildingType::Factory, "FACTORY", 7),
    (BuildingType::Stadium, "STADIUM", 8),
    (BuildingType::Hospital, "HOSPITAL", 9),
    (BuildingType::University, "UNIVERSITY", 10),
    (BuildingType::Airport, "AIRPORT", 11),
    (BuildingType::ShoppingMall, "SHOPPING_MALL", 12),
    (BuildingType::TechnologyCenter, "TECHNOLOGY_CENTER", 13),
    (BuildingType::Farm, "FARM", 14),
    (BuildingType::LivingQuarterSmall, "LIVING_QUARTER_SMALL", 15),
    (BuildingType::LivingQuarterLarge, "LIVING_QUARTER_LARGE", 16),
    (BuildingType::School, "SCHOOL", 17),
];

const ALL: [BuildingType; 18] = {
    let mut all = [BuildingType::CityCenter; 18];
    let mut i = 0;
    while i < CATALOGUE.len() {
        all[i] = CATALOGUE[i].0;
        i += 1;
    }
    all
};

impl BuildingType {
    /// Every building type, in declaration order.
    pub fn all() -> &'static [BuildingType] {
        &ALL
    }

    /// Position of this type in the catalogue.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Symbolic name, e.g. `"FARM"`.
    pub fn name(self) -> &'static str {
        CATALOGUE[self.index()].1
    }

    /// Byte value used when no override is set.
    pub fn default_value(self) -> u8 {
        CATALOGUE[self.index()].2
    }

    /// Look up a type by its exact symbolic name.
    pub fn by_name(name: &str) -> Result<Self, ValidationError> {
        CATALOGUE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(t, _, _)| *t)
            .ok_or_else(|| ValidationError::UnknownType(name.to_string()))
    }

    /// First type in declaration order whose *default* equals `value`.
    ///
    /// Overrides are not considered here; see the resolver crate for that.
    pub fn by_default_value(value: u8) -> Option<Self> {
        CATALOGUE
            .iter()
            .find(|(_, _, v)| *v == value)
            .map(|(t, _, _)| *t)
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_eighteen_entries_in_order() {
        let all = BuildingType::all();
        assert_eq!(all.len(), 18);
        assert_eq!(all[0], BuildingType::CityCenter);
        assert_eq!(all[17], BuildingType::School);
        for (i, t) in all.iter().enumerate() {
            assert_eq!(t.index(), i);
        }
    }

    #[test]
    fn index_matches_catalogue_row() {
        for (t, name, value) in CATALOGUE {
            assert_eq!(t.name(), name);
            assert_eq!(t.default_value(), value);
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = BuildingType::all().iter().map(|t| t.name()).collect();
        let len = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), len);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(BuildingType::by_name("FARM").unwrap(), BuildingType::Farm);
        assert_eq!("SCHOOL".parse::<BuildingType>().unwrap(), BuildingType::School);
    }

    #[test]
    fn lookup_by_name_is_case_sensitive() {
        let err = BuildingType::by_name("farm").unwrap_err();
        assert_eq!(err, ValidationError::UnknownType("farm".into()));
    }

    #[test]
    fn lookup_by_default_value() {
        assert_eq!(BuildingType::by_default_value(14), Some(BuildingType::Farm));
        assert_eq!(BuildingType::by_default_value(0), Some(BuildingType::CityCenter));
        assert_eq!(BuildingType::by_default_value(18), None);
        assert_eq!(BuildingType::by_default_value(255), None);
    }

    #[test]
    fn known_defaults() {
        assert_eq!(BuildingType::Farm.default_value(), 14);
        assert_eq!(BuildingType::School.default_value(), 17);
        assert_eq!(BuildingType::CityCenter.default_value(), 0);
    }

    #[test]
    fn ordering_follows_declaration() {
        assert!(BuildingType::CityCenter < BuildingType::Farm);
        assert!(BuildingType::Farm < BuildingType::School);
    }

    #[test]
    fn display_uses_symbolic_name() {
        assert_eq!(BuildingType::LivingQuarterSmall.to_string(), "LIVING_QUARTER_SMALL");
    }

    #[test]
    fn serde_uses_symbolic_name() {
        let json = serde_json::to_string(&BuildingType::ShoppingMall).unwrap();
        assert_eq!(json, "\"SHOPPING_MALL\"");
        let back: BuildingType = serde_json::from_str("\"CITY_CENTER_F\"").unwrap();
        assert_eq!(back, BuildingType::CityCenterF);
    }
}
