use serde::{Deserialize, Serialize};

/// Level of a zone in the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    #[serde(rename = "REGION")]
    Region,
    #[serde(rename = "DEPARTMENT")]
    Department,
    #[serde(rename = "COMMUNE")]
    Commune,
    #[serde(rename = "VOTING_PLACE")]
    VotingPlace,
    #[serde(rename = "POLLING_STATION")]
    PollingStation,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "REGION",
            Self::Department => "DEPARTMENT",
            Self::Commune => "COMMUNE",
            Self::VotingPlace => "VOTING_PLACE",
            Self::PollingStation => "POLLING_STATION",
        }
    }

    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "REGION" => Some(Self::Region),
            "DEPARTMENT" => Some(Self::Department),
            "COMMUNE" => Some(Self::Commune),
            "VOTING_PLACE" => Some(Self::VotingPlace),
            "POLLING_STATION" => Some(Self::PollingStation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone-selecting parameters of a by-zone results query.
///
/// Exactly one field is expected; when several are present the most specific
/// one wins (polling station > voting place > department > region).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneSelector {
    pub region: Option<i64>,
    pub department: Option<i64>,
    pub voting_place: Option<i64>,
    pub polling_station: Option<i64>,
}

impl ZoneSelector {
    /// The zone type selected by the most specific identifier present,
    /// along with that identifier.
    pub fn most_specific(&self) -> Option<(ZoneType, i64)> {
        if let Some(id) = self.polling_station {
            Some((ZoneType::PollingStation, id))
        } else if let Some(id) = self.voting_place {
            Some((ZoneType::VotingPlace, id))
        } else if let Some(id) = self.department {
            Some((ZoneType::Department, id))
        } else {
            self.region.map(|id| (ZoneType::Region, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_specific_identifier_wins() {
        let selector = ZoneSelector {
            region: Some(1),
            department: Some(2),
            voting_place: None,
            polling_station: Some(9),
        };
        assert_eq!(
            selector.most_specific(),
            Some((ZoneType::PollingStation, 9))
        );

        let selector = ZoneSelector {
            region: Some(1),
            department: Some(2),
            ..Default::default()
        };
        assert_eq!(selector.most_specific(), Some((ZoneType::Department, 2)));
    }

    #[test]
    fn empty_selector_selects_nothing() {
        assert_eq!(ZoneSelector::default().most_specific(), None);
    }

    #[test]
    fn zone_type_round_trip() {
        for zt in [
            ZoneType::Region,
            ZoneType::Department,
            ZoneType::Commune,
            ZoneType::VotingPlace,
            ZoneType::PollingStation,
        ] {
            assert_eq!(ZoneType::from_raw(zt.as_str()), Some(zt));
        }
        assert_eq!(ZoneType::from_raw("nonsense"), None);
    }
}
