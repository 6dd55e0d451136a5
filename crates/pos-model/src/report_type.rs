//! The closed set of supported report types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::profile::{BOOKING_PROFILE, MEMBER_CHANGE_PROFILE, ROOM_PROFILE, ReportProfile, SALES_PROFILE};

/// Kind of POS export being ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Booking summary per employee.
    Booking,
    /// Room opening / bill detail.
    Room,
    /// Drink sales analysis.
    Sales,
    /// Member account change detail.
    MemberChange,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Booking,
        ReportType::Room,
        ReportType::Sales,
        ReportType::MemberChange,
    ];

    /// Stable key used in options, filenames and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Room => "room",
            Self::Sales => "sales",
            Self::MemberChange => "member_change",
        }
    }

    /// Static configuration for this report type.
    pub fn profile(self) -> &'static ReportProfile {
        match self {
            Self::Booking => &BOOKING_PROFILE,
            Self::Room => &ROOM_PROFILE,
            Self::Sales => &SALES_PROFILE,
            Self::MemberChange => &MEMBER_CHANGE_PROFILE,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "booking" => Ok(Self::Booking),
            "room" => Ok(Self::Room),
            "sales" => Ok(Self::Sales),
            "member_change" => Ok(Self::MemberChange),
            other => Err(PipelineError::UnknownReportType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!("booking".parse::<ReportType>().unwrap(), ReportType::Booking);
        assert_eq!(
            "Member-Change".parse::<ReportType>().unwrap(),
            ReportType::MemberChange
        );
        assert!("inventory".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for report_type in ReportType::ALL {
            assert_eq!(report_type.to_string().parse::<ReportType>().unwrap(), report_type);
            assert_eq!(report_type.profile().report_type, report_type);
        }
    }
}
