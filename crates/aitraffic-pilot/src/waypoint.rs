//! A single flight-plan waypoint.

use serde::{Deserialize, Serialize};

use aitraffic_core::error::FlightPlanError;
use aitraffic_core::params::WaypointRecord;
use aitraffic_core::types::GeoPosition;

/// Cross altitudes at or below this value mean "no constraint".
const NO_CROSSAT_FT: f64 = -1000.0;

/// Role of a waypoint in its plan. Three names are sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaypointKind {
    Normal,
    /// `"END"`: the plan terminates (or restarts) here.
    End,
    /// `"WAIT"`: hold at zero speed for a duration.
    Wait { secs: f64 },
    /// `"WAITUNTIL"`: hold at zero speed until a time of day.
    WaitUntil { time_of_day_secs: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub kind: WaypointKind,
    pub position: GeoPosition,
    pub speed_kt: f64,
    pub crossat_ft: Option<f64>,
    pub on_ground: bool,
    pub gear_down: bool,
    pub flaps_down: bool,
}

impl Waypoint {
    /// Build from a record; `index` is only used for error reporting.
    pub fn from_record(index: usize, record: &WaypointRecord) -> Result<Self, FlightPlanError> {
        let non_finite = |field: &'static str| FlightPlanError::NonFinite {
            index,
            name: record.name.clone(),
            field,
        };
        if !record.lat.is_finite() {
            return Err(non_finite("lat"));
        }
        if !record.lon.is_finite() {
            return Err(non_finite("lon"));
        }
        if !record.alt.is_finite() {
            return Err(non_finite("alt"));
        }
        if !record.ktas.is_finite() {
            return Err(non_finite("ktas"));
        }
        if !record.crossat.is_finite() {
            return Err(non_finite("crossat"));
        }

        let kind = match record.name.as_str() {
            "END" => WaypointKind::End,
            "WAIT" => {
                if !record.time_sec.is_finite() {
                    return Err(non_finite("time_sec"));
                }
                WaypointKind::Wait {
                    secs: record.time_sec.max(0.0),
                }
            }
            "WAITUNTIL" => {
                let raw = record.time.clone().unwrap_or_default();
                let time_of_day_secs =
                    parse_time_of_day(&raw).ok_or(FlightPlanError::InvalidTime { index, value: raw })?;
                WaypointKind::WaitUntil { time_of_day_secs }
            }
            _ => WaypointKind::Normal,
        };

        Ok(Self {
            name: record.name.clone(),
            kind,
            position: GeoPosition::new(record.lat, record.lon, record.alt),
            speed_kt: record.ktas,
            crossat_ft: (record.crossat > NO_CROSSAT_FT).then_some(record.crossat),
            on_ground: record.on_ground,
            gear_down: record.gear_down,
            flaps_down: record.flaps_down,
        })
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self.kind, WaypointKind::Normal)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, WaypointKind::End)
    }

    /// Seconds to hold at this waypoint, if it is a wait sentinel.
    ///
    /// A `WAITUNTIL` whose time of day has already passed does not hold.
    pub fn wait_secs(&self, time_of_day_secs: f64) -> Option<f64> {
        match self.kind {
            WaypointKind::Wait { secs } => Some(secs),
            WaypointKind::WaitUntil { time_of_day_secs: until } => {
                (until > time_of_day_secs).then(|| until - time_of_day_secs)
            }
            WaypointKind::Normal | WaypointKind::End => None,
        }
    }
}

/// Parse `"HH:MM:SS"` (seconds optional) into seconds after midnight.
pub fn parse_time_of_day(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: u32 = match parts.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(f64::from(hours * 3600 + minutes * 60 + seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("00:00:00"), Some(0.0));
        assert_eq!(parse_time_of_day("13:30"), Some(48_600.0));
        assert_eq!(parse_time_of_day("23:59:59"), Some(86_399.0));
        assert_eq!(parse_time_of_day("24:00:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
    }

    #[test]
    fn test_waituntil_holds_until_time_of_day() {
        let mut rec = WaypointRecord::new("WAITUNTIL", 0.0, 0.0, 0.0, 0.0);
        rec.time = Some("13:00:00".to_string());
        let wp = Waypoint::from_record(0, &rec).unwrap();
        let wait = wp.wait_secs(12.0 * 3600.0).unwrap();
        assert!((wait - 3600.0).abs() < 1e-9, "12:00 to 13:00 is an hour, got {wait}");
    }

    #[test]
    fn test_waituntil_in_the_past_does_not_hold() {
        let mut rec = WaypointRecord::new("WAITUNTIL", 0.0, 0.0, 0.0, 0.0);
        rec.time = Some("01:00:00".to_string());
        let wp = Waypoint::from_record(0, &rec).unwrap();
        assert_eq!(wp.wait_secs(23.0 * 3600.0), None, "01:00 already passed at 23:00");
        assert_eq!(wp.wait_secs(3600.0), None, "due exactly now");
    }

    #[test]
    fn test_crossat_threshold() {
        let mut rec = WaypointRecord::new("A", 0.0, 0.0, 3000.0, 200.0);
        assert_eq!(Waypoint::from_record(0, &rec).unwrap().crossat_ft, None);
        rec.crossat = 2500.0;
        assert_eq!(Waypoint::from_record(0, &rec).unwrap().crossat_ft, Some(2500.0));
    }

    #[test]
    fn test_non_finite_rejected() {
        let rec = WaypointRecord::new("A", f64::NAN, 0.0, 0.0, 0.0);
        let err = Waypoint::from_record(3, &rec).unwrap_err();
        assert_eq!(
            err,
            FlightPlanError::NonFinite {
                index: 3,
                name: "A".to_string(),
                field: "lat"
            }
        );
    }
}
