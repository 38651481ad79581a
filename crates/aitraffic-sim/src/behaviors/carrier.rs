//! Aircraft carrier: a ship with an operating box, turn-into-wind for
//! launch, deck machinery and the optical landing aid.

use glam::DVec3;

use aitraffic_core::components::{Kinematics, Targets};
use aitraffic_core::constants::*;
use aitraffic_core::enums::CarrierMode;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::Actuator;
use aitraffic_core::geo::{bearing_from_components, normalize_180, normalize_heading, rotate_ned_to_body};
use aitraffic_core::params::CarrierParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_core::types::{GeoPosition, Orientation};

use super::ship::ShipKinematics;
use super::{EntityMut, UpdateContext};

#[derive(Debug)]
pub struct CarrierBehavior {
    ship: ShipKinematics,
    params: CarrierParams,
    box_origin: GeoPosition,
    base_course_deg: f64,
    base_speed_kt: f64,
    mode: CarrierMode,
    turn_to_launch: bool,
    returning: bool,
    elevators_deployed: bool,
    launchbar_engaged: bool,
    elevator: Actuator,
    jbd: Actuator,
    rel_wind_from_deg: f64,
    rel_wind_speed_kt: f64,
    /// Relative wind angle off the bow, ±180.
    rel_wind_deg: f64,
    flols_source: u8,
    flols_angle_deg: f64,
    flols_distance_m: f64,
}

/// World position and heading of a named deck spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkPosition {
    pub position: GeoPosition,
    pub heading_deg: f64,
}

impl CarrierBehavior {
    pub fn new(params: CarrierParams, kin: &Kinematics, targets: &mut Targets) -> Self {
        targets.heading_lock = true;
        Self {
            ship: ShipKinematics::new(params.ship.clone()),
            box_origin: kin.position,
            base_course_deg: kin.orientation.heading_deg,
            base_speed_kt: kin.speed_kt,
            params,
            mode: CarrierMode::BaseCourse,
            turn_to_launch: false,
            returning: false,
            elevators_deployed: false,
            launchbar_engaged: false,
            elevator: Actuator::default(),
            jbd: Actuator::default(),
            rel_wind_from_deg: 0.0,
            rel_wind_speed_kt: 0.0,
            rel_wind_deg: 0.0,
            flols_source: 0,
            flols_angle_deg: 0.0,
            flols_distance_m: 0.0,
        }
    }

    pub fn set_turn_to_launch(&mut self, enabled: bool) {
        self.turn_to_launch = enabled;
    }

    pub fn set_elevators(&mut self, deployed: bool) {
        self.elevators_deployed = deployed;
    }

    pub fn set_launchbar(&mut self, engaged: bool) {
        self.launchbar_engaged = engaged;
    }

    pub fn mode(&self) -> CarrierMode {
        self.mode
    }

    pub fn in_to_wind(&self) -> bool {
        self.rel_wind_deg.abs() < CARRIER_IN_TO_WIND_DEG
    }

    pub fn flols_angle_deg(&self) -> f64 {
        self.flols_angle_deg
    }

    pub fn detail(&self) -> VariantDetail {
        VariantDetail::Carrier {
            mode: self.mode,
            rel_wind_from_deg: self.rel_wind_from_deg,
            rel_wind_speed_kt: self.rel_wind_speed_kt,
            in_to_wind: self.in_to_wind(),
            wave_off_lights: !self.in_to_wind(),
            elevator_position: self.elevator.position,
            jbd_position: self.jbd.position,
            flols_source: self.flols_source,
            flols_distance_m: self.flols_distance_m,
            tacan_channel_id: self.params.tacan_channel_id.clone(),
        }
    }

    /// Resolve a parking spot. An empty name picks the first one.
    pub fn park_position(&self, name: &str, kin: &Kinematics) -> Option<ParkPosition> {
        let spot = if name.is_empty() {
            self.params.parking_positions.first()
        } else {
            self.params.parking_positions.iter().find(|p| p.name == name)
        }?;
        let [x, y, z] = spot.offset_m;
        let body = DVec3::new(x, y, -z) * M_TO_FT;
        let ned = aitraffic_core::geo::rotate_body_to_ned(&kin.orientation, body);
        Some(ParkPosition {
            position: kin.position.displaced(ned.x, ned.y, -ned.z),
            heading_deg: normalize_heading(kin.orientation.heading_deg + spot.heading_offset_deg),
        })
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let kin = entity.kinematics;
        let targets = entity.targets;

        self.ship.update(kin, targets, dt);
        self.update_wind(kin, ctx);

        if self.turn_to_launch {
            self.mode = CarrierMode::TurnToLaunch;
            let wind = &ctx.viewer.wind;
            targets.heading_deg = normalize_heading(wind.surface_from_deg);
            targets.speed_kt = (CARRIER_LAUNCH_WIND_KT - wind.surface_speed_kt).max(CARRIER_MIN_LAUNCH_SPEED_KT);
        } else if self.outside_box(&kin.position) || self.returning {
            self.mode = CarrierMode::ReturnToBox;
            targets.heading_deg = kin.position.bearing_deg_to(&self.box_origin);
            targets.speed_kt = self.base_speed_kt;
            self.returning = kin.position.distance_ft_to(&self.box_origin) >= CARRIER_BOX_RETURN_NM * FT_PER_NM;
        } else {
            self.mode = CarrierMode::BaseCourse;
            targets.heading_deg = self.base_course_deg;
            targets.speed_kt = self.base_speed_kt;
        }
        targets.heading_lock = true;

        self.elevator.update(
            self.elevators_deployed,
            dt,
            self.params.elevator_transition_secs,
            self.params.elevator_tau_secs,
        );
        self.jbd.update(
            self.launchbar_engaged,
            dt,
            self.params.jbd_transition_secs,
            self.params.jbd_tau_secs,
        );
        self.update_flols(&kin.position, &kin.orientation, &ctx.viewer.position);
        Ok(())
    }

    fn update_wind(&mut self, kin: &Kinematics, ctx: &UpdateContext<'_>) {
        let wind = &ctx.viewer.wind;
        let wind_rad = wind.surface_from_deg.to_radians();
        let hdg_rad = kin.orientation.heading_deg.to_radians();

        // own motion adds a wind from dead ahead
        let from_north = wind_rad.cos() * wind.surface_speed_kt + hdg_rad.cos() * kin.speed_kt;
        let from_east = wind_rad.sin() * wind.surface_speed_kt + hdg_rad.sin() * kin.speed_kt;

        self.rel_wind_speed_kt = (from_north * from_north + from_east * from_east).sqrt();
        self.rel_wind_from_deg = bearing_from_components(from_north, from_east);
        self.rel_wind_deg = normalize_180(self.rel_wind_from_deg - kin.orientation.heading_deg);
    }

    /// The box is relative to the spawn point. All-zero bounds disable it.
    fn outside_box(&self, pos: &GeoPosition) -> bool {
        let p = &self.params;
        if p.max_lat == 0.0 && p.min_lat == 0.0 && p.max_long == 0.0 && p.min_long == 0.0 {
            return false;
        }
        let origin = &self.box_origin;
        let (max_lat, min_lat) = (p.max_lat.abs(), p.min_lat.abs());
        let (max_long, min_long) = (p.max_long.abs(), p.min_long.abs());

        let lat_out = if origin.lat_deg >= 0.0 {
            pos.lat_deg >= origin.lat_deg + max_lat || pos.lat_deg <= origin.lat_deg - min_lat
        } else {
            pos.lat_deg <= origin.lat_deg - max_lat || pos.lat_deg >= origin.lat_deg + min_lat
        };
        let lon_out = if origin.lon_deg >= 0.0 {
            pos.lon_deg >= origin.lon_deg + max_long || pos.lon_deg <= origin.lon_deg - min_long
        } else {
            pos.lon_deg <= origin.lon_deg - max_long || pos.lon_deg >= origin.lon_deg + min_long
        };
        lat_out || lon_out
    }

    fn update_flols(&mut self, pos: &GeoPosition, orientation: &Orientation, eye: &GeoPosition) {
        let (north_ft, east_ft) = pos.offset_ft_to(eye);
        let down_ft = pos.alt_ft - eye.alt_ft;
        let eye_body_m = rotate_ned_to_body(orientation, DVec3::new(north_ft, east_ft, down_ft)) * FT_TO_M;

        let [x, y, z] = self.params.flols_offset_m;
        // lens offset is given with z up
        let rel = eye_body_m - DVec3::new(x, y, -z);
        let dist = rel.length();
        self.flols_distance_m = dist;

        self.flols_angle_deg = if dist < f64::from(f32::MIN_POSITIVE) {
            0.0
        } else {
            (-rel.z / dist).clamp(-1.0, 1.0).asin().to_degrees()
        };
        self.flols_source = flols_source(self.flols_angle_deg);
    }
}

/// Source light (1 high .. 6 low, 0 off the glide slope) for a glide angle.
pub fn flols_source(angle_deg: f64) -> u8 {
    let bands = FLOLS_BANDS_DEG;
    if angle_deg > bands[0] {
        return 0;
    }
    for (i, pair) in bands.windows(2).enumerate() {
        if angle_deg > pair[1] {
            return (i + 1) as u8;
        }
    }
    6
}
