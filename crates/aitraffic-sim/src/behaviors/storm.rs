//! Storm cell: drifts at constant heading and speed.

use aitraffic_core::error::BehaviorFault;
use aitraffic_core::params::StormParams;
use aitraffic_core::state::VariantDetail;

use super::{advance_position, EntityMut, UpdateContext};

#[derive(Debug)]
pub struct StormBehavior {
    params: StormParams,
}

impl StormBehavior {
    pub fn new(params: StormParams) -> Self {
        Self { params }
    }

    pub fn strength_fps(&self) -> f64 {
        self.params.strength_fps
    }

    pub fn detail(&self) -> VariantDetail {
        VariantDetail::Storm {
            diameter_ft: self.params.diameter_ft,
            height_ft: self.params.height_ft,
            turbulence: self.params.turbulence,
            lightning: self.params.lightning,
        }
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        if ctx.dt <= 0.0 {
            return Ok(());
        }
        advance_position(entity.kinematics, ctx.dt);
        Ok(())
    }
}
