use crate::config::FlightConfig;
use crate::flyer::Flyer;

/// Per-tick displacement before the upward correction, clamped to terminal
/// velocity in either direction.
pub fn raw_displacement(velocity: f32, tick_count: u32, params: &FlightConfig) -> f32 {
    let t = tick_count as f32;
    let d = velocity * t + 0.5 * params.gravity * t * t;
    if d.abs() >= params.terminal_velocity {
        params.terminal_velocity.copysign(d)
    } else {
        d
    }
}

/// Advance one flyer by one tick. Returns the displacement applied.
pub fn advance(flyer: &mut Flyer, params: &FlightConfig) -> f32 {
    flyer.tick_count += 1;

    let mut displacement = raw_displacement(flyer.velocity, flyer.tick_count, params);
    if displacement < 0.0 {
        displacement -= params.upward_correction;
    }
    flyer.y += displacement;

    flyer.tilt = next_tilt(flyer, displacement, params);
    displacement
}

/// Apply an impulse.
pub fn jump(flyer: &mut Flyer, params: &FlightConfig) {
    flyer.velocity = params.jump_impulse;
    flyer.tick_count = 0;
    flyer.jump_height = flyer.y;
}

fn next_tilt(flyer: &Flyer, displacement: f32, params: &FlightConfig) -> f32 {
    if displacement < 0.0 || flyer.y < flyer.jump_height + params.tilt_hold_drop {
        flyer.tilt.max(params.max_tilt)
    } else {
        (flyer.tilt - params.tilt_decay).max(params.min_tilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn jump_resets_velocity_and_tick_count() {
        let params = FlightConfig::default();
        let mut f = Flyer::new(130.0, 250.0);
        for _ in 0..5 {
            advance(&mut f, &params);
        }
        jump(&mut f, &params);
        assert_eq!(f.velocity, -10.5);
        assert_eq!(f.tick_count, 0);
        assert_eq!(f.jump_height, f.y);
    }

    #[test]
    fn first_tick_after_jump_rises_eleven() {
        let params = FlightConfig::default();
        let mut f = Flyer::new(130.0, 250.0);
        jump(&mut f, &params);
        let d = advance(&mut f, &params);
        assert_eq!(f.tick_count, 1);
        assert_eq!(d, -11.0);
        assert_eq!(f.y, 239.0);
    }

    #[test]
    fn free_fall_reaches_terminal_velocity() {
        let params = FlightConfig::default();
        let mut f = Flyer::new(130.0, 250.0);
        let steps: Vec<f32> = (0..6).map(|_| advance(&mut f, &params)).collect();
        assert_eq!(steps, vec![1.5, 6.0, 13.5, 16.0, 16.0, 16.0]);
        assert_eq!(f.y, 250.0 + 69.0);
    }

    #[test]
    fn upward_clamp_applies_before_correction() {
        let params = FlightConfig::default();
        // -10.5 * 3 + 1.5 * 9 = -18 -> clamped to -16, then corrected.
        assert_eq!(raw_displacement(-10.5, 3, &params), -16.0);
        let mut f = Flyer::new(0.0, 300.0);
        jump(&mut f, &params);
        f.tick_count = 2;
        assert_eq!(advance(&mut f, &params), -18.0);
    }

    #[test]
    fn tilt_is_cosmetic_and_bounded() {
        let params = FlightConfig::default();
        let mut f = Flyer::new(130.0, 250.0);
        jump(&mut f, &params);
        advance(&mut f, &params);
        assert_eq!(f.tilt, 25.0);

        let mut g = Flyer::new(130.0, 250.0);
        for _ in 0..40 {
            advance(&mut g, &params);
        }
        assert_eq!(g.tilt, -90.0);

        // Same trajectory regardless of tilt history.
        let mut h = Flyer::new(130.0, 250.0);
        h.tilt = 17.0;
        for _ in 0..40 {
            advance(&mut h, &params);
        }
        assert_eq!(h.y, g.y);
    }

    proptest! {
        #[test]
        fn clamped_displacement_never_exceeds_terminal(
            velocity in -30.0f32..30.0,
            ticks in 1u32..200,
        ) {
            let params = FlightConfig::default();
            let d = raw_displacement(velocity, ticks, &params);
            prop_assert!(d.abs() <= params.terminal_velocity);
            let t = ticks as f32;
            let unclamped = velocity * t + 1.5 * t * t;
            if unclamped.abs() >= params.terminal_velocity {
                prop_assert_eq!(d.abs(), params.terminal_velocity);
            }
        }
    }
}
