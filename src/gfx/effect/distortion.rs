//! CPU mirror of the distortion vertex stage
//!
//! `vs_main` in `effect.wgsl` applies exactly these steps. Keeping a Rust copy
//! pins the uniform contract down in tests:
//!
//! - the band coordinate is the centroid projected onto the distortion axis
//! - band weight is `1 - smoothstep(0, thickness, |coord - position|)`
//! - the vertex moves along the normalized centroid by
//!   `amount * band * pulse(time, coord)`

use super::uniforms::UniformSet;

/// Smallest band width; keeps smoothstep defined at thickness 0.
pub const MIN_THICKNESS: f32 = 1e-4;

/// Hermite interpolation matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Position of a centroid along the distortion axis.
pub fn band_coordinate(centroid: [f32; 3], axis: [f32; 3]) -> f32 {
    dot(centroid, axis)
}

/// How strongly a triangle at `coord` is affected, in `[0, 1]`.
pub fn band_weight(coord: f32, position: f32, thickness: f32) -> f32 {
    1.0 - smoothstep(0.0, thickness.max(MIN_THICKNESS), (coord - position).abs())
}

/// Animation term, always within `[0.75, 1.25]`.
pub fn pulse(time: f32, coord: f32) -> f32 {
    1.0 + 0.25 * (time * 2.0 + coord * 8.0).sin()
}

/// Displaced position of one vertex.
pub fn displace(
    position: [f32; 3],
    centroid: [f32; 3],
    uniforms: &UniformSet,
    axis: [f32; 3],
) -> [f32; 3] {
    let coord = band_coordinate(centroid, axis);
    let band = band_weight(
        coord,
        uniforms.distortion_position,
        uniforms.distortion_thickness,
    );

    let length = dot(centroid, centroid).sqrt();
    if length <= 1e-6 {
        return position;
    }

    let offset = uniforms.distortion_amount * band * pulse(uniforms.time, coord) / length;
    [
        position[0] + centroid[0] * offset,
        position[1] + centroid[1] * offset,
        position[2] + centroid[2] * offset,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS: [f32; 3] = [0.0, 1.0, 0.0];

    fn uniforms(position: f32, amount: f32, thickness: f32) -> UniformSet {
        UniformSet {
            time: 0.0,
            distortion_position: position,
            distortion_amount: amount,
            distortion_thickness: thickness,
        }
    }

    fn offset_length(a: [f32; 3], b: [f32; 3]) -> f32 {
        let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
        dot(d, d).sqrt()
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let p = [0.3, 0.1, -0.2];
        let c = [0.25, 0.1, -0.15];
        assert_eq!(displace(p, c, &uniforms(0.1, 0.0, 0.5), AXIS), p);
    }

    #[test]
    fn test_amount_scales_displacement_linearly() {
        let p = [0.5, 0.0, 0.5];
        let c = [0.45, 0.05, 0.45];
        let small = offset_length(displace(p, c, &uniforms(0.0, 0.2, 0.5), AXIS), p);
        let large = offset_length(displace(p, c, &uniforms(0.0, 0.4, 0.5), AXIS), p);
        assert!(small > 0.0);
        assert!((large - 2.0 * small).abs() < 1e-5);
    }

    #[test]
    fn test_position_moves_the_band() {
        let low = band_weight(-0.4, -0.4, 0.3);
        let far = band_weight(-0.4, 0.4, 0.3);
        assert_eq!(low, 1.0);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn test_thickness_widens_the_band() {
        let narrow = band_weight(0.2, 0.0, 0.25);
        let wide = band_weight(0.2, 0.0, 0.9);
        assert!(wide > narrow);
        // zero thickness only hits the exact band coordinate
        assert_eq!(band_weight(0.0, 0.0, 0.0), 1.0);
        assert_eq!(band_weight(0.01, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_pulse_bounds() {
        for step in 0..200 {
            let t = step as f32 * 0.137;
            let p = pulse(t, t * 0.3 - 1.0);
            assert!((0.75..=1.25).contains(&p));
        }
    }

    #[test]
    fn test_displacement_follows_centroid_direction() {
        let p = [0.0, 0.0, 0.5];
        let c = [0.0, 0.0, 0.5];
        let moved = displace(p, c, &uniforms(0.0, 0.5, 0.5), AXIS);
        assert_eq!(moved[0], 0.0);
        assert_eq!(moved[1], 0.0);
        assert!(moved[2] > 0.5);
    }

    #[test]
    fn test_centroid_at_origin_is_not_displaced() {
        let p = [0.1, 0.0, 0.0];
        assert_eq!(displace(p, [0.0; 3], &uniforms(0.0, 1.0, 0.5), AXIS), p);
    }
}
