use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Remote frame <-> vehicle-local frame
//
// Remote: forward = +X, left = +Y, up = +Z, rates in rad/s.
// Local:  right = +X, up = +Y, forward = +Z, yaw rate in deg/s.
//
// Vectors go through the permutation matrix M (remote -> local),
// orientations through the similarity transform Mᵀ R M. det M = -1, and
// conjugating a proper rotation by it still gives a proper rotation.
// ---------------------------------------------------------------------------

/// Remote → local axis map.
pub fn remote_to_local_matrix() -> Matrix3<f64> {
    Matrix3::new(
        0.0, -1.0, 0.0,
        0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,
    )
}

pub fn remote_to_local(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-v.y, v.z, v.x)
}

pub fn local_to_remote(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.z, -v.x, v.y)
}

/// Remote yaw rate (rad/s) to local yaw rate (deg/s). The sign passes
/// through unchanged.
pub fn yaw_rate_remote_to_local(rad_per_sec: f64) -> f64 {
    rad_per_sec.to_degrees()
}

pub fn yaw_rate_local_to_remote(deg_per_sec: f64) -> f64 {
    deg_per_sec.to_radians()
}

/// Express a local body→world orientation in the remote frame, so that
/// `remote * local_to_remote(v) == local_to_remote(local * v)` for every `v`.
pub fn orientation_local_to_remote(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let m = remote_to_local_matrix();
    let r = m.transpose() * q.to_rotation_matrix().into_inner() * m;
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    // Inverse of `orientation_local_to_remote`; only the IMU publishes
    // orientations, and it only goes local -> remote.
    fn orientation_remote_to_local(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        let m = remote_to_local_matrix();
        let r = m * q.to_rotation_matrix().into_inner() * m.transpose();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r))
    }

    #[test]
    fn remap_is_exact() {
        let local = remote_to_local(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(local, Vector3::new(-2.0, 3.0, 1.0));
        assert_eq!(yaw_rate_remote_to_local(FRAC_PI_2), 90.0);
        assert_eq!(yaw_rate_remote_to_local(-PI), -180.0);
        assert_eq!(yaw_rate_local_to_remote(90.0), FRAC_PI_2);
    }

    #[test]
    fn matrix_agrees_with_component_form() {
        let v = Vector3::new(0.3, -1.7, 2.5);
        assert_eq!(remote_to_local_matrix() * v, remote_to_local(&v));
        assert_eq!(local_to_remote(&remote_to_local(&v)), v);
        assert_relative_eq!(remote_to_local_matrix().determinant(), -1.0);
    }

    #[test]
    fn named_axes_line_up() {
        // remote forward/left/up → local forward/left/up
        assert_eq!(remote_to_local(&Vector3::x()), Vector3::z());
        assert_eq!(remote_to_local(&Vector3::y()), -Vector3::x());
        assert_eq!(remote_to_local(&Vector3::z()), Vector3::y());
    }

    #[test]
    fn identity_orientation_maps_to_identity() {
        let q = orientation_local_to_remote(&UnitQuaternion::identity());
        assert_relative_eq!(q.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn orientation_conversion_commutes_with_vector_map() {
        let rotations = [
            UnitQuaternion::from_euler_angles(0.3, -0.8, 1.9),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 2.5),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI),
        ];
        let vectors = [Vector3::x(), Vector3::new(0.2, -0.4, 0.9), Vector3::new(-3.0, 1.0, 0.5)];
        for q in &rotations {
            let remote = orientation_local_to_remote(q);
            assert_relative_eq!(remote.quaternion().norm(), 1.0, epsilon = 1e-12);
            for v in &vectors {
                assert_relative_eq!(
                    remote * local_to_remote(v),
                    local_to_remote(&(q * v)),
                    epsilon = 1e-12
                );
            }
            let back = orientation_remote_to_local(&remote);
            assert_relative_eq!(back.angle_to(q), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn heading_right_points_remote_forward_to_minus_y() {
        // Local: nose swung from +Z to +X (facing right).
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        assert_relative_eq!(q * Vector3::z(), Vector3::x(), epsilon = 1e-12);
        let remote = orientation_local_to_remote(&q);
        assert_relative_eq!(remote * Vector3::x(), -Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(remote * Vector3::z(), Vector3::z(), epsilon = 1e-12);
    }
}
