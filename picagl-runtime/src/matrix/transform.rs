//! Elementary transform matrices, built the way the fixed-function API
//! defines them. Callers right-multiply the current matrix by the result.

use crate::error::GlError;
use glam::{Mat4, Vec3, Vec4};

pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

/// Rotation of `degrees` around `(x, y, z)`. The axis is normalized first;
/// a zero-length axis has no direction and is rejected.
pub fn rotation(degrees: f32, x: f32, y: f32, z: f32) -> Result<Mat4, GlError> {
    let axis = Vec3::new(x, y, z).try_normalize().ok_or_else(|| {
        log::warn!("rotation about a zero-length axis");
        GlError::InvalidValue
    })?;
    Ok(Mat4::from_axis_angle(axis, degrees.to_radians()))
}

/// Orthographic projection mapping the box onto [-1, 1] on every axis.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<Mat4, GlError> {
    if left == right || bottom == top || near == far {
        return Err(GlError::InvalidValue);
    }
    Ok(Mat4::orthographic_rh_gl(left, right, bottom, top, near, far))
}

/// Perspective projection from the near-plane rectangle.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<Mat4, GlError> {
    if left == right || bottom == top || near == far || near <= 0.0 || far <= 0.0 {
        return Err(GlError::InvalidValue);
    }
    let (w, h, d) = (right - left, top - bottom, far - near);
    // Column-major, as glFrustum documents it.
    Ok(Mat4::from_cols(
        Vec4::new(2.0 * near / w, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / h, 0.0, 0.0),
        Vec4::new((right + left) / w, (top + bottom) / h, -(far + near) / d, -1.0),
        Vec4::new(0.0, 0.0, -2.0 * far * near / d, 0.0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn rotation_normalizes_axis() {
        let unit = rotation(90.0, 0.0, 0.0, 1.0).unwrap();
        let long = rotation(90.0, 0.0, 0.0, 5.0).unwrap();
        assert!(close(unit, long));
        let x = unit.transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn zero_axis_is_rejected() {
        assert_eq!(rotation(45.0, 0.0, 0.0, 0.0), Err(GlError::InvalidValue));
    }

    #[test]
    fn ortho_maps_box_to_clip_cube() {
        let m = ortho(0.0, 400.0, 0.0, 240.0, -1.0, 1.0).unwrap();
        let corner = m.project_point3(Vec3::new(400.0, 240.0, -1.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), 1e-5));
        assert_eq!(ortho(1.0, 1.0, 0.0, 1.0, 0.0, 1.0), Err(GlError::InvalidValue));
    }

    #[test]
    fn frustum_maps_near_plane() {
        let m = frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0).unwrap();
        let near = m.project_point3(Vec3::new(1.0, 1.0, -1.0));
        assert!(near.abs_diff_eq(Vec3::new(1.0, 1.0, -1.0), 1e-5));
        let far = m.project_point3(Vec3::new(0.0, 0.0, -10.0));
        assert!((far.z - 1.0).abs() < 1e-5);
        assert_eq!(frustum(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0), Err(GlError::InvalidValue));
    }

    #[test]
    fn translate_then_scale_compose_on_the_right() {
        let m = translation(1.0, 2.0, 3.0) * scaling(2.0, 2.0, 2.0);
        let p = m.transform_point3(Vec3::ONE);
        assert!(p.abs_diff_eq(Vec3::new(3.0, 4.0, 5.0), 1e-6));
    }
}
