//! 固定相机与鼠标旋转
//!
//! 相机位于 (0, 0, -10) 看向原点。光标位置映射为整体旋转：
//! 水平方向控制绕 Y 轴，垂直方向控制绕 X 轴，窗口边缘对应 ±180°。

use super::parts::Part;
use crate::math::{deg_to_rad, matrix, Matrix4, Vector3};

pub const FOV_Y_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 100.0;
pub const EYE: [f32; 3] = [0.0, 0.0, -10.0];

/// TeapotTutorial 中整只茶壶相对原点下移一个单位
pub const TUTORIAL_OFFSET_Y: f32 = -1.0;

/// 观察矩阵 × 投影矩阵
pub fn view_projection(width: u32, height: u32) -> Matrix4 {
    let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
    let eye = Vector3::new(EYE[0], EYE[1], EYE[2]);
    let view = matrix::look_at_lh(&eye, &Vector3::zeros(), &Vector3::new(0.0, 1.0, 0.0));
    let proj = matrix::perspective_fov_lh(deg_to_rad(FOV_Y_DEGREES), aspect, NEAR_PLANE, FAR_PLANE);
    view * proj
}

/// 由光标位置得到的旋转角
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseRotation {
    /// 绕 X 轴（由光标 y 决定）
    pub pitch: f32,
    /// 绕 Y 轴（由光标 x 决定）
    pub yaw: f32,
}

impl MouseRotation {
    /// # 参数
    ///
    /// * `cursor` - 客户区坐标（像素）
    /// * `width` / `height` - 客户区大小，为 0 时不旋转
    pub fn from_cursor(cursor: (f64, f64), width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::default();
        }
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        let (x, y) = (cursor.0 as f32, cursor.1 as f32);
        Self {
            yaw: -deg_to_rad((x - half_w) / half_w * 180.0),
            pitch: deg_to_rad((y - half_h) / half_h * 180.0),
        }
    }

    pub fn matrix(&self) -> Matrix4 {
        matrix::rotation_roll_pitch_yaw(self.pitch, self.yaw, 0.0)
    }
}

/// HelloTeapot 单个部件的 MVP
///
/// 部件旋转 × 部件缩放 × 鼠标旋转 × 观察 × 投影（行向量约定）。
pub fn part_mvp(part: &Part, cursor: (f64, f64), width: u32, height: u32) -> Matrix4 {
    part.model_matrix() * MouseRotation::from_cursor(cursor, width, height).matrix() * view_projection(width, height)
}

/// TeapotTutorial 整只茶壶的 MVP
///
/// 模型矩阵 = 鼠标旋转 × 平移 (0, -1, 0)，部件自身的变换在域着色器中完成。
pub fn tutorial_mvp(cursor: (f64, f64), width: u32, height: u32) -> Matrix4 {
    let model = MouseRotation::from_cursor(cursor, width, height).matrix()
        * matrix::translation(0.0, TUTORIAL_OFFSET_Y, 0.0);
    model * view_projection(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector4;
    use crate::teapot::parts::parts;
    use std::f32::consts::PI;

    const SIZE: u32 = 600;
    const CENTER: (f64, f64) = (300.0, 300.0);

    /// 投影矩阵的 y 缩放（正方形窗口下 x 相同）
    fn focal() -> f32 {
        1.0 / (deg_to_rad(FOV_Y_DEGREES) * 0.5).tan()
    }

    /// 行向量点经 `m` 变换后的 NDC 坐标
    fn project(point: [f32; 3], m: &Matrix4) -> [f32; 3] {
        let p = matrix::transform_row(&Vector4::new(point[0], point[1], point[2], 1.0), m);
        [p.x / p.w, p.y / p.w, p.z / p.w]
    }

    fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
        for i in 0..3 {
            assert!(
                (actual[i] - expected[i]).abs() < 1e-4,
                "component {}: {:?} vs {:?}",
                i,
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_centered_cursor_has_no_rotation() {
        let r = MouseRotation::from_cursor((400.0, 300.0), 800, 600);
        assert!(r.pitch.abs() < 1e-6);
        assert!(r.yaw.abs() < 1e-6);
        assert_eq!(r.matrix(), Matrix4::identity());
    }

    #[test]
    fn test_edges_map_to_half_turns() {
        let r = MouseRotation::from_cursor((800.0, 0.0), 800, 600);
        assert!((r.yaw + PI).abs() < 1e-5);
        assert!((r.pitch + PI).abs() < 1e-5);

        let r = MouseRotation::from_cursor((0.0, 600.0), 800, 600);
        assert!((r.yaw - PI).abs() < 1e-5);
        assert!((r.pitch - PI).abs() < 1e-5);
    }

    #[test]
    fn test_zero_sized_client_area() {
        assert_eq!(MouseRotation::from_cursor((10.0, 10.0), 0, 600), MouseRotation::default());
    }

    #[test]
    fn test_origin_projects_to_mid_depth_range() {
        let vp = view_projection(800, 600);
        let p = matrix::transform_row(&crate::math::Vector4::new(0.0, 0.0, 0.0, 1.0), &vp);
        let depth = p.z / p.w;
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn test_mirrored_handle_with_centered_cursor() {
        let handle = parts()[21];
        // (1, 2, 3) 镜像为 (1, -2, 3)，相机空间 z = 13
        let ndc = project([1.0, 2.0, 3.0], &part_mvp(&handle, CENTER, SIZE, SIZE));
        let range = FAR_PLANE / (FAR_PLANE - NEAR_PLANE);
        assert_close(ndc, [focal() / 13.0, -2.0 * focal() / 13.0, range * 12.0 / 13.0]);
    }

    #[test]
    fn test_part_rotation_applies_before_mouse_rotation() {
        // 光标在右边缘：绕 Y 转 -180°
        let rim = parts()[1];
        let ndc = project([1.0, 0.0, 0.0], &part_mvp(&rim, (600.0, 300.0), SIZE, SIZE));
        // 先绕 Z 转 90° 得到 (0, 1, 0)，再绕 Y 旋转不变
        assert!(ndc[0].abs() < 1e-4);
        assert!((ndc[1] - focal() / 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_tutorial_origin_moves_down() {
        let ndc = project([0.0, 0.0, 0.0], &tutorial_mvp(CENTER, SIZE, SIZE));
        let range = FAR_PLANE / (FAR_PLANE - NEAR_PLANE);
        assert_close(ndc, [0.0, -focal() / 10.0, range * 9.0 / 10.0]);
    }

    #[test]
    fn test_tutorial_translation_follows_mouse_rotation() {
        // 光标在下边缘：绕 X 转 180°；平移在旋转之后，原点仍落在 (0, -1, 0)
        let ndc = project([0.0, 0.0, 0.0], &tutorial_mvp((300.0, 600.0), SIZE, SIZE));
        assert!(ndc[0].abs() < 1e-4);
        assert!((ndc[1] + focal() / 10.0).abs() < 1e-4);
    }
}
