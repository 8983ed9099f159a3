//! 数学库模块
//!
//! 基于 `nalgebra`，提供与 DirectXMath 相同约定的矩阵构造函数。
//!
//! # 约定
//!
//! - **行向量**：点变换为 `v' = v * M`，因此组合顺序是 `model * view * projection`
//! - **左手坐标系**：相机看向 +Z
//! - **深度范围**：投影后 z 落在 `[0, 1]`
//! - **存储**：[`to_gpu_layout`] 按行输出，与 `XMFLOAT4X4` 的内存布局一致，
//!   着色器直接读取，不做转置

pub use nalgebra::{Matrix4 as Mat4, Vector3 as Vec3, Vector4 as Vec4};

pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// GPU 常量缓冲区中的 4x4 矩阵（按行存储）
pub type GpuMatrix = [[f32; 4]; 4];

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// 角度转弧度
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * constants::DEG_TO_RAD
}

/// 矩阵辅助函数（行向量约定）
pub mod matrix {
    use super::*;

    /// 平移矩阵，平移量位于第 4 行
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            x, y, z, 1.0,
        )
    }

    /// 缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 绕 X 轴旋转
    pub fn rotation_x(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c, s, 0.0,
            0.0, -s, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 绕 Y 轴旋转
    pub fn rotation_y(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        Matrix4::new(
            c, 0.0, -s, 0.0,
            0.0, 1.0, 0.0, 0.0,
            s, 0.0, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 绕 Z 轴旋转
    pub fn rotation_z(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        Matrix4::new(
            c, s, 0.0, 0.0,
            -s, c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 先绕 Z（roll），再绕 X（pitch），最后绕 Y（yaw）
    ///
    /// 与 `XMMatrixRotationRollPitchYaw(pitch, yaw, roll)` 相同。
    pub fn rotation_roll_pitch_yaw(pitch: f32, yaw: f32, roll: f32) -> Matrix4 {
        rotation_z(roll) * rotation_x(pitch) * rotation_y(yaw)
    }

    /// 左手透视投影
    ///
    /// # 参数
    ///
    /// * `fov_y` - 垂直视场角（弧度）
    /// * `aspect` - 宽高比
    /// * `near` / `far` - 近、远裁剪面，映射到深度 0 和 1
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        let h = 1.0 / (fov_y * 0.5).tan();
        let w = h / aspect;
        let range = far / (far - near);
        Matrix4::new(
            w, 0.0, 0.0, 0.0,
            0.0, h, 0.0, 0.0,
            0.0, 0.0, range, 1.0,
            0.0, 0.0, -range * near, 0.0,
        )
    }

    /// 左手观察矩阵
    pub fn look_at_lh(eye: &Vector3, focus: &Vector3, up: &Vector3) -> Matrix4 {
        let z = (focus - eye).normalize();
        let x = up.cross(&z).normalize();
        let y = z.cross(&x);
        Matrix4::new(
            x.x, y.x, z.x, 0.0,
            x.y, y.y, z.y, 0.0,
            x.z, y.z, z.z, 0.0,
            -x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0,
        )
    }

    /// 行向量乘矩阵：`[x, y, z, w] * m`
    pub fn transform_row(v: &Vector4, m: &Matrix4) -> Vector4 {
        (v.transpose() * m).transpose()
    }
}

/// 转换为着色器读取的按行布局
pub fn to_gpu_layout(m: &Matrix4) -> GpuMatrix {
    let mut out = [[0.0; 4]; 4];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    out
}

/// 常量缓冲区视图要求 256 字节对齐
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 256;

/// 向上取整到常量缓冲区对齐
pub const fn align_to_constant_buffer(size: usize) -> usize {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

#[cfg(test)]
mod tests {
    use super::matrix::*;
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn assert_vec(v: Vector4, expected: [f32; 4]) {
        for i in 0..4 {
            assert!(approx(v[i], expected[i]), "{:?} != {:?}", v, expected);
        }
    }

    #[test]
    fn test_translation_lives_in_last_row() {
        let m = translation(1.0, -2.0, 3.0);
        let gpu = to_gpu_layout(&m);
        assert_eq!(gpu[3], [1.0, -2.0, 3.0, 1.0]);

        let p = transform_row(&Vector4::new(1.0, 1.0, 1.0, 1.0), &m);
        assert_vec(p, [2.0, -1.0, 4.0, 1.0]);
    }

    #[test]
    fn test_axis_rotations() {
        let quarter = deg_to_rad(90.0);
        let x = Vector4::new(1.0, 0.0, 0.0, 0.0);
        let y = Vector4::new(0.0, 1.0, 0.0, 0.0);

        assert_vec(transform_row(&x, &rotation_z(quarter)), [0.0, 1.0, 0.0, 0.0]);
        assert_vec(transform_row(&y, &rotation_x(quarter)), [0.0, 0.0, 1.0, 0.0]);
        assert_vec(transform_row(&x, &rotation_y(quarter)), [0.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_roll_pitch_yaw_order() {
        let quarter = deg_to_rad(90.0);
        // pitch 把 +Y 转到 +Z，yaw 再把 +Z 转到 +X
        let m = rotation_roll_pitch_yaw(quarter, quarter, 0.0);
        let v = transform_row(&Vector4::new(0.0, 1.0, 0.0, 0.0), &m);
        assert_vec(v, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_fov_lh(deg_to_rad(45.0), 4.0 / 3.0, 1.0, 100.0);

        let near = transform_row(&Vector4::new(0.0, 0.0, 1.0, 1.0), &proj);
        assert!(approx(near.z / near.w, 0.0));

        let far = transform_row(&Vector4::new(0.0, 0.0, 100.0, 1.0), &proj);
        assert!(approx(far.z / far.w, 1.0));
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vector3::new(0.0, 0.0, -10.0);
        let view = look_at_lh(&eye, &Vector3::zeros(), &Vector3::new(0.0, 1.0, 0.0));

        let e = transform_row(&Vector4::new(eye.x, eye.y, eye.z, 1.0), &view);
        assert_vec(e, [0.0, 0.0, 0.0, 1.0]);

        let origin = transform_row(&Vector4::new(0.0, 0.0, 0.0, 1.0), &view);
        assert_vec(origin, [0.0, 0.0, 10.0, 1.0]);
    }

    #[test]
    fn test_constant_buffer_alignment() {
        assert_eq!(align_to_constant_buffer(64), 256);
        assert_eq!(align_to_constant_buffer(256), 256);
        assert_eq!(align_to_constant_buffer(257), 512);
        assert_eq!(align_to_constant_buffer(0), 0);
    }
}
