//! 茶壶部件表
//!
//! 把 9 个不重复的面片展开成 28 个放置好的部件：
//! 壶口、壶身、盖子绕 Z 轴每 90° 画一次，手柄和壶嘴各画一次原样、一次沿 Y 镜像。

use super::data::{CONTROL_POINTS_PER_PATCH, PATCHES};
use crate::math::{deg_to_rad, matrix, to_gpu_layout, GpuMatrix, Matrix4};

/// 部件总数
pub const PART_COUNT: usize = 28;

/// 部件所属的组，决定颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartGroup {
    Rim,
    Body,
    Lid,
    Handle,
    Spout,
}

impl PartGroup {
    /// 组的调试颜色 (RGB)
    pub fn color(self) -> [f32; 3] {
        match self {
            PartGroup::Rim => [0.9, 0.8, 0.2],
            PartGroup::Body => [0.8, 0.3, 0.2],
            PartGroup::Lid => [0.2, 0.5, 0.9],
            PartGroup::Handle => [0.6, 0.3, 0.8],
            PartGroup::Spout => [0.2, 0.8, 0.6],
        }
    }
}

/// 一个放置好的面片
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Part {
    /// `PATCHES` 中的下标
    pub patch: usize,
    pub group: PartGroup,
    /// 绕 Z 轴旋转（角度）
    pub rotation_z_degrees: f32,
    pub scale: [f32; 3],
}

const IDENTITY_SCALE: [f32; 3] = [1.0, 1.0, 1.0];
const MIRROR_Y: [f32; 3] = [1.0, -1.0, 1.0];

impl Part {
    /// 部件自身的模型矩阵：先旋转，再缩放
    pub fn model_matrix(&self) -> Matrix4 {
        let [sx, sy, sz] = self.scale;
        matrix::rotation_roll_pitch_yaw(0.0, 0.0, deg_to_rad(self.rotation_z_degrees))
            * matrix::scaling(sx, sy, sz)
    }

    /// 该部件的 16 个控制点下标
    pub fn indices(&self) -> &'static [u32; CONTROL_POINTS_PER_PATCH] {
        &PATCHES[self.patch]
    }
}

/// 按绘制顺序返回全部部件
pub fn parts() -> Vec<Part> {
    let mut parts = Vec::with_capacity(PART_COUNT);

    let rotated = [(0usize, PartGroup::Rim), (1, PartGroup::Body), (2, PartGroup::Body), (3, PartGroup::Lid), (4, PartGroup::Lid)];
    for (patch, group) in rotated {
        for quarter in 0..4 {
            parts.push(Part {
                patch,
                group,
                rotation_z_degrees: 90.0 * quarter as f32,
                scale: IDENTITY_SCALE,
            });
        }
    }

    let mirrored = [(5usize, PartGroup::Handle), (6, PartGroup::Handle), (7, PartGroup::Spout), (8, PartGroup::Spout)];
    for (patch, group) in mirrored {
        for scale in [IDENTITY_SCALE, MIRROR_Y] {
            parts.push(Part {
                patch,
                group,
                rotation_z_degrees: 0.0,
                scale,
            });
        }
    }

    parts
}

/// 所有部件的控制点下标依次拼接，每 16 个为一个面片
pub fn flattened_indices(parts: &[Part]) -> Vec<u32> {
    parts.iter().flat_map(|p| p.indices().iter().copied()).collect()
}

/// 每个部件的模型矩阵（GPU 布局），与 `SV_PrimitiveID` 一一对应
pub fn part_transforms(parts: &[Part]) -> Vec<GpuMatrix> {
    parts.iter().map(|p| to_gpu_layout(&p.model_matrix())).collect()
}

/// 每个部件的颜色
pub fn part_colors(parts: &[Part]) -> Vec<[f32; 3]> {
    parts.iter().map(|p| p.group.color()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{matrix::transform_row, Vector4};

    #[test]
    fn test_part_count_and_order() {
        let parts = parts();
        assert_eq!(parts.len(), PART_COUNT);

        let patch_order: Vec<usize> = parts.iter().map(|p| p.patch).collect();
        assert_eq!(&patch_order[..4], &[0, 0, 0, 0]);
        assert_eq!(&patch_order[20..], &[5, 5, 6, 6, 7, 7, 8, 8]);

        let angles: Vec<f32> = parts[4..8].iter().map(|p| p.rotation_z_degrees).collect();
        assert_eq!(angles, vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn test_every_patch_drawn() {
        let parts = parts();
        for patch in 0..PATCHES.len() {
            assert!(parts.iter().any(|p| p.patch == patch));
        }
    }

    #[test]
    fn test_flattened_indices() {
        let parts = parts();
        let indices = flattened_indices(&parts);
        assert_eq!(indices.len(), PART_COUNT * CONTROL_POINTS_PER_PATCH);
        assert_eq!(&indices[..16], &PATCHES[0]);
        assert_eq!(&indices[indices.len() - 16..], &PATCHES[8]);
    }

    #[test]
    fn test_one_transform_and_color_per_part() {
        let parts = parts();
        assert_eq!(part_transforms(&parts).len(), PART_COUNT);
        assert_eq!(part_colors(&parts).len(), PART_COUNT);
        assert_eq!(part_colors(&parts)[0], PartGroup::Rim.color());
    }

    #[test]
    fn test_mirrored_part_flips_y() {
        let handle = parts()[21];
        assert_eq!(handle.scale, MIRROR_Y);

        let p = transform_row(&Vector4::new(-1.6, -0.3, 2.025, 1.0), &handle.model_matrix());
        assert!((p.y - 0.3).abs() < 1e-6);
        assert!((p.x + 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_quarter_turn_maps_quadrants() {
        // 旋转 90° 后 (r, 0) 落到 (0, r)
        let rim = parts()[1];
        let p = transform_row(&Vector4::new(1.4, 0.0, 2.4, 1.0), &rim.model_matrix());
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 1.4).abs() < 1e-5);
        assert!((p.z - 2.4).abs() < 1e-6);
    }
}
