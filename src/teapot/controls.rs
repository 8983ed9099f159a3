//! 曲面细分控制
//!
//! 数字键 1/2 调整细分因子，3/4 切换线框与实体填充。

use tracing::debug;

pub const MIN_TESS_FACTOR: u32 = 1;
pub const MAX_TESS_FACTOR: u32 = 64;

/// 演示响应的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKey {
    /// 1：细分因子减一
    DecreaseTessellation,
    /// 2：细分因子加一
    IncreaseTessellation,
    /// 3：线框
    Wireframe,
    /// 4：实体
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Wireframe,
    Solid,
}

/// 细分因子与填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationControls {
    factor: u32,
    fill_mode: FillMode,
}

impl TessellationControls {
    /// 初始因子会被限制在 `[MIN_TESS_FACTOR, MAX_TESS_FACTOR]`，初始为线框模式
    pub fn new(initial_factor: u32) -> Self {
        Self {
            factor: initial_factor.clamp(MIN_TESS_FACTOR, MAX_TESS_FACTOR),
            fill_mode: FillMode::Wireframe,
        }
    }

    /// 处理一次按键，返回状态是否改变
    pub fn handle_key(&mut self, key: DemoKey) -> bool {
        let before = *self;
        match key {
            DemoKey::DecreaseTessellation => {
                self.factor = self.factor.saturating_sub(1).max(MIN_TESS_FACTOR);
            }
            DemoKey::IncreaseTessellation => {
                self.factor = (self.factor + 1).min(MAX_TESS_FACTOR);
            }
            DemoKey::Wireframe => self.fill_mode = FillMode::Wireframe,
            DemoKey::Solid => self.fill_mode = FillMode::Solid,
        }
        let changed = before != *self;
        if changed {
            debug!(factor = self.factor, fill_mode = ?self.fill_mode, "Tessellation controls changed");
        }
        changed
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    /// 外壳着色器根常量：边缘因子、内部因子
    ///
    /// 外壳着色器把这两个 32 位值按整数读取。
    pub fn root_constants(&self) -> [u32; 2] {
        [self.factor, self.factor]
    }
}

impl Default for TessellationControls {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let controls = TessellationControls::default();
        assert_eq!(controls.factor(), 8);
        assert_eq!(controls.fill_mode(), FillMode::Wireframe);
        assert_eq!(controls.root_constants(), [8, 8]);
    }

    #[test]
    fn test_factor_clamped_to_range() {
        let mut controls = TessellationControls::new(1);
        assert!(!controls.handle_key(DemoKey::DecreaseTessellation));
        assert_eq!(controls.factor(), MIN_TESS_FACTOR);

        let mut controls = TessellationControls::new(64);
        assert!(!controls.handle_key(DemoKey::IncreaseTessellation));
        assert_eq!(controls.factor(), MAX_TESS_FACTOR);

        assert_eq!(TessellationControls::new(0).factor(), 1);
        assert_eq!(TessellationControls::new(1000).factor(), 64);
    }

    #[test]
    fn test_step_and_fill_mode() {
        let mut controls = TessellationControls::new(8);
        assert!(controls.handle_key(DemoKey::IncreaseTessellation));
        assert!(controls.handle_key(DemoKey::IncreaseTessellation));
        assert!(controls.handle_key(DemoKey::DecreaseTessellation));
        assert_eq!(controls.factor(), 9);

        assert!(controls.handle_key(DemoKey::Solid));
        assert_eq!(controls.fill_mode(), FillMode::Solid);
        assert!(!controls.handle_key(DemoKey::Solid));
        assert!(controls.handle_key(DemoKey::Wireframe));
        assert_eq!(controls.fill_mode(), FillMode::Wireframe);
    }

    #[test]
    fn test_root_constants_are_integer_words() {
        let mut controls = TessellationControls::new(8);
        let words: [u32; 2] = bytemuck::cast(controls.root_constants());
        assert_eq!(words, [8, 8]);

        controls.handle_key(DemoKey::IncreaseTessellation);
        let words: [u32; 2] = bytemuck::cast(controls.root_constants());
        assert_eq!(words, [9, 9]);
    }
}
