//! 通用常量.

/// 默认的最终参考点. 所有坐标最终都以前囟 (bregma) 为原点.
pub const DEFAULT_REFERENCE: &str = "bregma";

/// 原始数据表中, 手动记录的切口 (entry point) 所在行的 ID.
pub const INCISION_ID: &str = "incision";

/// 默认的 40 微米解剖模板文件名. 用于背景渲染.
pub const TEMPLATE_40UM: &str = "DSURQEc_40micron_average.nii";

/// 默认的 200 微米解剖模板文件名. 用于构建颅骨掩膜.
pub const TEMPLATE_200UM: &str = "DSURQEc_200micron_average.nii";

/// 三通道颜色.
pub mod color {
    /// RGB 颜色.
    pub type Rgb = [u8; 3];

    /// 黑色.
    pub const BLACK: Rgb = [0x00, 0x00, 0x00];

    /// 白色.
    pub const WHITE: Rgb = [0xFF, 0xFF, 0xFF];

    /// 颅骨点颜色 (灰色).
    pub const SKULL: Rgb = [0x90, 0x90, 0x90];

    /// 脑区点颜色 (黄色).
    pub const BRAIN: Rgb = [0xBF, 0xBF, 0x00];

    /// 目标点颜色 (橙色).
    pub const TARGET: Rgb = [0xFF, 0xA5, 0x00];

    /// 模板叠加图中目标点的颜色.
    pub const TARGET_MARKER: Rgb = [0xE5, 0xE5, 0x20];

    /// 植入物及植入轴颜色 (青色).
    pub const IMPLANT: Rgb = [0x00, 0xBF, 0xBF];

    /// 切口颜色 (红色).
    pub const INCISION: Rgb = [0xFF, 0x00, 0x00];
}
