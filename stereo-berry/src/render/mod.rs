//! 轻量渲染.
//!
//! 1. 矢状面散点图 ([`YzPlot`]), 直接输出 PNG;
//! 2. 颅骨点的 NIfTI 掩膜 ([`make_mask`], [`save_mask`]);
//! 3. 解剖模板上的叠加图 ([`OverlayPlot`]).
//!
//! 所有图像都不带图例文字.

mod canvas;
mod nii;
mod overlay;
mod save;
mod window;
mod yz;

pub use canvas::{Canvas, Viewport, MAX_SIDE};
pub use nii::{make_mask, save_mask, NiftiHeaderAttr, TemplateVolume, VoxelGrid};
pub use overlay::OverlayPlot;
pub use save::ImgWriteVis;
pub use window::IntensityWindow;
pub use yz::YzPlot;

/// 渲染错误.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// 没有任何可绘制的有限坐标.
    #[error("nothing to draw")]
    EmptyScene,

    /// 像素缩放比例不是正的有限值.
    #[error("invalid pixel scale {0} px/mm")]
    InvalidScale(f64),

    /// 画布过大.
    #[error("canvas of {0}x{1} px exceeds the {max} px limit", max = MAX_SIDE)]
    TooLarge(u32, u32),

    /// 体素到世界坐标的仿射变换不可逆.
    #[error("voxel-to-world affine is singular")]
    SingularAffine,

    /// 头文件中的维度与体数据形状不符.
    #[error("header dimensions {0:?} do not match data shape {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// 模板所有体素强度相同, 无法自动确定灰度窗口.
    #[error("template intensity is flat")]
    FlatTemplate,
}
