//! 运行时错误.
//!
//! 各模块保留自己的错误类型 ([`SweepError`], [`FrameError`], [`PlanError`], [`RenderError`]),
//! 本模块将它们与底层 I/O / CSV / nifti / 图像错误统一为 [`Error`].

use crate::data::frame::FrameError;
use crate::data::SweepError;
use crate::render::RenderError;
use crate::trajectory::PlanError;

/// crate 级错误.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 颅骨扫描表格解析错误.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// nifti 文件读写错误.
    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 图像编码/保存错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 体数据维度不符.
    #[error("volume shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 颅骨扫描数据本身不合法.
    #[error(transparent)]
    Sweep(#[from] SweepError),

    /// 参考系解析失败.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// 轨迹规划失败.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// 渲染参数或数据不合法.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// crate 级 `Result`.
pub type Result<T> = std::result::Result<T, Error>;
