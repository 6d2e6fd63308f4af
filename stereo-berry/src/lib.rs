#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 根据颅骨扫描 (skull sweep) 测量数据计算立体定向手术的植入轨迹, 并提供轻量的可视化.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 坐标约定
//!
//! 所有坐标均以毫米为单位, 由三个分量组成 (见 [`StereoPoint`]):
//! 后 -> 前 (`pa`), 下 -> 上 (`is`), 左 -> 右 (`lr`).
//! 原始表格中的 `superoinferior` 列向下为正, 读入后会翻转.
//!
//! # 注意
//!
//! 1. 轨迹只在矢状面 (PA-IS 平面) 内规划, 入口的 `lr` 与目标一致.
//! 2. 在非期望情况下, 程序返回 `Err` 而不是 panic.
//!
//! # 开发计划
//!
//! ### 颅骨扫描表格读取 ✅
//!
//! csv 表格, 每行包含 ID, 组织, 参考点, 以及相对参考点的偏移量.
//!
//! 实现位于 `stereo-berry/src/data`.
//!
//! ### 参考系解析 ✅
//!
//! 沿参考链累加偏移量, 把每一行换算到同一个最终参考点 (默认 `bregma`) 下.
//! 支持以表中任意一行为新的原点, 支持检测参考环.
//!
//! 实现位于 `stereo-berry/src/data/frame.rs`.
//!
//! ### 入口与植入长度计算 ✅
//!
//! 1. 立体定向角度 (相对于下 -> 上轴) 与后 -> 前轴角度两种约定. ✅
//! 2. 选取离植入轴最近的颅骨点, 以其正交投影为入口. ✅
//! 3. 手动给出切口时直接计算植入长度. ✅
//!
//! 实现位于 `stereo-berry/src/trajectory`.
//!
//! ### 可视化 ✅
//!
//! 1. 矢状面散点图, 输出 PNG. ✅
//! 2. 颅骨点 nii 掩膜. ✅
//! 3. 解剖模板上的叠加图. ✅
//! 4. 图例文字 ⌛️ (目前依赖中没有字体渲染)
//!
//! 实现位于 `stereo-berry/src/render`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度通用三维索引 / 向量.
pub type Idx3dF = (f64, f64, f64);

/// 颅骨扫描数据结构与参考系解析.
pub mod data;

pub use data::{
    resolve_reference_frame, FrameError, ResolvedPoint, ResolvedSweep, SkullSweep, StereoPoint,
    SweepError, SweepRecord, Tissue,
};

pub mod consts;

pub mod dataset;

mod error;

pub use error::{Error, Result};

pub mod prelude;

pub mod render;

pub mod trajectory;

pub use trajectory::{
    implant_length, project_target, AngleConvention, InsertionAngle, PlanError, Target, Trajectory,
};
