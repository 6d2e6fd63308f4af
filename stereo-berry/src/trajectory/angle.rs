//! 矢状面 (PA-IS 平面) 上的植入角度.
//!
//! 以目标点为原点, 植入轴是一条过目标点的直线. 我们总是用指向颅骨方向
//! (即 `is` 分量为正) 的单位向量来描述它.

use std::fmt::Formatter;

use super::PlanError;
use crate::data::StereoPoint;

/// 判定植入轴为水平的阈值.
const HORIZONTAL_EPS: f64 = 1e-9;

/// 弧度转换为角度.
#[inline]
pub(crate) fn arc_to_angle(arc: f64) -> f64 {
    arc * 180.0 * std::f64::consts::FRAC_1_PI
}

/// 角度转换为弧度.
#[inline]
pub(crate) fn angle_to_arc(angle: f64) -> f64 {
    angle * std::f64::consts::PI / 180.0
}

/// 角度的度量方式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum AngleConvention {
    /// 相对于下 -> 上轴测量 (立体定向仪的习惯).
    ///
    /// 0° 为自上而下垂直插入, 正角度使入口偏向后方. 取值范围 `(-90, 90)`.
    #[default]
    Stereotaxic,

    /// 相对于后 -> 前轴测量.
    ///
    /// 0° 表示植入物由后向前水平前进, 180° 表示由前向后. 植入轴不能是水平的.
    Posteroanterior,
}

/// 矢状面上的植入角度 (单位: 度).
#[derive(Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct InsertionAngle {
    degrees: f64,
    convention: AngleConvention,
}

/// 压缩到一行.
impl std::fmt::Debug for InsertionAngle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "InsertionAngle {{ {}°, {:?} }}", self.degrees, self.convention)
    }
}

/// 与原始输入一致, 如 `45°`.
impl std::fmt::Display for InsertionAngle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees)
    }
}

impl InsertionAngle {
    /// 按照 `convention` 解释 `degrees`.
    ///
    /// # 返回值
    ///
    /// - `degrees` 非有限值, 或立体定向角度不在 `(-90, 90)` 内时,
    ///   返回 `Err(PlanError::InvalidAngle)`;
    /// - 植入轴水平时返回 `Err(PlanError::HorizontalAxis)`.
    pub fn new(degrees: f64, convention: AngleConvention) -> Result<Self, PlanError> {
        if !degrees.is_finite() {
            return Err(PlanError::InvalidAngle(degrees));
        }
        if convention == AngleConvention::Stereotaxic && !(-90.0 < degrees && degrees < 90.0) {
            return Err(PlanError::InvalidAngle(degrees));
        }
        let ans = Self {
            degrees,
            convention,
        };
        if ans.raw_direction().1.abs() < HORIZONTAL_EPS {
            return Err(PlanError::HorizontalAxis(degrees));
        }
        Ok(ans)
    }

    /// 立体定向角度 (相对于下 -> 上轴).
    #[inline]
    pub fn stereotaxic(degrees: f64) -> Result<Self, PlanError> {
        Self::new(degrees, AngleConvention::Stereotaxic)
    }

    /// 相对于后 -> 前轴的角度.
    #[inline]
    pub fn posteroanterior(degrees: f64) -> Result<Self, PlanError> {
        Self::new(degrees, AngleConvention::Posteroanterior)
    }

    /// 由植入轴上指向颅骨的任意向量 `(pa, is)` 反推立体定向角度.
    ///
    /// 向量不指向上方时返回 `Err(PlanError::InvalidAngle)`.
    pub fn from_direction(pa: f64, is: f64) -> Result<Self, PlanError> {
        if is.is_nan() || is <= 0.0 {
            return Err(PlanError::InvalidAngle(arc_to_angle(f64::atan2(-pa, is))));
        }
        // `+ 0.0` 消除 `-0°`.
        Self::stereotaxic(arc_to_angle(f64::atan2(-pa, is)) + 0.0)
    }

    /// 原始输入角度值.
    #[inline]
    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// 度量方式.
    #[inline]
    pub fn convention(&self) -> AngleConvention {
        self.convention
    }

    /// 换算为立体定向角度 (相对于下 -> 上轴, 范围 `(-90, 90)`).
    pub fn stereotaxic_degrees(&self) -> f64 {
        let (pa, is) = self.direction_2d();
        arc_to_angle(f64::atan2(-pa, is))
    }

    /// 植入轴在 PA-IS 平面上指向颅骨的单位方向向量, `lr` 分量为 0.
    #[inline]
    pub fn direction(&self) -> StereoPoint {
        let (pa, is) = self.direction_2d();
        StereoPoint::sagittal(pa, is)
    }

    fn direction_2d(&self) -> (f64, f64) {
        let (pa, is) = self.raw_direction();
        if is < 0.0 {
            (-pa, -is)
        } else {
            (pa, is)
        }
    }

    /// 未经翻转的方向向量.
    fn raw_direction(&self) -> (f64, f64) {
        // 植入轴与后 -> 前轴的夹角.
        let line = match self.convention {
            AngleConvention::Stereotaxic => self.degrees + 90.0,
            AngleConvention::Posteroanterior => 180.0 - self.degrees,
        };
        let arc = angle_to_arc(line);
        (arc.cos(), arc.sin())
    }
}
