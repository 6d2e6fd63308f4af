//! 立体定向坐标.
//!
//! 三个分量分别是:
//!
//! 1. `pa`: 后 -> 前 (posteroanterior) 方向, 向前为正;
//! 2. `is`: 下 -> 上 (inferosuperior) 方向, 向上为正;
//! 3. `lr`: 左 -> 右 (leftright) 方向, 向右为正.
//!
//! 单位均为毫米.

use std::fmt::Formatter;
use std::ops::{Add, Mul, Neg, Sub};

use crate::data::Tissue;
use crate::Idx3dF;

/// 立体定向坐标系中的一个点 (或向量).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct StereoPoint {
    /// 后 -> 前.
    pub pa: f64,
    /// 下 -> 上.
    pub is: f64,
    /// 左 -> 右.
    pub lr: f64,
}

impl StereoPoint {
    /// 原点.
    pub const ORIGIN: StereoPoint = StereoPoint::new(0.0, 0.0, 0.0);

    /// 按照 `(pa, is, lr)` 的顺序构建.
    #[inline]
    pub const fn new(pa: f64, is: f64, lr: f64) -> Self {
        Self { pa, is, lr }
    }

    /// 矢状面 (PA-IS 平面) 上的点, `lr` 为 0.
    #[inline]
    pub const fn sagittal(pa: f64, is: f64) -> Self {
        Self::new(pa, is, 0.0)
    }

    /// 点积.
    #[inline]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.pa * rhs.pa + self.is * rhs.is + self.lr * rhs.lr
    }

    /// 向量长度.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// 两点间的欧几里得距离.
    #[inline]
    pub fn distance(&self, rhs: &Self) -> f64 {
        (*self - *rhs).norm()
    }

    /// 三个分量是否都是有限值?
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.pa.is_finite() && self.is.is_finite() && self.lr.is_finite()
    }
}

impl From<Idx3dF> for StereoPoint {
    #[inline]
    fn from((pa, is, lr): Idx3dF) -> Self {
        Self::new(pa, is, lr)
    }
}

impl Add for StereoPoint {
    type Output = StereoPoint;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.pa + rhs.pa, self.is + rhs.is, self.lr + rhs.lr)
    }
}

impl Sub for StereoPoint {
    type Output = StereoPoint;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.pa - rhs.pa, self.is - rhs.is, self.lr - rhs.lr)
    }
}

impl Neg for StereoPoint {
    type Output = StereoPoint;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.pa, -self.is, -self.lr)
    }
}

impl Mul<f64> for StereoPoint {
    type Output = StereoPoint;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.pa * rhs, self.is * rhs, self.lr * rhs)
    }
}

/// 压缩到一行, 保留两位小数.
impl std::fmt::Display for StereoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(PA {:.2}, IS {:.2}, LR {:.2})", self.pa, self.is, self.lr)
    }
}

/// 参考系解析后的一个点.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ResolvedPoint {
    /// 原始行 ID.
    pub id: String,

    /// 组织类型.
    pub tissue: Tissue,

    /// 最终参考点名称.
    pub reference: String,

    /// 相对于 `reference` 的坐标.
    pub position: StereoPoint,
}

impl ResolvedPoint {
    /// 是否是颅骨点?
    #[inline]
    pub fn is_skull(&self) -> bool {
        self.tissue.is_skull()
    }

    /// 是否是脑区点?
    #[inline]
    pub fn is_brain(&self) -> bool {
        self.tissue.is_brain()
    }
}

#[cfg(test)]
mod tests {
    use super::StereoPoint;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_point_arithmetic() {
        let a = StereoPoint::new(1.0, 2.0, 3.0);
        let b = StereoPoint::new(-1.0, 0.5, 1.0);
        assert_eq!(a + b, StereoPoint::new(0.0, 2.5, 4.0));
        assert_eq!(a - b, StereoPoint::new(2.0, 1.5, 2.0));
        assert_eq!(-a, StereoPoint::new(-1.0, -2.0, -3.0));
        assert_eq!(b * 2.0, StereoPoint::new(-2.0, 1.0, 2.0));
        assert!(f64_eq(a.dot(&b), -1.0 + 1.0 + 3.0));
    }

    #[test]
    fn test_point_distance() {
        let a = StereoPoint::sagittal(0.0, 0.0);
        let b = StereoPoint::sagittal(3.0, 4.0);
        assert!(f64_eq(a.distance(&b), 5.0));
        assert!(f64_eq(b.norm(), 5.0));
        assert!(!StereoPoint::new(f64::NAN, 0.0, 0.0).is_finite());
    }

    #[test]
    fn test_point_display() {
        let p = StereoPoint::new(-3.456, 1.0, 0.004);
        assert_eq!(p.to_string(), "(PA -3.46, IS 1.00, LR 0.00)");
    }
}
