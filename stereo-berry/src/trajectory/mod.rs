//! 植入 (注射) 轨迹规划.
//!
//! 给定目标点和矢状面上的植入角度, 找出离植入轴最近的颅骨点,
//! 将其正交投影到植入轴上作为入口, 并计算入口到目标点的植入长度.

mod angle;

use std::fmt::Formatter;

use ordered_float::OrderedFloat;

use crate::data::{ResolvedSweep, StereoPoint};

pub use angle::{AngleConvention, InsertionAngle};

/// 轨迹规划错误.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// 角度不合法 (非有限值或超出范围).
    #[error("insertion angle {0}° is out of range")]
    InvalidAngle(f64),

    /// 植入轴水平, 无法从颅骨上方进入.
    #[error("insertion angle {0}° gives a horizontal implant axis")]
    HorizontalAxis(f64),

    /// 目标 ID 不在表中.
    #[error("target `{0}` is not in the skull sweep")]
    UnknownTarget(String),

    /// 目标坐标不是有限值.
    #[error("target coordinates are not finite")]
    NonFiniteTarget,

    /// 目标点沿植入轴向上方向没有任何颅骨点.
    #[error("no skull point lies above the target along the implant axis")]
    NoSkullAbove,
}

/// 植入目标.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// 表中某行的 ID (如 `VTA`).
    Label(String),

    /// 直接给出的坐标.
    Point(StereoPoint),
}

impl Target {
    /// 在 `sweep` 中查找目标坐标.
    pub fn locate(&self, sweep: &ResolvedSweep) -> Result<StereoPoint, PlanError> {
        let p = match self {
            Target::Label(id) => sweep
                .position(id)
                .ok_or_else(|| PlanError::UnknownTarget(id.clone()))?,
            Target::Point(p) => *p,
        };
        if p.is_finite() {
            Ok(p)
        } else {
            Err(PlanError::NonFiniteTarget)
        }
    }

    /// 目标名称. 坐标形式的目标为 `None`.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        match self {
            Target::Label(id) => Some(id),
            Target::Point(_) => None,
        }
    }
}

impl From<&str> for Target {
    #[inline]
    fn from(s: &str) -> Self {
        Self::Label(s.to_owned())
    }
}

impl From<String> for Target {
    #[inline]
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}

impl From<StereoPoint> for Target {
    #[inline]
    fn from(p: StereoPoint) -> Self {
        Self::Point(p)
    }
}

/// 一个颅骨点在植入轴上的正交投影.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SkullProjection {
    /// 颅骨点 ID.
    pub id: String,

    /// 颅骨点坐标.
    pub skull: StereoPoint,

    /// 投影点坐标.
    pub projection: StereoPoint,

    /// 投影点沿植入轴 (指向颅骨方向) 到目标点的有向距离.
    pub along: f64,

    /// 颅骨点到植入轴的垂直距离 (在 PA-IS 平面内).
    pub offset: f64,
}

/// 规划结果.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Trajectory {
    /// 目标点.
    pub target: StereoPoint,

    /// 入口点.
    pub entry: StereoPoint,

    /// 入口到目标的植入长度 (单位: 毫米).
    pub length: f64,

    /// 植入角度. 由切口直接构建且方向不指向上方时为 `None`.
    pub angle: Option<InsertionAngle>,

    /// 用于确定入口的颅骨点 ID.
    pub skull_id: Option<String>,

    /// 所有颅骨点在植入轴上的投影. 主要用于调试可视化.
    pub projections: Vec<SkullProjection>,
}

impl Trajectory {
    /// 由直接给出的切口 `incision` 构建轨迹 (不依赖颅骨点).
    pub fn from_incision(target: StereoPoint, incision: StereoPoint) -> Result<Self, PlanError> {
        if !target.is_finite() || !incision.is_finite() {
            return Err(PlanError::NonFiniteTarget);
        }
        let d = incision - target;
        Ok(Self {
            target,
            entry: incision,
            length: implant_length(&target, &incision),
            angle: InsertionAngle::from_direction(d.pa, d.is).ok(),
            skull_id: None,
            projections: vec![],
        })
    }

    /// 目标到入口的单位方向向量. 入口与目标重合时为零向量.
    pub fn direction(&self) -> StereoPoint {
        if self.length > 0.0 {
            (self.entry - self.target) * (1.0 / self.length)
        } else {
            StereoPoint::ORIGIN
        }
    }
}

/// 保留两位小数.
impl std::fmt::Display for Trajectory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.angle {
            Some(a) => writeln!(f, "For {a}:")?,
            None => writeln!(f, "For the given incision:")?,
        }
        writeln!(f, "Posteroanterior: {:.2}", self.entry.pa)?;
        writeln!(f, "Inferosuperior: {:.2}", self.entry.is)?;
        if self.entry.lr != 0.0 {
            writeln!(f, "Leftright: {:.2}", self.entry.lr)?;
        }
        write!(f, "Implant Length: {:.2}", self.length)
    }
}

/// 两点间的植入长度.
#[inline]
pub fn implant_length(a: &StereoPoint, b: &StereoPoint) -> f64 {
    a.distance(b)
}

/// 计算 `target` 以角度 `angle` 植入时的入口和植入长度.
///
/// # 算法
///
/// 1. 植入轴: 过目标点, 方向为 `angle.direction()` (指向颅骨);
/// 2. 只考虑沿植入轴位于目标点上方的颅骨点;
/// 3. 选取其中在 PA-IS 平面内离植入轴最近的一个 (距离相同时取表中靠前者);
/// 4. 入口为该颅骨点在植入轴上的正交投影, 其 `lr` 与目标相同.
pub fn project_target(
    points: &ResolvedSweep,
    target: &Target,
    angle: InsertionAngle,
) -> Result<Trajectory, PlanError> {
    let t = target.locate(points)?;
    let u = angle.direction();

    let projections: Vec<SkullProjection> = points
        .skull()
        .map(|s| {
            let rel = s.position - t;
            let rel = StereoPoint::sagittal(rel.pa, rel.is);
            let along = rel.dot(&u);
            let foot = u * along;
            SkullProjection {
                id: s.id.clone(),
                skull: s.position,
                projection: t + foot,
                along,
                offset: (rel - foot).norm(),
            }
        })
        .collect();

    let (entry, skull_id) = {
        let best = projections
            .iter()
            .filter(|p| p.along > 0.0)
            .min_by_key(|p| OrderedFloat(p.offset))
            .ok_or(PlanError::NoSkullAbove)?;
        log::info!(
            "target {t} at {angle}: entry via `{}` (axis offset {:.3} mm)",
            best.id,
            best.offset
        );
        (best.projection, best.id.clone())
    };

    Ok(Trajectory {
        target: t,
        entry,
        length: implant_length(&t, &entry),
        angle: Some(angle),
        skull_id: Some(skull_id),
        projections,
    })
}
