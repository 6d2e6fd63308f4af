//! 参考系解析.
//!
//! 颅骨扫描中的每个测量都是相对于 `reference` 的偏移, 而 `reference`
//! 本身可以是另一行测量. 沿着这条参考链一路累加偏移量, 直到抵达一个不是行 ID
//! 的名称 (参考系根, 如 `bregma`), 就得到了该点在根参考系下的坐标.
//!
//! 若期望的最终参考点本身是某一行 (如 `lambda`), 则所有点再减去该行在同一根参考系下的坐标.
//! 自引用的行 (`ID == reference`) 被视为根参考系的锚点.

use std::collections::HashMap;

use crate::consts::INCISION_ID;
use crate::data::{ResolvedPoint, SkullSweep, StereoPoint, SweepRecord};

/// 参考系解析错误.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// 某行所在的根参考系无法换算到最终参考点.
    #[error("row `{id}` resolves to frame `{root}`, which cannot be expressed relative to `{reference}`")]
    Unreachable {
        /// 行 ID.
        id: String,
        /// 该行参考链的终点.
        root: String,
        /// 期望的最终参考点.
        reference: String,
    },

    /// 参考链成环. 内容为从起点开始的完整链条, 最后一个元素重复出现.
    #[error("reference cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// 沿参考链行走的结果.
#[derive(Debug)]
struct Walk<'a> {
    /// 链的终点.
    root: &'a str,
    /// 相对于 `root` 的坐标.
    position: StereoPoint,
    /// 经过的中间行数.
    hops: usize,
}

/// 从 `start` 出发, 沿参考链累加偏移量.
///
/// 遇到 `stop` (若有), 非行 ID 的名称, 或自引用行时停止.
fn walk<'a>(
    sweep: &'a SkullSweep,
    start: &'a SweepRecord,
    stop: Option<&str>,
) -> Result<Walk<'a>, FrameError> {
    let mut position = start.offset();
    let mut reference = start.reference.as_str();
    let mut chain: Vec<&str> = vec![start.id.as_str()];

    loop {
        if stop == Some(reference) {
            break;
        }
        let Some(next) = sweep.record(reference) else {
            break;
        };
        if next.reference == next.id {
            break;
        }
        if chain.contains(&reference) {
            chain.push(reference);
            return Err(FrameError::Cycle(
                chain.into_iter().map(str::to_owned).collect(),
            ));
        }
        chain.push(reference);
        position = position + next.offset();
        reference = next.reference.as_str();
    }

    Ok(Walk {
        root: reference,
        position,
        hops: chain.len() - 1,
    })
}

/// 将颅骨扫描中所有点换算到以 `ultimate_reference` 为原点的参考系下.
///
/// 输出保持输入行的顺序, `is` 分量为 `-superoinferior` 的累加.
///
/// # 返回值
///
/// - 参考链成环时返回 `Err(FrameError::Cycle)`;
/// - 某行的根参考系既不是 `ultimate_reference`, 又无法通过 `ultimate_reference`
///   所在的行换算时, 返回 `Err(FrameError::Unreachable)`.
pub fn resolve_reference_frame(
    sweep: &SkullSweep,
    ultimate_reference: &str,
) -> Result<ResolvedSweep, FrameError> {
    // 最终参考点本身是一行测量时, 它在自己根参考系下的坐标. 仅在需要时才会用到.
    let anchor = sweep
        .record(ultimate_reference)
        .map(|r| walk(sweep, r, None));

    let mut points = Vec::with_capacity(sweep.len());
    for record in sweep.records() {
        let w = walk(sweep, record, Some(ultimate_reference))?;
        let position = if w.root == ultimate_reference {
            w.position
        } else {
            match &anchor {
                Some(Ok(a)) if a.root == w.root => w.position - a.position,
                Some(Err(e)) => return Err(e.clone()),
                _ => {
                    return Err(FrameError::Unreachable {
                        id: record.id.clone(),
                        root: w.root.to_owned(),
                        reference: ultimate_reference.to_owned(),
                    })
                }
            }
        };
        log::trace!(
            "`{}` -> `{}` via {} hop(s): {position}",
            record.id,
            ultimate_reference,
            w.hops
        );
        points.push(ResolvedPoint {
            id: record.id.clone(),
            tissue: record.tissue.clone(),
            reference: ultimate_reference.to_owned(),
            position,
        });
    }

    log::debug!(
        "resolved {} point(s) relative to `{ultimate_reference}`",
        points.len()
    );
    Ok(ResolvedSweep::new(ultimate_reference, points))
}

/// 换算到同一参考系下的颅骨扫描.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ResolvedSweep {
    reference: String,
    points: Vec<ResolvedPoint>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    index: HashMap<String, usize>,
}

impl ResolvedSweep {
    /// 直接由已换算好的点构建. 重复 ID 以最后一次出现为准.
    pub fn new(reference: impl Into<String>, points: Vec<ResolvedPoint>) -> Self {
        let index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        Self {
            reference: reference.into(),
            points,
            index,
        }
    }

    /// 最终参考点名称.
    #[inline]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// 全部点, 保持原始顺序.
    #[inline]
    pub fn points(&self) -> &[ResolvedPoint] {
        &self.points
    }

    /// 根据行 ID 获取点.
    #[inline]
    pub fn point(&self, id: &str) -> Option<&ResolvedPoint> {
        self.index.get(id).map(|&i| &self.points[i])
    }

    /// 根据行 ID 获取坐标.
    #[inline]
    pub fn position(&self, id: &str) -> Option<StereoPoint> {
        self.point(id).map(|p| p.position)
    }

    /// 所有颅骨点.
    #[inline]
    pub fn skull(&self) -> impl Iterator<Item = &ResolvedPoint> {
        self.points.iter().filter(|p| p.is_skull())
    }

    /// 所有脑区点.
    #[inline]
    pub fn brain(&self) -> impl Iterator<Item = &ResolvedPoint> {
        self.points.iter().filter(|p| p.is_brain())
    }

    /// 表中手动记录的切口 (ID 为 `incision` 的行), 若有.
    #[inline]
    pub fn incision(&self) -> Option<&ResolvedPoint> {
        self.point(INCISION_ID)
    }

    /// 点的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_reference_frame, FrameError};
    use crate::data::{SkullSweep, StereoPoint, SweepRecord, Tissue};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn assert_point(actual: StereoPoint, (pa, is, lr): (f64, f64, f64)) {
        assert!(
            f64_eq(actual.pa, pa) && f64_eq(actual.is, is) && f64_eq(actual.lr, lr),
            "{actual:?} != ({pa}, {is}, {lr})"
        );
    }

    fn row(id: &str, tissue: Tissue, reference: &str, pa: f64, si: f64) -> SweepRecord {
        SweepRecord::new(id, tissue, reference, pa, si)
    }

    /// bregma <- lambda <- {s1, VTA}; bregma <- s0.
    fn chained() -> SkullSweep {
        SkullSweep::new([
            row("lambda", Tissue::Skull, "bregma", -4.0, 0.5),
            row("s0", Tissue::Skull, "bregma", 1.0, 0.2),
            row("s1", Tissue::Skull, "lambda", -1.0, 0.1),
            row("VTA", Tissue::Brain, "lambda", 0.8, 4.0).with_leftright(0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_to_root() {
        let resolved = resolve_reference_frame(&chained(), "bregma").unwrap();
        assert_eq!(resolved.reference(), "bregma");
        assert_eq!(resolved.len(), 4);

        assert_point(resolved.position("lambda").unwrap(), (-4.0, -0.5, 0.0));
        assert_point(resolved.position("s0").unwrap(), (1.0, -0.2, 0.0));
        assert_point(resolved.position("s1").unwrap(), (-5.0, -0.6, 0.0));
        assert_point(resolved.position("VTA").unwrap(), (-3.2, -4.5, 0.5));
        assert!(resolved.points().iter().all(|p| p.reference == "bregma"));
    }

    #[test]
    fn test_resolve_keeps_order() {
        let resolved = chained().resolve("bregma").unwrap();
        let ids: Vec<_> = resolved.points().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["lambda", "s0", "s1", "VTA"]);
        assert_eq!(resolved.skull().count(), 3);
        assert_eq!(resolved.brain().count(), 1);
    }

    #[test]
    fn test_resolve_reroot_to_row() {
        let resolved = chained().resolve("lambda").unwrap();
        assert_point(resolved.position("lambda").unwrap(), (0.0, 0.0, 0.0));
        assert_point(resolved.position("s0").unwrap(), (5.0, 0.3, 0.0));
        assert_point(resolved.position("s1").unwrap(), (-1.0, -0.1, 0.0));
        assert_point(resolved.position("VTA").unwrap(), (0.8, -4.0, 0.5));
    }

    #[test]
    fn test_resolve_self_anchored_root() {
        let sweep = SkullSweep::new([
            row("bregma", Tissue::Skull, "bregma", 0.0, 0.0),
            row("lambda", Tissue::Skull, "bregma", -4.0, 0.5),
            row("s1", Tissue::Skull, "lambda", -1.0, 0.1),
        ])
        .unwrap();

        let resolved = sweep.resolve("bregma").unwrap();
        assert_point(resolved.position("bregma").unwrap(), (0.0, 0.0, 0.0));
        assert_point(resolved.position("s1").unwrap(), (-5.0, -0.6, 0.0));

        let resolved = sweep.resolve("lambda").unwrap();
        assert_point(resolved.position("bregma").unwrap(), (4.0, 0.5, 0.0));
        assert_point(resolved.position("s1").unwrap(), (-1.0, -0.1, 0.0));
    }

    #[test]
    fn test_resolve_cycle() {
        let sweep = SkullSweep::new([
            row("a", Tissue::Skull, "b", 1.0, 0.0),
            row("b", Tissue::Skull, "a", 1.0, 0.0),
        ])
        .unwrap();
        let err = sweep.resolve("bregma").unwrap_err();
        assert_eq!(
            err,
            FrameError::Cycle(vec!["a".into(), "b".into(), "a".into()])
        );
        assert_eq!(err.to_string(), "reference cycle: a -> b -> a");
    }

    #[test]
    fn test_resolve_unknown_reference() {
        let err = chained().resolve("nasion").unwrap_err();
        assert_eq!(
            err,
            FrameError::Unreachable {
                id: "lambda".into(),
                root: "bregma".into(),
                reference: "nasion".into(),
            }
        );
    }

    #[test]
    fn test_resolve_reroot_into_cycle() {
        let sweep = SkullSweep::new([
            row("s0", Tissue::Skull, "bregma", 1.0, 0.0),
            row("a", Tissue::Skull, "b", 1.0, 0.0),
            row("b", Tissue::Skull, "a", 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(
            sweep.resolve("a").unwrap_err(),
            FrameError::Cycle(vec!["a".into(), "b".into(), "a".into()])
        );
    }

    #[test]
    fn test_resolve_unreachable() {
        let sweep = SkullSweep::new([
            row("s0", Tissue::Skull, "bregma", 1.0, 0.0),
            row("s1", Tissue::Skull, "interaural", 1.0, 0.0),
        ])
        .unwrap();
        let err = sweep.resolve("bregma").unwrap_err();
        assert!(matches!(
            err,
            FrameError::Unreachable { ref id, ref root, .. } if id == "s1" && root == "interaural"
        ));
    }
}
