use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::dataset::expand_home;
use crate::Result;

pub mod frame;
pub mod point;

pub use frame::{resolve_reference_frame, FrameError, ResolvedSweep};
pub use point::{ResolvedPoint, StereoPoint};

/// 测量点所属的组织.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(from = "String")]
#[cfg_attr(feature = "serialize", derive(serde::Serialize), serde(into = "String"))]
pub enum Tissue {
    /// 颅骨表面点. 用于计算入口.
    Skull,

    /// 脑区 (如 VTA), 一般作为目标.
    Brain,

    /// 未填写组织 (空白单元格).
    #[default]
    Unspecified,

    /// 未知组织名称. 保留原始文本.
    Other(String),
}

impl Tissue {
    /// 是否是颅骨?
    #[inline]
    pub fn is_skull(&self) -> bool {
        matches!(self, Self::Skull)
    }

    /// 是否是脑区?
    #[inline]
    pub fn is_brain(&self) -> bool {
        matches!(self, Self::Brain)
    }

    /// 组织名称. `Unspecified` 为空字符串.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Skull => "skull",
            Self::Brain => "brain",
            Self::Unspecified => "",
            Self::Other(s) => s.as_str(),
        }
    }
}

/// 大小写不敏感, 忽略首尾空白.
impl From<String> for Tissue {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("skull") {
            Self::Skull
        } else if trimmed.eq_ignore_ascii_case("brain") {
            Self::Brain
        } else if trimmed.is_empty() {
            Self::Unspecified
        } else {
            Self::Other(trimmed.to_owned())
        }
    }
}

impl From<Tissue> for String {
    #[inline]
    fn from(t: Tissue) -> Self {
        t.as_str().to_owned()
    }
}

/// 颅骨扫描表中的一行原始测量.
///
/// `posteroanterior`, `superoinferior`, `leftright` 都是 **相对于 `reference`**
/// 的偏移量 (单位: 毫米). 注意 `superoinferior` 向下为正.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct SweepRecord {
    /// 行 ID, 在整张表中唯一.
    #[serde(rename = "ID")]
    pub id: String,

    /// 组织类型.
    #[serde(default)]
    pub tissue: Tissue,

    /// 参考点. 可以是另一行的 ID, 也可以是参考系名称 (如 `bregma`).
    pub reference: String,

    /// 后 -> 前偏移量.
    pub posteroanterior: f64,

    /// 上 -> 下偏移量.
    pub superoinferior: f64,

    /// 左 -> 右偏移量. 空白或缺列视为 0, 非数值报错.
    #[serde(default)]
    pub leftright: Option<f64>,
}

impl SweepRecord {
    /// 创建一行矢状面测量 (`leftright` 缺省).
    pub fn new(
        id: impl Into<String>,
        tissue: Tissue,
        reference: impl Into<String>,
        posteroanterior: f64,
        superoinferior: f64,
    ) -> Self {
        Self {
            id: id.into(),
            tissue,
            reference: reference.into(),
            posteroanterior,
            superoinferior,
            leftright: None,
        }
    }

    /// 设置左右偏移量.
    #[inline]
    pub fn with_leftright(mut self, lr: f64) -> Self {
        self.leftright = Some(lr);
        self
    }

    /// 相对于 `self.reference` 的偏移向量. `is` 分量已翻转为向上为正.
    #[inline]
    pub fn offset(&self) -> StereoPoint {
        StereoPoint::new(
            self.posteroanterior,
            -self.superoinferior,
            self.leftright.unwrap_or(0.0),
        )
    }
}

/// 颅骨扫描数据本身的错误.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SweepError {
    /// 行 ID 重复.
    #[error("duplicate row ID `{0}`")]
    DuplicateId(String),

    /// 行 ID 为空.
    #[error("empty row ID at row {0}")]
    EmptyId(usize),

    /// 坐标不是有限值. `(行 ID, 列名)`
    #[error("row `{0}` has a non-finite `{1}` value")]
    NonFinite(String, &'static str),
}

/// 一次颅骨扫描 (skull sweep) 的全部测量, 按原始行顺序保存.
#[derive(Clone, Debug, Default)]
pub struct SkullSweep {
    records: Vec<SweepRecord>,
    index: HashMap<String, usize>,
}

impl SkullSweep {
    /// 从若干行测量构建. 行 ID 必须非空且唯一, 坐标必须是有限值.
    pub fn new<I: IntoIterator<Item = SweepRecord>>(records: I) -> Result<Self> {
        let records: Vec<SweepRecord> = records.into_iter().collect();
        let mut index = HashMap::with_capacity(records.len());
        for (row, r) in records.iter().enumerate() {
            if r.id.is_empty() {
                return Err(SweepError::EmptyId(row).into());
            }
            Self::check_finite(r)?;
            if index.insert(r.id.clone(), row).is_some() {
                return Err(SweepError::DuplicateId(r.id.clone()).into());
            }
        }
        Ok(Self { records, index })
    }

    /// 打开 csv 格式的颅骨扫描. 路径中开头的 `~` 会被展开为用户主目录.
    ///
    /// 表头至少需要包含 `ID`, `reference`, `posteroanterior`, `superoinferior`;
    /// `tissue` 和 `leftright` 可选.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_home(path.as_ref());
        log::debug!("opening skull sweep `{}`", path.display());
        let file = std::fs::File::open(&path)?;
        Self::from_reader(file)
    }

    /// 从任意 csv 数据源读取.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let records = rdr
            .deserialize::<SweepRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        log::debug!("read {} skull sweep rows", records.len());
        Self::new(records)
    }

    /// 根据行 ID 获取测量.
    #[inline]
    pub fn record(&self, id: &str) -> Option<&SweepRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// 是否包含给定 ID 的行?
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// 全部测量, 保持原始顺序.
    #[inline]
    pub fn records(&self) -> &[SweepRecord] {
        &self.records
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空表?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 将所有点换算到以 `ultimate_reference` 为原点的参考系下.
    #[inline]
    pub fn resolve(&self, ultimate_reference: &str) -> std::result::Result<ResolvedSweep, FrameError> {
        resolve_reference_frame(self, ultimate_reference)
    }

    fn check_finite(r: &SweepRecord) -> std::result::Result<(), SweepError> {
        let columns = [
            ("posteroanterior", Some(r.posteroanterior)),
            ("superoinferior", Some(r.superoinferior)),
            ("leftright", r.leftright),
        ];
        match columns
            .into_iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
        {
            Some((column, _)) => Err(SweepError::NonFinite(r.id.clone(), column)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SkullSweep, SweepError, SweepRecord, Tissue};
    use crate::Error;

    const CSV: &str = "\
ID,tissue,reference,posteroanterior,superoinferior,leftright
lambda,skull,bregma,-4.2,0.3,
s1,skull,bregma,-1.0,0.1,
VTA,Brain,lambda,0.9,4.1,0.5
";

    #[test]
    fn test_tissue_from_str() {
        assert_eq!(Tissue::from("Skull".to_string()), Tissue::Skull);
        assert_eq!(Tissue::from(" brain ".to_string()), Tissue::Brain);
        assert_eq!(Tissue::from(String::new()), Tissue::Unspecified);
        assert_eq!(
            Tissue::from("dura".to_string()),
            Tissue::Other("dura".to_string())
        );
    }

    #[test]
    fn test_sweep_from_csv() {
        let sweep = SkullSweep::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(sweep.len(), 3);
        assert!(sweep.contains("VTA"));

        let lambda = sweep.record("lambda").unwrap();
        assert_eq!(lambda.tissue, Tissue::Skull);
        assert_eq!(lambda.leftright, None);
        assert_eq!(lambda.offset().is, -0.3);

        let vta = sweep.record("VTA").unwrap();
        assert_eq!(vta.tissue, Tissue::Brain);
        assert_eq!(vta.reference, "lambda");
        assert_eq!(vta.leftright, Some(0.5));
    }

    #[test]
    fn test_sweep_without_optional_columns() {
        let csv = "ID,reference,posteroanterior,superoinferior\na,bregma,1,2\n";
        let sweep = SkullSweep::from_reader(csv.as_bytes()).unwrap();
        let a = sweep.record("a").unwrap();
        assert_eq!(a.tissue, Tissue::Unspecified);
        assert_eq!(a.leftright, None);
    }

    #[test]
    fn test_sweep_duplicate_id() {
        let err = SkullSweep::new([
            SweepRecord::new("a", Tissue::Skull, "bregma", 0.0, 0.0),
            SweepRecord::new("a", Tissue::Skull, "bregma", 1.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Sweep(SweepError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_sweep_non_finite() {
        let err = SkullSweep::new([SweepRecord::new(
            "a",
            Tissue::Skull,
            "bregma",
            f64::NAN,
            0.0,
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Sweep(SweepError::NonFinite(_, "posteroanterior"))
        ));
    }

    #[test]
    fn test_sweep_bad_number() {
        let csv = "ID,reference,posteroanterior,superoinferior\na,bregma,x,2\n";
        assert!(matches!(
            SkullSweep::from_reader(csv.as_bytes()),
            Err(Error::Csv(_))
        ));
    }

    #[test]
    fn test_sweep_bad_leftright() {
        let csv = "ID,reference,posteroanterior,superoinferior,leftright\na,bregma,1,2,oops\n";
        assert!(matches!(
            SkullSweep::from_reader(csv.as_bytes()),
            Err(Error::Csv(_))
        ));
    }

    #[test]
    fn test_sweep_open_file() {
        use std::io::Write;

        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(CSV.as_bytes()).unwrap();
        let sweep = SkullSweep::open(f.path()).unwrap();
        assert_eq!(sweep.len(), 3);
    }
}
