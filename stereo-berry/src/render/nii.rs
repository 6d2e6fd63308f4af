//! NIfTI 体数据: 体素网格, 颅骨掩膜和解剖模板.
//!
//! 模板的世界坐标轴依次为 "右 -> 左", 后 -> 前, 下 -> 上, 因此立体定向坐标
//! `(pa, is, lr)` 对应世界坐标 `(-lr, pa, is)`.

use std::path::Path;

use ndarray::{Array3, ArrayView3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use num::ToPrimitive;

use super::RenderError;
use crate::data::StereoPoint;
use crate::dataset::expand_home;
use crate::{Idx3d, Idx3dF};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 仿射矩阵的前三行.
type Affine = [[f64; 4]; 3];

/// 判定仿射矩阵奇异的阈值.
const SINGULAR_EPS: f64 = 1e-12;

/// 从 header 获取体素个数, 按 `(x, y, z)` 排列.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    let [_, x, y, z, ..] = h.dim;
    (x as usize, y as usize, z as usize)
}

/// nii 文件 header 的共用属性.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小, 按 `(x, y, z)` 排列.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 体素网格.
    #[inline]
    fn grid(&self) -> Result<VoxelGrid, RenderError> {
        VoxelGrid::from_header(self.header())
    }
}

/// 体素索引与立体定向坐标之间的映射.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    affine: Affine,
    inverse: [[f64; 3]; 3],
    dims: Idx3d,
}

impl VoxelGrid {
    /// 以体素 -> 世界坐标的仿射矩阵 `affine` 和网格大小 `dims` 构建.
    ///
    /// 仿射矩阵不可逆时返回 `Err(RenderError::SingularAffine)`.
    pub fn new(affine: Affine, dims: Idx3d) -> Result<Self, RenderError> {
        let inverse = invert(&affine).ok_or(RenderError::SingularAffine)?;
        Ok(Self {
            affine,
            inverse,
            dims,
        })
    }

    /// 从 nifti 元数据构建.
    ///
    /// 依次尝试 sform (`sform_code > 0`), qform (`qform_code > 0`),
    /// 最后退化为以 `pixdim` 为对角线的矩阵.
    pub fn from_header(h: &NiftiHeader) -> Result<Self, RenderError> {
        let affine = if h.sform_code > 0 {
            [h.srow_x, h.srow_y, h.srow_z].map(|row| row.map(f64::from))
        } else if h.qform_code > 0 {
            qform_affine(h)
        } else {
            let [_, dx, dy, dz, ..] = h.pixdim.map(f64::from);
            [
                [dx, 0.0, 0.0, h.quatern_x as f64],
                [0.0, dy, 0.0, h.quatern_y as f64],
                [0.0, 0.0, dz, h.quatern_z as f64],
            ]
        };
        Self::new(affine, get_shape_from_header(h))
    }

    /// 网格大小, 按 `(x, y, z)` 排列.
    #[inline]
    pub fn dims(&self) -> Idx3d {
        self.dims
    }

    /// 体素 -> 世界坐标的仿射矩阵.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 体素坐标 (可以是小数) -> 立体定向坐标.
    pub fn voxel_to_world(&self, (i, j, k): Idx3dF) -> StereoPoint {
        let [x, y, z] = self
            .affine
            .map(|row| row[0] * i + row[1] * j + row[2] * k + row[3]);
        StereoPoint::new(y, z, -x)
    }

    /// 立体定向坐标 -> 体素坐标 (小数).
    pub fn world_to_voxel(&self, p: &StereoPoint) -> Idx3dF {
        let w = [-p.lr, p.pa, p.is];
        let d = [0, 1, 2].map(|r| w[r] - self.affine[r][3]);
        let [i, j, k] = self.inverse.map(|row| row[0] * d[0] + row[1] * d[1] + row[2] * d[2]);
        (i, j, k)
    }

    /// `p` 所在的 (最近) 体素. 位于网格外时返回 `None`.
    pub fn locate(&self, p: &StereoPoint) -> Option<Idx3d> {
        let (i, j, k) = self.world_to_voxel(p);
        let (nx, ny, nz) = self.dims;
        let i = i.round().to_usize().filter(|&i| i < nx)?;
        let j = j.round().to_usize().filter(|&j| j < ny)?;
        let k = k.round().to_usize().filter(|&k| k < nz)?;
        Some((i, j, k))
    }
}

/// 由四元数参数构建 qform 仿射矩阵.
fn qform_affine(h: &NiftiHeader) -> Affine {
    let (b, c, d) = (h.quatern_b as f64, h.quatern_c as f64, h.quatern_d as f64);
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
    let [qfac, dx, dy, dz, ..] = h.pixdim.map(f64::from);
    let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };

    let rotation = [
        [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
        [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
        [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
    ];
    let scale = [dx, dy, dz * qfac];
    let offset = [h.quatern_x, h.quatern_y, h.quatern_z].map(f64::from);

    let mut ans = [[0.0; 4]; 3];
    for ((row, r), o) in ans.iter_mut().zip(rotation).zip(offset) {
        for col in 0..3 {
            row[col] = r[col] * scale[col];
        }
        row[3] = o;
    }
    ans
}

/// 仿射矩阵左上 3x3 部分的逆.
fn invert(m: &Affine) -> Option<[[f64; 3]; 3]> {
    let c = |r: usize, k: usize| m[r][k];
    let cof = [
        [
            c(1, 1) * c(2, 2) - c(1, 2) * c(2, 1),
            c(0, 2) * c(2, 1) - c(0, 1) * c(2, 2),
            c(0, 1) * c(1, 2) - c(0, 2) * c(1, 1),
        ],
        [
            c(1, 2) * c(2, 0) - c(1, 0) * c(2, 2),
            c(0, 0) * c(2, 2) - c(0, 2) * c(2, 0),
            c(0, 2) * c(1, 0) - c(0, 0) * c(1, 2),
        ],
        [
            c(1, 0) * c(2, 1) - c(1, 1) * c(2, 0),
            c(0, 1) * c(2, 0) - c(0, 0) * c(2, 1),
            c(0, 0) * c(1, 1) - c(0, 1) * c(1, 0),
        ],
    ];
    let det = c(0, 0) * cof[0][0] + c(0, 1) * cof[1][0] + c(0, 2) * cof[2][0];
    if !det.is_finite() || det.abs() < SINGULAR_EPS {
        return None;
    }
    Some(cof.map(|row| row.map(|v| v / det)))
}

/// 将 `points` 写入与 `grid` 同形状的 0/1 掩膜.
///
/// 网格外的点不会写入, 只会产生一条警告日志.
pub fn make_mask<'a, I: IntoIterator<Item = &'a StereoPoint>>(
    points: I,
    grid: &VoxelGrid,
) -> Array3<u8> {
    let mut mask = Array3::<u8>::zeros(grid.dims());
    for p in points {
        match grid.locate(p) {
            Some(idx) => mask[idx] = 1,
            None => log::warn!("{p} lies outside the {:?} voxel grid", grid.dims()),
        }
    }
    mask
}

/// 以 `header` 为参考头文件, 把掩膜保存为 nii 文件. `path` 开头的 `~` 会被展开.
pub fn save_mask<P: AsRef<Path>>(
    path: P,
    mask: &Array3<u8>,
    header: &NiftiHeader,
) -> crate::Result<()> {
    let path = expand_home(path.as_ref());
    log::info!(
        "saving mask ({} voxels set) to `{}`",
        mask.iter().filter(|&&v| v != 0).count(),
        path.display()
    );
    WriterOptions::new(&path)
        .reference_header(header)
        .write_nifti(mask)?;
    Ok(())
}

/// nii 格式解剖模板. 强度以 `f32` 保存, 按 `(x, y, z)` 索引.
#[derive(Debug, Clone)]
pub struct TemplateVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for TemplateVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl TemplateVolume {
    /// 由 header 和体数据构建.
    ///
    /// header 中的维度与 `data` 形状不符时返回 `Err(RenderError::ShapeMismatch)`.
    pub fn new(header: NiftiHeader, data: Array3<f32>) -> Result<Self, RenderError> {
        let (x, y, z) = get_shape_from_header(&header);
        if data.shape() != [x, y, z] {
            return Err(RenderError::ShapeMismatch(
                vec![x, y, z],
                data.shape().to_vec(),
            ));
        }
        Ok(Self {
            header: Box::new(header),
            data,
        })
    }

    /// 打开 nii 文件格式的模板. `path` 开头的 `~` 会被展开.
    ///
    /// 第四维长度为 1 的体数据会被视为三维.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = expand_home(path.as_ref());
        log::debug!("opening template `{}`", path.display());
        let obj = ReaderOptions::new().read_file(&path)?;
        let header = obj.header().clone();
        let data = obj.into_volume().into_ndarray::<f32>()?;
        let data = match data.ndim() {
            4 if data.len_of(Axis(3)) == 1 => data.index_axis_move(Axis(3), 0),
            _ => data,
        };
        let data = data.into_dimensionality::<Ix3>()?;
        Ok(Self::new(header, data)?)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 体素 `idx` 处的强度.
    ///
    /// 当 `idx` 越界时 panic.
    #[inline]
    pub fn value(&self, idx: Idx3d) -> f32 {
        self.data[idx]
    }

    /// 在本模板的网格上构建 `points` 的掩膜.
    pub fn mask_of<'a, I: IntoIterator<Item = &'a StereoPoint>>(
        &self,
        points: I,
    ) -> Result<Array3<u8>, RenderError> {
        Ok(make_mask(points, &self.grid()?))
    }
}
