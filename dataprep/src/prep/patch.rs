//! 从图像与标签对中随机截取正方形图块。

use super::error::{Error, Result};
use super::iter::PosIter;
use super::pos::Pos;
use log::debug;
use ndarray::{stack, Array, ArrayBase, ArrayView, Axis, Data, Dimension, RemoveAxis, Slice};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 每张图像默认截取的图块数。
pub const MAX_PATCHES: usize = 10;

/// 图块位置随机数种子。
pub const PATCH_SEED: u64 = 0;

/// 图块截取参数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchConfig {
    /// 图块边长。
    pub size: usize,
    /// 最多截取的图块数；为`None`时按行优先顺序截取所有位置的图块。
    pub max_patches: Option<usize>,
    /// 决定图块位置的随机数种子。
    pub seed: u64,
}

impl PatchConfig {
    #[inline]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            max_patches: Some(MAX_PATCHES),
            seed: PATCH_SEED,
        }
    }

    #[inline]
    pub fn max_patches(mut self, max_patches: Option<usize>) -> Self {
        self.max_patches = max_patches;
        self
    }

    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 计算一张(`height` * `width`)图像的图块左上角坐标。
    ///
    /// 随机模式下，先为全部图块抽取行坐标，再抽取列坐标（有放回），因此同一种子总是得到相同坐标。
    pub fn origins(&self, height: usize, width: usize) -> Result<Vec<Pos>> {
        let size = self.size;
        if size == 0 || size > height || size > width {
            return Err(Error::PatchSize {
                size,
                height,
                width,
            });
        }
        let all = PosIter::patch_origins(height, width, size);
        let n = match self.max_patches {
            None => return Ok(all.collect()),
            Some(0) => {
                return Err(Error::InvalidParameter {
                    name: "max_patches",
                    reason: "must be positive".to_string(),
                })
            }
            Some(n) => n.min(all.total()),
        };
        let (n_h, n_w) = (height - size + 1, width - size + 1);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let hs: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n_h)).collect();
        let ws: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n_w)).collect();
        Ok(hs.into_iter().zip(ws).map(Pos::from).collect())
    }
}

/// 取出数组前两个（空间）轴的长度。
pub(crate) fn spatial_dims<S, D>(a: &ArrayBase<S, D>) -> Result<(usize, usize)>
where
    S: Data,
    D: Dimension,
{
    match a.shape() {
        [h, w, ..] => Ok((*h, *w)),
        _ => Err(Error::Dimension {
            expected: 2,
            actual: a.ndim(),
        }),
    }
}

/// 在`origins`的每个位置截取边长为`size`的图块，沿新的第0轴堆叠。
///
/// 第0、1轴视为空间轴，其余轴（如通道）原样保留。调用者需保证所有图块都在图像范围内。
pub fn extract_patches<A, S, D>(
    image: &ArrayBase<S, D>,
    origins: &[Pos],
    size: usize,
) -> Result<Array<A, D::Larger>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
    D::Larger: RemoveAxis,
{
    let views: Vec<ArrayView<A, D>> = origins
        .iter()
        .map(|p| {
            let (hs, ws) = p.square(size);
            let mut v = image.view();
            v.slice_axis_inplace(Axis(0), Slice::from(hs));
            v.slice_axis_inplace(Axis(1), Slice::from(ws));
            v
        })
        .collect();
    Ok(stack(Axis(0), &views)?)
}

/// 按`config`从图像和标签的相同位置截取图块。
pub fn create_patches_with<A, S, D, B, T, E>(
    image: &ArrayBase<S, D>,
    mask: &ArrayBase<T, E>,
    config: &PatchConfig,
) -> Result<(Array<A, D::Larger>, Array<B, E::Larger>)>
where
    A: Clone,
    B: Clone,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: Dimension,
    E: Dimension,
    D::Larger: RemoveAxis,
    E::Larger: RemoveAxis,
{
    let (height, width) = spatial_dims(image)?;
    let mask_dims = spatial_dims(mask)?;
    if mask_dims != (height, width) {
        return Err(Error::ShapeMismatch {
            expected: vec![height, width],
            actual: vec![mask_dims.0, mask_dims.1],
        });
    }
    let origins = config.origins(height, width)?;
    debug!(
        "extracting {} patches of {}x{} from a {}x{} image",
        origins.len(),
        config.size,
        config.size,
        height,
        width
    );
    let image_patches = extract_patches(image, &origins, config.size)?;
    let mask_patches = extract_patches(mask, &origins, config.size)?;
    Ok((image_patches, mask_patches))
}

/// 从图像和标签中截取至多10个边长为`size`的正方形图块（种子为0）。
#[inline]
pub fn create_patches<A, S, D, B, T, E>(
    image: &ArrayBase<S, D>,
    mask: &ArrayBase<T, E>,
    size: usize,
) -> Result<(Array<A, D::Larger>, Array<B, E::Larger>)>
where
    A: Clone,
    B: Clone,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: Dimension,
    E: Dimension,
    D::Larger: RemoveAxis,
    E::Larger: RemoveAxis,
{
    create_patches_with(image, mask, &PatchConfig::new(size))
}
