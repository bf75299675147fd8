use super::error::{Error, Result};
use super::patch::create_patches;
use log::debug;
use ndarray::{concatenate, Array2, Array3, ArrayView3, Axis};

/// 测试集的两种形态。
#[derive(Clone, Debug)]
pub enum TestSet<A> {
    /// 与训练集同维数的`(N, H, W)`数组。
    Stacked(Array3<A>),
    /// 尺寸各不相同的单张图像。
    PerImage(Vec<Array2<A>>),
}

impl<A> TestSet<A> {
    /// 图像张数。
    pub fn len(&self) -> usize {
        match self {
            TestSet::Stacked(a) => a.len_of(Axis(0)),
            TestSet::PerImage(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 将每一对测试图像和标签截取为边长`size`的图块。
fn patch_test_set<A, B>(
    images: &[Array2<A>],
    masks: &[Array2<B>],
    size: usize,
) -> Result<(Vec<Array3<A>>, Vec<Array3<B>>)>
where
    A: Clone,
    B: Clone,
{
    if images.len() != masks.len() {
        return Err(Error::ShapeMismatch {
            expected: vec![images.len()],
            actual: vec![masks.len()],
        });
    }
    let mut x_patches = Vec::with_capacity(images.len());
    let mut y_patches = Vec::with_capacity(masks.len());
    for (image, mask) in images.iter().zip(masks) {
        let (xp, yp) = create_patches(image, mask, size)?;
        x_patches.push(xp);
        y_patches.push(yp);
    }
    Ok((x_patches, y_patches))
}

/// 沿第0轴合并训练集与测试集。
///
/// 测试集为同尺寸的堆叠数组时原样拼接；为逐张图像时先按训练图块边长（`x_train`第1轴长度）截取图块再拼接。
/// 堆叠测试集的空间尺寸与训练集不同时返回`Error::IncompatibleTestShape`。
pub fn combine_train_test_data<A, B>(
    x_train: &Array3<A>,
    y_train: &Array3<B>,
    x_test: &TestSet<A>,
    y_test: &TestSet<B>,
) -> Result<(Array3<A>, Array3<B>)>
where
    A: Clone,
    B: Clone,
{
    if x_train.len_of(Axis(0)) != y_train.len_of(Axis(0)) {
        return Err(Error::ShapeMismatch {
            expected: x_train.shape().to_vec(),
            actual: y_train.shape().to_vec(),
        });
    }
    let (_, h, w) = x_train.dim();

    let (x_patches, y_patches);
    let mut x_parts: Vec<ArrayView3<A>> = vec![x_train.view()];
    let mut y_parts: Vec<ArrayView3<B>> = vec![y_train.view()];
    match (x_test, y_test) {
        (TestSet::Stacked(xt), TestSet::Stacked(yt)) => {
            if xt.dim() != yt.dim() {
                return Err(Error::ShapeMismatch {
                    expected: xt.shape().to_vec(),
                    actual: yt.shape().to_vec(),
                });
            }
            let (_, th, tw) = xt.dim();
            if (th, tw) != (h, w) {
                return Err(Error::IncompatibleTestShape {
                    train: (h, w),
                    test: (th, tw),
                });
            }
            x_parts.push(xt.view());
            y_parts.push(yt.view());
        }
        (TestSet::PerImage(xs), TestSet::PerImage(ys)) => {
            (x_patches, y_patches) = patch_test_set(xs, ys, h)?;
            x_parts.extend(x_patches.iter().map(|a| a.view()));
            y_parts.extend(y_patches.iter().map(|a| a.view()));
        }
        _ => {
            return Err(Error::InvalidParameter {
                name: "y_test",
                reason: "test images and masks must both be stacked or both per-image"
                    .to_string(),
            })
        }
    }

    let x = concatenate(Axis(0), &x_parts)?;
    let y = concatenate(Axis(0), &y_parts)?;
    debug!(
        "combined {} training rows with {} test-derived rows",
        x_train.len_of(Axis(0)),
        x.len_of(Axis(0)) - x_train.len_of(Axis(0))
    );
    Ok((x, y))
}
