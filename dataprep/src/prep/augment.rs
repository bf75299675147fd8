//! 旋转与翻转8倍数据增强。

use super::error::{Error, Result};
use log::debug;
use ndarray::{concatenate, Array, ArrayBase, ArrayView, Axis, Data, Dimension, RemoveAxis};

/// 将视图在最后两个轴构成的平面内逆时针旋转`k`个90°，方向与numpy的`rot90(m, k, (-2, -1))`一致。
///
/// 只调整步长，不复制数据。
///
/// # Panics
///
/// 如果视图少于2个轴，则程序panic。
pub fn rot90<A, D: Dimension>(view: ArrayView<'_, A, D>, k: usize) -> ArrayView<'_, A, D> {
    let nd = view.ndim();
    assert!(nd >= 2, "rot90 needs at least 2 axes, got {nd}");
    let (row, col) = (nd - 2, nd - 1);
    let mut v = view;
    match k % 4 {
        0 => (),
        1 => {
            v.invert_axis(Axis(col));
            v.swap_axes(row, col);
        }
        2 => {
            v.invert_axis(Axis(row));
            v.invert_axis(Axis(col));
        }
        _ => {
            v.swap_axes(row, col);
            v.invert_axis(Axis(col));
        }
    }
    v
}

/// 依次拼接原图、旋转90°/180°/270°，再拼接这4N张图沿第1轴翻转后的结果。
fn augment_one<A, S, D>(x: &ArrayBase<S, D>) -> Result<Array<A, D>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: RemoveAxis,
{
    let nd = x.ndim();
    if nd < 3 {
        return Err(Error::Dimension {
            expected: 3,
            actual: nd,
        });
    }
    let shape = x.shape();
    if shape[nd - 2] != shape[nd - 1] {
        return Err(Error::ShapeMismatch {
            expected: vec![shape[nd - 2], shape[nd - 2]],
            actual: vec![shape[nd - 2], shape[nd - 1]],
        });
    }

    let v = x.view();
    let rotations = [
        v.clone(),
        rot90(v.clone(), 1),
        rot90(v.clone(), 2),
        rot90(v, 3),
    ];
    let block = concatenate(Axis(0), &rotations)?;
    let mut flipped = block.view();
    flipped.invert_axis(Axis(1));
    Ok(concatenate(Axis(0), &[block.view(), flipped])?)
}

/// 对成对的图像与标签做8倍增强，输出第0轴长度恰为`8N`，同一位置的图像与标签经过相同变换。
pub fn augment_data<A, S, D, B, T, E>(
    x_train: &ArrayBase<S, D>,
    y_train: &ArrayBase<T, E>,
) -> Result<(Array<A, D>, Array<B, E>)>
where
    A: Clone,
    B: Clone,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: RemoveAxis,
    E: RemoveAxis,
{
    if let (Some(&nx), Some(&ny)) = (x_train.shape().first(), y_train.shape().first()) {
        if nx != ny {
            return Err(Error::ShapeMismatch {
                expected: x_train.shape().to_vec(),
                actual: y_train.shape().to_vec(),
            });
        }
    }
    let x_aug = augment_one(x_train)?;
    let y_aug = augment_one(y_train)?;
    debug!("raw image size after augmentation {:?}", x_aug.shape());
    debug!("mask size after augmentation {:?}", y_aug.shape());
    Ok((x_aug, y_aug))
}
