use super::error::{Error, Result};
use ndarray::{Array, ArrayBase, Axis, Data, RemoveAxis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// 用`rng`生成一个`[0, n)`的随机排列，并同时作用于图像与标签的第0轴。
pub fn shuffle_train_data_with<A, S, D, B, T, E, R>(
    x_train: &ArrayBase<S, D>,
    y_train: &ArrayBase<T, E>,
    rng: &mut R,
) -> Result<(Array<A, D>, Array<B, E>)>
where
    A: Clone,
    B: Clone,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: RemoveAxis,
    E: RemoveAxis,
    R: Rng + ?Sized,
{
    let n = x_train.len_of(Axis(0));
    if y_train.len_of(Axis(0)) != n {
        return Err(Error::ShapeMismatch {
            expected: x_train.shape().to_vec(),
            actual: y_train.shape().to_vec(),
        });
    }
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    Ok((
        x_train.select(Axis(0), &indices),
        y_train.select(Axis(0), &indices),
    ))
}

/// 以`seed`为种子成对打乱训练数据。相同种子总是得到相同的排列，且不影响任何全局随机状态。
#[inline]
pub fn shuffle_train_data<A, S, D, B, T, E>(
    x_train: &ArrayBase<S, D>,
    y_train: &ArrayBase<T, E>,
    seed: u64,
) -> Result<(Array<A, D>, Array<B, E>)>
where
    A: Clone,
    B: Clone,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: RemoveAxis,
    E: RemoveAxis,
{
    let mut rng = StdRng::seed_from_u64(seed);
    shuffle_train_data_with(x_train, y_train, &mut rng)
}
