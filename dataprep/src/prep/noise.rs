use super::error::{Error, Result};
use ndarray::{Array, ArrayBase, Data, Dimension};
use num_traits::AsPrimitive;
use rand::Rng;
use std::f64::consts::PI;

/// 用Box-Muller变换从`rng`抽取一个标准正态分布样本。
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// 为图像的`f32`副本逐像素叠加均值为0、标准差为`sigma`的高斯噪声。输入不会被修改。
///
/// 随机性完全来自调用者传入的`rng`；需要不可复现的噪声时可传入`rand::thread_rng()`。
pub fn add_noise<A, S, D, R>(
    image: &ArrayBase<S, D>,
    sigma: f32,
    rng: &mut R,
) -> Result<Array<f32, D>>
where
    A: AsPrimitive<f64>,
    S: Data<Elem = A>,
    D: Dimension,
    R: Rng + ?Sized,
{
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "sigma",
            reason: format!("noise deviation must be finite and non-negative, got {sigma}"),
        });
    }
    let sigma = sigma as f64;
    Ok(image.mapv(|v| (v.as_() + sigma * standard_normal(rng)) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_sigma_is_identity() {
        let image = Array3::from_shape_fn((2, 5, 7), |(z, y, x)| (z * 35 + y * 7 + x) as u16);
        let mut rng = StdRng::seed_from_u64(3);
        let noisy = add_noise(&image, 0.0, &mut rng).unwrap();
        assert_eq!(noisy, image.mapv(f32::from));
    }

    #[test]
    fn test_noise_deviation() {
        let image = Array2::<f32>::from_elem((200, 200), 10.0);
        let mut rng = StdRng::seed_from_u64(42);
        let sigma = 2.5;
        let noisy = add_noise(&image, sigma, &mut rng).unwrap();
        let diff = &noisy - &image;
        let n = diff.len() as f64;
        let mean = diff.iter().map(|&d| d as f64).sum::<f64>() / n;
        let var = diff.iter().map(|&d| (d as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.06, "mean {mean}");
        assert!((var.sqrt() - sigma as f64).abs() < 0.05, "std {}", var.sqrt());
        let unchanged = diff.iter().filter(|&&d| d == 0.0).count();
        assert!(unchanged < 10);
    }

    #[test]
    fn test_input_not_mutated() {
        let image = Array2::<f32>::zeros((4, 4));
        let mut rng = StdRng::seed_from_u64(0);
        let _ = add_noise(&image, 1.0, &mut rng).unwrap();
        assert!(image.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_wide_and_signed_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        let wide = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f64 * 1.5);
        assert_eq!(
            add_noise(&wide, 0.0, &mut rng).unwrap(),
            wide.mapv(|v| v as f32)
        );
        let signed = Array2::from_shape_fn((3, 3), |(r, c)| r as i32 * 3 - c as i32 - 4);
        assert_eq!(
            add_noise(&signed, 0.0, &mut rng).unwrap(),
            signed.mapv(|v| v as f32)
        );
    }

    #[test]
    fn test_negative_sigma() {
        let image = Array2::<f32>::zeros((2, 2));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            add_noise(&image, -1.0, &mut rng),
            Err(Error::InvalidParameter { name: "sigma", .. })
        ));
    }
}
