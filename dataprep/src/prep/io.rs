//! 多线程读取图像文件并堆叠为一个数组。

use super::error::{Error, Result};
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageBuffer, Luma, Primitive};
use log::debug;
use ndarray::{stack, Array2, Array3, ArrayView2, Axis};
use ndarray_npy::ReadableElement;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Instant;
use threadpool::ThreadPool;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::{ColorType, TiffError};

/// 默认的读取线程数。
pub const LOADER_WORKERS: usize = 4;

/// 读取参数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// 工作线程数。为0或1时在调用线程上顺序读取。
    pub workers: usize,
}

impl LoaderConfig {
    /// 每个逻辑CPU一个工作线程。
    #[inline]
    pub fn all_cpus() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: LOADER_WORKERS,
        }
    }
}

/// 可以从单通道图像、TIFF或`.npy`文件读入的像素类型。
pub trait Pixel: ReadableElement + Copy + Send + 'static {
    /// 将解码后的图像转换为`(H, W)`数组。`path`仅用于报错。
    fn from_image(img: DynamicImage, path: &Path) -> Result<Array2<Self>>;

    /// 将TIFF解码出的按行排列的采样值转换为目标类型。
    fn from_tiff(data: DecodingResult, path: &Path) -> Result<Vec<Self>>;
}

fn luma_to_array<T: Primitive>(buf: ImageBuffer<Luma<T>, Vec<T>>) -> Result<Array2<T>> {
    let (w, h) = buf.dimensions();
    Ok(Array2::from_shape_vec((h as usize, w as usize), buf.into_raw())?)
}

#[inline]
fn unsupported(img: &DynamicImage, path: &Path) -> Error {
    Error::PixelFormat {
        path: path.to_path_buf(),
        color: format!("{:?}", img.color()),
    }
}

fn sample_name(data: &DecodingResult) -> &'static str {
    match data {
        DecodingResult::U8(_) => "u8",
        DecodingResult::U16(_) => "u16",
        DecodingResult::U32(_) => "u32",
        DecodingResult::U64(_) => "u64",
        DecodingResult::F32(_) => "f32",
        DecodingResult::F64(_) => "f64",
        DecodingResult::I8(_) => "i8",
        DecodingResult::I16(_) => "i16",
        DecodingResult::I32(_) => "i32",
        DecodingResult::I64(_) => "i64",
    }
}

#[inline]
fn unsupported_samples(data: &DecodingResult, path: &Path) -> Error {
    Error::PixelFormat {
        path: path.to_path_buf(),
        color: format!("{} tiff samples", sample_name(data)),
    }
}

impl Pixel for u8 {
    fn from_image(img: DynamicImage, path: &Path) -> Result<Array2<Self>> {
        match img {
            DynamicImage::ImageLuma8(buf) => luma_to_array(buf),
            other => Err(unsupported(&other, path)),
        }
    }

    fn from_tiff(data: DecodingResult, path: &Path) -> Result<Vec<Self>> {
        match data {
            DecodingResult::U8(v) => Ok(v),
            other => Err(unsupported_samples(&other, path)),
        }
    }
}

impl Pixel for u16 {
    fn from_image(img: DynamicImage, path: &Path) -> Result<Array2<Self>> {
        match img {
            DynamicImage::ImageLuma8(buf) => Ok(luma_to_array(buf)?.mapv(u16::from)),
            DynamicImage::ImageLuma16(buf) => luma_to_array(buf),
            other => Err(unsupported(&other, path)),
        }
    }

    fn from_tiff(data: DecodingResult, path: &Path) -> Result<Vec<Self>> {
        match data {
            DecodingResult::U8(v) => Ok(v.into_iter().map(u16::from).collect()),
            DecodingResult::U16(v) => Ok(v),
            other => Err(unsupported_samples(&other, path)),
        }
    }
}

impl Pixel for f32 {
    fn from_image(img: DynamicImage, path: &Path) -> Result<Array2<Self>> {
        match img {
            DynamicImage::ImageLuma8(buf) => Ok(luma_to_array(buf)?.mapv(f32::from)),
            DynamicImage::ImageLuma16(buf) => Ok(luma_to_array(buf)?.mapv(f32::from)),
            other => Err(unsupported(&other, path)),
        }
    }

    /// 任何整数或浮点采样都按数值转换为`f32`。
    fn from_tiff(data: DecodingResult, _path: &Path) -> Result<Vec<Self>> {
        Ok(match data {
            DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::F32(v) => v,
            DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        })
    }
}

/// 用`tiff`解码单通道TIFF的第一页，支持8到64位的无符号、有符号整数及浮点采样。
fn read_tiff<A: Pixel>(path: &Path) -> Result<Array2<A>> {
    let tiff_err = |source: TiffError| Error::Tiff {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(tiff_err)?;
    let (w, h) = decoder.dimensions().map_err(tiff_err)?;
    match decoder.colortype().map_err(tiff_err)? {
        ColorType::Gray(_) => (),
        other => {
            return Err(Error::PixelFormat {
                path: path.to_path_buf(),
                color: format!("{other:?}"),
            })
        }
    }
    let samples = A::from_tiff(decoder.read_image().map_err(tiff_err)?, path)?;
    Ok(Array2::from_shape_vec((h as usize, w as usize), samples)?)
}

/// 读取一张二维图像。`.tif`/`.tiff`经`tiff`解码，`.npy`经`ndarray-npy`读取，其余格式交给`image`解码。
pub fn read_image<A: Pixel>(path: &Path) -> Result<Array2<A>> {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("npy") => {
            ndarray_npy::read_npy(path).map_err(|source| Error::Npy {
                path: path.to_path_buf(),
                source,
            })
        }
        Some(ext) if ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff") => {
            read_tiff(path)
        }
        _ => {
            let img = ImageReader::open(path)
                .map_err(|e| Error::io(path, e))?
                .decode()
                .map_err(|source| Error::Image {
                    path: path.to_path_buf(),
                    source,
                })?;
            A::from_image(img, path)
        }
    }
}

/// 将形状相同的若干图像沿新的第0轴堆叠。
fn stack_images<A: Pixel>(images: &[Array2<A>]) -> Result<Array3<A>> {
    let first = images.first().ok_or(Error::Empty)?;
    if let Some(bad) = images.iter().find(|a| a.dim() != first.dim()) {
        return Err(Error::ShapeMismatch {
            expected: first.shape().to_vec(),
            actual: bad.shape().to_vec(),
        });
    }
    let views: Vec<ArrayView2<A>> = images.iter().map(|a| a.view()).collect();
    Ok(stack(Axis(0), &views)?)
}

/// 按`config`读取`paths`中的所有图像，返回`(N, H, W)`数组，第`i`行总是`paths[i]`的内容。
///
/// 任意一个文件读取失败都会使整个读取失败。
pub fn read_images_with<A, P>(paths: &[P], config: &LoaderConfig) -> Result<Array3<A>>
where
    A: Pixel,
    P: AsRef<Path>,
{
    let n = paths.len();
    if n == 0 {
        return Err(Error::Empty);
    }
    let timer = Instant::now();

    let images: Vec<Array2<A>> = if config.workers <= 1 || n == 1 {
        paths
            .iter()
            .map(|p| read_image(p.as_ref()))
            .collect::<Result<_>>()?
    } else {
        let pool = ThreadPool::new(config.workers.min(n));
        let (tx, rx) = channel();
        for (index, path) in paths.iter().enumerate() {
            let tx = tx.clone();
            let path = path.as_ref().to_path_buf();
            pool.execute(move || {
                // 接收端已因其它错误提前返回时丢弃结果
                let _ = tx.send((index, read_image::<A>(&path)));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Array2<A>>> = (0..n).map(|_| None).collect();
        for (index, result) in rx.iter() {
            slots[index] = Some(result?);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(Error::WorkerLost(index)))
            .collect::<Result<_>>()?
    };

    let stacked = stack_images(&images)?;
    debug!(
        "loaded {} images into {:?} with {} workers in {} ms",
        n,
        stacked.shape(),
        config.workers.max(1).min(n),
        timer.elapsed().as_millis()
    );
    Ok(stacked)
}

/// 使用4个工作线程读取`paths`中的所有图像。
#[inline]
pub fn read_images<A, P>(paths: &[P]) -> Result<Array3<A>>
where
    A: Pixel,
    P: AsRef<Path>,
{
    read_images_with(paths, &LoaderConfig::default())
}
