//! 数据准备过程中的错误类型。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// 读取或移动文件失败。
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 图像解码失败。
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// `.npy`文件读取失败。
    #[error("failed to read npy file {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    /// TIFF文件解码失败。
    #[error("failed to decode tiff {path}: {source}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    /// 图像的颜色或采样类型无法转换为目标像素类型。
    #[error("unsupported pixel format {color} in {path}")]
    PixelFormat { path: PathBuf, color: String },

    /// 遍历数据集目录失败。
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// 数组形状不匹配。
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// ndarray的拼接/堆叠失败。
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 数组维数不满足要求。
    #[error("expected at least {expected} axes, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// 图块边长为零或超出图像范围。
    #[error("patch size {size} does not fit into a {height}x{width} image")]
    PatchSize {
        size: usize,
        height: usize,
        width: usize,
    },

    /// 中心裁剪尺寸超出原图范围。
    #[error("crop {crop_y}x{crop_x} exceeds source {height}x{width}")]
    CropSize {
        crop_y: usize,
        crop_x: usize,
        height: usize,
        width: usize,
    },

    /// 测试集与训练集维数相同但空间尺寸不同。
    #[error("test stack has spatial shape {test:?}, training stack has {train:?}")]
    IncompatibleTestShape {
        train: (usize, usize),
        test: (usize, usize),
    },

    /// 图像与标签文件数目不一致。
    #[error("{images} image files but {masks} mask files")]
    UnpairedDataset { images: usize, masks: usize },

    /// 移动文件时目标已存在。
    #[error("destination {0} already exists")]
    DestinationExists(PathBuf),

    /// 参数取值非法。
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// 没有任何输入。
    #[error("nothing to load")]
    Empty,

    /// 工作线程在返回结果前退出。
    #[error("loader worker exited before reporting image {0}")]
    WorkerLost(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[inline]
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
