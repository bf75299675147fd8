//! 数据集目录结构，以及将`train`目录按比例划分出`test`目录。

use super::error::{Error, Result};
use super::io::{read_images_with, LoaderConfig, Pixel};
use log::{info, warn};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 数据集中图像文件的扩展名。
pub const IMAGE_EXTENSION: &str = "tif";

/// 默认测试集比例。
pub const TEST_SUBSET: f64 = 0.2;

/// 默认划分随机数种子。
pub const SPLIT_SEED: u64 = 1000;

/// 训练集或测试集。
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    #[inline]
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// 数据集根目录：`root/{train, test}/{images, masks}/*.tif`。
///
/// 图像与标签按排序后的文件名一一配对。
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    #[inline]
    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.dir_name())
    }

    #[inline]
    pub fn images(&self, split: Split) -> PathBuf {
        let mut dir = self.split_dir(split);
        dir.push("images");
        dir
    }

    #[inline]
    pub fn masks(&self, split: Split) -> PathBuf {
        let mut dir = self.split_dir(split);
        dir.push("masks");
        dir
    }

    #[inline]
    pub fn train_images(&self) -> PathBuf {
        self.images(Split::Train)
    }

    #[inline]
    pub fn train_masks(&self) -> PathBuf {
        self.masks(Split::Train)
    }

    #[inline]
    pub fn test_images(&self) -> PathBuf {
        self.images(Split::Test)
    }

    #[inline]
    pub fn test_masks(&self) -> PathBuf {
        self.masks(Split::Test)
    }

    /// 递归列出`dir`下所有`.tif`文件，按路径排序。
    pub fn list_tifs(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().map_or(false, |e| e == IMAGE_EXTENSION)
            {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    /// 读取`split`下的全部图像与标签。
    pub fn read_pairs<A, B>(
        &self,
        split: Split,
        config: &LoaderConfig,
    ) -> Result<(Array3<A>, Array3<B>)>
    where
        A: Pixel,
        B: Pixel,
    {
        let images = Self::list_tifs(&self.images(split))?;
        let masks = Self::list_tifs(&self.masks(split))?;
        if images.len() != masks.len() {
            return Err(Error::UnpairedDataset {
                images: images.len(),
                masks: masks.len(),
            });
        }
        let x = read_images_with(&images, config)?;
        let y = read_images_with(&masks, config)?;
        Ok((x, y))
    }
}

/// 划分参数。
#[derive(Clone, Debug, PartialEq)]
pub struct SplitConfig {
    /// 移入测试集的比例，取值范围(0, 1)。
    pub test_subset: f64,
    /// 随机数种子。
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_subset: TEST_SUBSET,
            seed: SPLIT_SEED,
        }
    }
}

/// 一次划分的结果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitReport {
    /// 留在训练集中的图像对数。
    pub train: usize,
    /// 移入测试集的图像对数。
    pub test: usize,
    /// 测试集目录。
    pub test_dir: PathBuf,
}

/// 测试集大小为`ceil(test_subset * n)`，两侧都不能为空。
fn test_count(n: usize, test_subset: f64) -> Result<usize> {
    if !(test_subset > 0.0 && test_subset < 1.0) {
        return Err(Error::InvalidParameter {
            name: "test_subset",
            reason: format!("must lie in (0, 1), got {test_subset}"),
        });
    }
    let n_test = (test_subset * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::InvalidParameter {
            name: "test_subset",
            reason: format!("splitting {n} pairs with {test_subset} leaves one side empty"),
        });
    }
    Ok(n_test)
}

/// 将`file`移动到目录`dir`下，保持文件名。跨文件系统时退化为复制后删除。
fn move_into(file: &Path, dir: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| Error::InvalidParameter {
        name: "file",
        reason: format!("{} has no file name", file.display()),
    })?;
    let dest = dir.join(name);
    if dest.exists() {
        return Err(Error::DestinationExists(dest));
    }
    if let Err(e) = fs::rename(file, &dest) {
        warn!(
            "rename {} -> {} failed ({e}), copying instead",
            file.display(),
            dest.display()
        );
        fs::copy(file, &dest).map_err(|e| Error::io(file, e))?;
        fs::remove_file(file).map_err(|e| Error::io(file, e))?;
    }
    Ok(dest)
}

/// 按`config`将`root/train`中的一部分图像与标签**移动**到`root/test`。
///
/// 文件逐个移动，中途失败时已移动的文件不会回滚。
pub fn split_train_test_data_with<P: AsRef<Path>>(
    root: P,
    config: &SplitConfig,
) -> Result<SplitReport> {
    let layout = DatasetLayout::new(root.as_ref());
    let images = DatasetLayout::list_tifs(&layout.train_images())?;
    let masks = DatasetLayout::list_tifs(&layout.train_masks())?;
    if images.len() != masks.len() {
        return Err(Error::UnpairedDataset {
            images: images.len(),
            masks: masks.len(),
        });
    }
    let n = images.len();
    let n_test = test_count(n, config.test_subset)?;

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(config.seed));

    let test_images = layout.test_images();
    let test_masks = layout.test_masks();
    fs::create_dir_all(&test_images).map_err(|e| Error::io(&test_images, e))?;
    fs::create_dir_all(&test_masks).map_err(|e| Error::io(&test_masks, e))?;

    for &index in &order[..n_test] {
        move_into(&images[index], &test_images)?;
        move_into(&masks[index], &test_masks)?;
    }

    let test_dir = layout.split_dir(Split::Test);
    info!("test images/masks saved at {}", test_dir.display());
    Ok(SplitReport {
        train: n - n_test,
        test: n_test,
        test_dir,
    })
}

/// 以默认比例0.2和种子1000划分数据集。
#[inline]
pub fn split_train_test_data<P: AsRef<Path>>(root: P) -> Result<SplitReport> {
    split_train_test_data_with(root, &SplitConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::collections::BTreeSet;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(dir: &Path) -> BTreeSet<String> {
        DatasetLayout::list_tifs(dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn make_dataset(root: &Path, n: usize) -> DatasetLayout {
        let layout = DatasetLayout::new(root);
        fs::create_dir_all(layout.train_images()).unwrap();
        fs::create_dir_all(layout.train_masks()).unwrap();
        for i in 0..n {
            let name = format!("img_{i:02}.tif");
            fs::write(layout.train_images().join(&name), format!("image {i}")).unwrap();
            fs::write(layout.train_masks().join(&name), format!("mask {i}")).unwrap();
        }
        layout
    }

    #[test]
    fn test_half_split_moves_pairs() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let layout = make_dataset(dir.path(), 10);
        let config = SplitConfig {
            test_subset: 0.5,
            ..Default::default()
        };
        let report = split_train_test_data_with(dir.path(), &config).unwrap();
        assert_eq!(report.train, 5);
        assert_eq!(report.test, 5);
        assert_eq!(report.test_dir, dir.path().join("test"));

        let train_images = names(&layout.train_images());
        let test_images = names(&layout.test_images());
        assert_eq!(train_images.len(), 5);
        assert_eq!(test_images.len(), 5);
        assert!(train_images.is_disjoint(&test_images));
        assert_eq!(train_images.union(&test_images).count(), 10);
        // 图像与标签成对移动
        assert_eq!(names(&layout.train_masks()), train_images);
        assert_eq!(names(&layout.test_masks()), test_images);

        for name in &test_images {
            let content = fs::read_to_string(layout.test_masks().join(name)).unwrap();
            assert!(content.starts_with("mask"));
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let la = make_dataset(a.path(), 12);
        let lb = make_dataset(b.path(), 12);
        split_train_test_data(a.path()).unwrap();
        split_train_test_data(b.path()).unwrap();
        assert_eq!(names(&la.test_images()), names(&lb.test_images()));
        // ceil(0.2 * 12) = 3
        assert_eq!(names(&la.test_images()).len(), 3);
    }

    #[test]
    fn test_existing_test_dirs_are_reused() {
        let dir = tempfile::tempdir().unwrap();
        let layout = make_dataset(dir.path(), 10);
        fs::create_dir_all(layout.test_images()).unwrap();
        fs::create_dir_all(layout.test_masks()).unwrap();
        let report = split_train_test_data(dir.path()).unwrap();
        assert_eq!(report.test, 2);
        assert_eq!(names(&layout.test_masks()).len(), 2);
    }

    #[test]
    fn test_unpaired_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let layout = make_dataset(dir.path(), 4);
        fs::write(layout.train_images().join("extra.tif"), "x").unwrap();
        assert!(matches!(
            split_train_test_data(dir.path()),
            Err(Error::UnpairedDataset {
                images: 5,
                masks: 4
            })
        ));
        // 没有任何文件被移动
        assert!(!layout.test_images().exists());
    }

    #[test]
    fn test_invalid_fraction() {
        let dir = tempfile::tempdir().unwrap();
        make_dataset(dir.path(), 4);
        for test_subset in [0.0, 1.0, -0.5, f64::NAN] {
            let config = SplitConfig {
                test_subset,
                seed: 1,
            };
            assert!(matches!(
                split_train_test_data_with(dir.path(), &config),
                Err(Error::InvalidParameter {
                    name: "test_subset",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_destination_exists() {
        let dir = tempfile::tempdir().unwrap();
        let layout = make_dataset(dir.path(), 2);
        fs::create_dir_all(layout.test_images()).unwrap();
        for i in 0..2 {
            fs::write(layout.test_images().join(format!("img_{i:02}.tif")), "old").unwrap();
        }
        let config = SplitConfig {
            test_subset: 0.5,
            seed: 3,
        };
        assert!(matches!(
            split_train_test_data_with(dir.path(), &config),
            Err(Error::DestinationExists(_))
        ));
    }

    #[test]
    fn test_list_tifs_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("z.tif"), "").unwrap();
        fs::write(nested.join("y.tif"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = DatasetLayout::list_tifs(dir.path()).unwrap();
        assert_eq!(files, vec![nested.join("y.tif"), dir.path().join("z.tif")]);
        assert!(DatasetLayout::list_tifs(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_read_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        fs::create_dir_all(layout.train_images()).unwrap();
        fs::create_dir_all(layout.train_masks()).unwrap();
        for i in 0..3u8 {
            let name = format!("{i}.tif");
            GrayImage::from_pixel(5, 4, Luma([i * 10]))
                .save(layout.train_images().join(&name))
                .unwrap();
            GrayImage::from_pixel(5, 4, Luma([i]))
                .save(layout.train_masks().join(&name))
                .unwrap();
        }
        let (x, y) = layout
            .read_pairs::<f32, u8>(Split::Train, &LoaderConfig::default())
            .unwrap();
        assert_eq!(x.dim(), (3, 4, 5));
        assert_eq!(y.dim(), (3, 4, 5));
        for i in 0..3 {
            assert_eq!(x[[i, 3, 4]], (i * 10) as f32);
            assert_eq!(y[[i, 0, 0]], i as u8);
        }
    }
}
