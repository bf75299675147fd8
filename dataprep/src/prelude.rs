pub use super::prep::augment::{augment_data, rot90};
pub use super::prep::crop::center_crop_2d;
pub use super::prep::error::{Error, Result};
pub use super::prep::io::{read_images, read_images_with, LoaderConfig, Pixel};
pub use super::prep::iter::PosIter;
pub use super::prep::merge::{combine_train_test_data, TestSet};
pub use super::prep::noise::add_noise;
pub use super::prep::patch::{create_patches, create_patches_with, PatchConfig};
pub use super::prep::pos::Pos;
pub use super::prep::shuffle::{shuffle_train_data, shuffle_train_data_with};
pub use super::prep::split::{
    split_train_test_data, split_train_test_data_with, DatasetLayout, Split, SplitConfig,
    SplitReport,
};
