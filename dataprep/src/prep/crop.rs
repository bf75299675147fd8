use super::error::{Error, Result};
use ndarray::{s, ArrayBase, ArrayView3, Data, Ix3};

/// 在后两个轴上对三维体数据`(Z, Y, X)`做居中裁剪，返回`(Z, crop_y, crop_x)`视图。
///
/// 起点为`(Y - crop_y) / 2`与`(X - crop_x) / 2`（向下取整），差值为奇数时裁剪区域偏向低索引一侧。
pub fn center_crop_2d<A, S>(
    volume: &ArrayBase<S, Ix3>,
    crop_y: usize,
    crop_x: usize,
) -> Result<ArrayView3<'_, A>>
where
    S: Data<Elem = A>,
{
    let (_, y, x) = volume.dim();
    if crop_y > y || crop_x > x {
        return Err(Error::CropSize {
            crop_y,
            crop_x,
            height: y,
            width: x,
        });
    }
    let start_y = (y - crop_y) / 2;
    let start_x = (x - crop_x) / 2;
    Ok(volume.slice(s![.., start_y..start_y + crop_y, start_x..start_x + crop_x]))
}
