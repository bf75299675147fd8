/// 代表一个坐标(height, width)索引，通常是图块的左上角，不负责边界检查。
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pos {
    pub h: usize,
    pub w: usize,
}

impl Pos {
    #[inline]
    pub fn new(h: usize, w: usize) -> Self {
        Self { h, w }
    }

    /// 以`self`为左上角、边长为`size`的正方形区域在两个轴上的半开区间。
    #[inline]
    pub fn square(self, size: usize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        (self.h..self.h + size, self.w..self.w + size)
    }
}

impl From<(usize, usize)> for Pos {
    #[inline]
    fn from(pos: (usize, usize)) -> Self {
        Pos::new(pos.0, pos.1)
    }
}
