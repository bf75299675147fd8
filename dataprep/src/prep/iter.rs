use super::pos::Pos;

/// 按行优先顺序枚举`(h_len, w_len)`网格内的所有坐标。
pub struct PosIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new(h_len: usize, w_len: usize) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h: if w_len == 0 { 0 } else { h_len },
            w: w_len,
        }
    }

    /// 枚举一张(`height` * `width`)图像中所有可以放下边长为`size`的图块的左上角坐标。
    ///
    /// 如果`size`为零或大于任意一边，则迭代器为空。
    #[inline]
    pub fn patch_origins(height: usize, width: usize, size: usize) -> Self {
        if size == 0 || size > height || size > width {
            return Self::new(0, 0);
        }
        Self::new(height - size + 1, width - size + 1)
    }

    /// 网格内坐标总数。
    #[inline]
    pub fn total(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for PosIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_h == self.h {
            return None;
        }
        let ret_pos = Pos::new(self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.w {
            self.cur_w = 0;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret_pos)
    }
}
