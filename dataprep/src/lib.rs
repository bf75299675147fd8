//! 分割/去噪模型训练前的数据准备工具集。

pub mod prelude;
pub mod prep;
