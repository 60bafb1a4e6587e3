#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为心脏 MRI 数据集提供 DICOM 图像与手绘轮廓的结构化索引、
//! 轮廓栅格化和面向训练循环的批量加载.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 数据组织
//!
//! ```text
//! {root}/link.csv                                  (patient_id, study_id) 映射表
//! {root}/images/{patient_id}/{serial}.{ext}        图像切片
//! {root}/contours/{study_id}/inner/*-NNNN-icontour-*.txt
//! {root}/contours/{study_id}/outer/*-NNNN-ocontour-*.txt
//! ```
//!
//! 以上名称均可通过 [`Layout`] 修改.
//!
//! # 流程
//!
//! 1. [`DatasetIndex`] 读取映射表, 按 patient/study 逐对扫描目录,
//!   以文件名中的序号 (serial) 对齐图像与内外轮廓, 生成 [`Record`] 列表;
//! 2. [`DatasetIndex::iterate`] 打乱记录顺序并分批;
//! 3. 每一批在交付前加载: 解码图像, 解析轮廓并栅格化为掩码;
//! 4. 下一次取批时释放上一批. 预取模式下, 后台线程同时加载下一批.
//!
//! # 坐标约定
//!
//! 轮廓点为 `(x, y)`, 其中 x 为列 (width) 方向, y 为行 (height) 方向.
//! 像素网格按 `[row, col]` 即 `[y, x]` 访问. 像素 `(r, c)` 的中心为
//! `(c + 0.5, r + 0.5)`.
//!
//! # 开发计划
//!
//! ### 轮廓文件解析 ✅
//!
//! 实现位于 `dicom-berry/src/contour/mod.rs`.
//!
//! ### 多边形栅格化 ✅
//!
//! 扫描线 + 奇偶规则, 与逐像素射线法等价.
//!
//! 实现位于 `dicom-berry/src/contour/raster.rs`.
//!
//! ### 图像解码 ✅
//!
//! npy, nifti, 以及 (`dicom` feature 下的) DICOM.
//!
//! 实现位于 `dicom-berry/src/decode.rs`.
//!
//! ### 序号对齐, 数据集索引 ✅
//!
//! 实现位于 `dicom-berry/src/dataset/{matcher, index}.rs`.
//!
//! ### 双缓冲批量加载 ✅
//!
//! 实现位于 `dicom-berry/src/dataset/batch.rs`.

/// 二维索引 `(高, 宽)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 轮廓顶点 `(x, y)`. x 为列方向, y 为行方向.
pub type Point = (f64, f64);

/// 隐式闭合的多边形 (末点连回首点). 不检查自相交.
pub type Polygon = Vec<Point>;

/// 切片序号. 从文件名中提取, 仅在同一 (patient, study) 内有意义.
pub type SerialId = u32;

pub mod consts;

pub mod contour;

pub mod decode;

pub mod dataset;

mod error;

pub mod prelude;

pub use contour::{parse_contour_file, parse_contour_str, poly_to_mask};
pub use dataset::{
    Batch, BatchIter, DatasetIndex, Filenames, IndexOptions, Layout, LoadMode, Record, RecordData,
};
pub use decode::{ImageDecoder, NiftiDecoder, NpyDecoder};
pub use error::{DecodeError, Error, FolderDefect, Result};

#[cfg(feature = "dicom")]
pub use decode::DicomDecoder;
