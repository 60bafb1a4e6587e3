use crate::consts::TAG_SERIAL_WIDTH;
use crate::contour::{bounding_shape, check_grid, parse_contour_file, poly_to_mask};
use crate::decode::ImageDecoder;
use crate::error::{Error, Result};
use crate::{Idx2d, Point, Polygon, SerialId};
use ndarray::Array2;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一个切片的 (图像, 内轮廓, 外轮廓) 文件. 缺失的为 `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Filenames {
    /// 图像文件.
    pub image: Option<PathBuf>,

    /// 内轮廓文件.
    pub inner: Option<PathBuf>,

    /// 外轮廓文件.
    pub outer: Option<PathBuf>,
}

/// 已加载的像素数据. 三者形状相同.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordData {
    /// 图像. 图像文件缺失时为全 0.
    pub image: Array2<i16>,

    /// 内轮廓掩码. 内轮廓缺失时为全 `false`.
    pub inner: Array2<bool>,

    /// 外轮廓掩码. 外轮廓缺失时为全 `false`.
    pub outer: Array2<bool>,
}

impl RecordData {
    /// 数据形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.image.dim()
    }
}

/// 单张切片记录: `(patient, study, serial)` 身份, 对应文件, 以及加载状态.
///
/// 状态只有 `Unloaded` (初始) 和 `Loaded` 两种, 由 [`Record::load`] 和 [`Record::clear`]
/// 显式转换. 身份字段创建后不可变.
#[derive(Clone, Debug)]
pub struct Record {
    patient_id: String,
    study_id: String,
    serial: SerialId,
    files: Filenames,
    /// `None` 即 `Unloaded`.
    loaded: Option<RecordData>,
}

impl Record {
    /// 以 `Unloaded` 状态创建记录.
    pub fn new(patient_id: &str, study_id: &str, serial: SerialId, files: Filenames) -> Self {
        Self {
            patient_id: patient_id.to_owned(),
            study_id: study_id.to_owned(),
            serial,
            files,
            loaded: None,
        }
    }

    /// 复制身份信息, 得到一个 `Unloaded` 的新记录. 不复制像素数据.
    #[inline]
    pub fn detached(&self) -> Self {
        Self::new(
            &self.patient_id,
            &self.study_id,
            self.serial,
            self.files.clone(),
        )
    }

    /// patient id.
    #[inline]
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// study id.
    #[inline]
    pub fn study_id(&self) -> &str {
        &self.study_id
    }

    /// 序号.
    #[inline]
    pub fn serial(&self) -> SerialId {
        self.serial
    }

    /// 对应文件.
    #[inline]
    pub fn files(&self) -> &Filenames {
        &self.files
    }

    /// 稳定的文本标签 `{patient_id}_{study_id}_{serial:04}`.
    pub fn tag(&self) -> String {
        format!(
            "{}_{}_{:0width$}",
            self.patient_id,
            self.study_id,
            self.serial,
            width = TAG_SERIAL_WIDTH
        )
    }

    /// 是否有图像文件.
    #[inline]
    pub fn has_image(&self) -> bool {
        self.files.image.is_some()
    }

    /// 是否有内轮廓文件.
    #[inline]
    pub fn has_inner_contour(&self) -> bool {
        self.files.inner.is_some()
    }

    /// 是否有外轮廓文件.
    #[inline]
    pub fn has_outer_contour(&self) -> bool {
        self.files.outer.is_some()
    }

    /// 是否已加载.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// 已加载的数据. 未加载时返回 `None`, 不会触发加载.
    #[inline]
    pub fn data(&self) -> Option<&RecordData> {
        self.loaded.as_ref()
    }

    /// 加载像素数据并返回. 已加载时直接返回缓存, 不访问磁盘.
    ///
    /// 1. 若有图像, 用 `decoder` 解码, 其形状即参考形状;
    /// 2. 否则参考形状取所有已有轮廓的包围盒 (`round(max + 1)`), 图像以全 0 代替;
    /// 3. 已有轮廓按参考形状栅格化, 缺失轮廓以全 `false` 代替.
    ///
    /// 图像和轮廓都缺失时得到三个 `0 x 0` 网格.
    /// 失败时记录保持 `Unloaded`.
    pub fn load<D: ImageDecoder + ?Sized>(&mut self, decoder: &D) -> Result<&RecordData> {
        let data = match self.loaded.take() {
            Some(data) => data,
            None => self.read(decoder)?,
        };
        Ok(self.loaded.insert(data))
    }

    /// 丢弃已加载的数据. 对未加载的记录无操作.
    #[inline]
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    fn read<D: ImageDecoder + ?Sized>(&self, decoder: &D) -> Result<RecordData> {
        let image = self
            .files
            .image
            .as_deref()
            .map(|p| {
                decoder.decode(p).map_err(|source| Error::Decode {
                    path: p.to_owned(),
                    source,
                })
            })
            .transpose()?;
        let inner = read_polygon(self.files.inner.as_deref())?;
        let outer = read_polygon(self.files.outer.as_deref())?;

        let (height, width) = match &image {
            Some(img) => img.dim(),
            None => bounding_shape(inner.iter().chain(outer.iter())),
        };
        check_grid(height, width)?;
        let image = image.unwrap_or_else(|| Array2::zeros((height, width)));
        let inner = rasterize(inner.as_deref(), width, height)?;
        let outer = rasterize(outer.as_deref(), width, height)?;
        Ok(RecordData {
            image,
            inner,
            outer,
        })
    }
}

#[inline]
fn read_polygon(path: Option<&Path>) -> Result<Option<Polygon>> {
    path.map(parse_contour_file).transpose()
}

/// 缺失的轮廓, 以及空网格, 都直接得到全 `false` 掩码.
fn rasterize(polygon: Option<&[Point]>, width: usize, height: usize) -> Result<Array2<bool>> {
    match polygon {
        Some(p) if width > 0 && height > 0 => poly_to_mask(p, width, height),
        _ => Ok(Array2::from_elem((height, width), false)),
    }
}
