//! 图像解码.
//!
//! 解码器把单个图像文件转换为 `(高, 宽)` 的 `i16` 像素网格. 数据集只依赖 [`ImageDecoder`]
//! trait; 具体格式由调用方选择.

use crate::error::DecodeError;
use ndarray::{Array2, ArrayD, Axis, Ix2};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;

/// 图像解码器.
///
/// 实现者须保证返回的网格按 `[row, col]` 排列.
pub trait ImageDecoder {
    /// 解码 `path` 处的图像文件.
    fn decode(&self, path: &Path) -> Result<Array2<i16>, DecodeError>;

    /// 该解码器接受的文件扩展名 (不含 `.`). 图像文件名模式由它导出.
    fn extension(&self) -> &str;
}

/// `.npy` 格式的二维 `i16` 数组.
#[derive(Copy, Clone, Debug, Default)]
pub struct NpyDecoder;

impl ImageDecoder for NpyDecoder {
    fn decode(&self, path: &Path) -> Result<Array2<i16>, DecodeError> {
        Ok(ndarray_npy::read_npy::<_, Array2<i16>>(path)?)
    }

    #[inline]
    fn extension(&self) -> &str {
        "npy"
    }
}

/// `.nii` 格式的单张切片, 即形状为 `[W, H]` 或 `[W, H, 1]` 的 nifti 体数据.
#[derive(Copy, Clone, Debug, Default)]
pub struct NiftiDecoder;

impl ImageDecoder for NiftiDecoder {
    fn decode(&self, path: &Path) -> Result<Array2<i16>, DecodeError> {
        let obj = ReaderOptions::new().read_file(path)?;
        let data: ArrayD<i16> = obj.into_volume().into_ndarray::<i16>()?;
        let shape = data.shape().to_vec();
        let data = match shape.as_slice() {
            [_, _] => data,
            [_, _, 1] => data.index_axis_move(Axis(2), 0),
            _ => return Err(DecodeError::Shape(shape.clone())),
        };
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| DecodeError::Shape(shape))?;

        // [W, H] -> [H, W].
        Ok(data.reversed_axes().as_standard_layout().into_owned())
    }

    #[inline]
    fn extension(&self) -> &str {
        "nii"
    }
}

/// `.dcm` 格式的 DICOM 文件. 多帧时只取第一帧, 多通道时只取第一个通道.
#[cfg(feature = "dicom")]
#[derive(Copy, Clone, Debug, Default)]
pub struct DicomDecoder;

#[cfg(feature = "dicom")]
impl ImageDecoder for DicomDecoder {
    fn decode(&self, path: &Path) -> Result<Array2<i16>, DecodeError> {
        use dicom_pixeldata::PixelDecoder;

        let obj = dicom_object::open_file(path).map_err(|e| DecodeError::Dicom(e.to_string()))?;
        let pixels = obj
            .decode_pixel_data()
            .map_err(|e| DecodeError::Dicom(e.to_string()))?;
        // [frames, rows, cols, samples]
        let data = pixels
            .to_ndarray::<i16>()
            .map_err(|e| DecodeError::Dicom(e.to_string()))?;
        if data.is_empty() {
            return Err(DecodeError::Shape(data.shape().to_vec()));
        }
        Ok(data
            .index_axis_move(Axis(0), 0)
            .index_axis_move(Axis(2), 0)
            .as_standard_layout()
            .into_owned())
    }

    #[inline]
    fn extension(&self) -> &str {
        "dcm"
    }
}
