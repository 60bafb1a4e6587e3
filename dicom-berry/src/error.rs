//! 运行时错误.

use std::fmt::{self, Formatter};
use std::path::PathBuf;

/// 本 crate 的通用结果类型.
pub type Result<T> = std::result::Result<T, Error>;

/// 索引、加载、栅格化过程中的错误.
#[derive(Debug)]
pub enum Error {
    /// 数据目录不合法 (构造 [`crate::DatasetIndex`] 时).
    InvalidDataFolder {
        /// 数据根目录.
        path: PathBuf,
        /// 具体缺陷.
        defect: FolderDefect,
    },

    /// 轮廓文件某一非空行不能解析为恰好两个浮点数.
    MalformedContourFile {
        /// 轮廓文件路径.
        path: PathBuf,
        /// 出错行号, 从 1 开始.
        line: usize,
    },

    /// 图像解码失败.
    Decode {
        /// 图像文件路径.
        path: PathBuf,
        /// 解码器给出的原因.
        source: DecodeError,
    },

    /// 栅格化目标尺寸非法 (宽或高为 0).
    InvalidDimensions {
        /// 宽.
        width: usize,
        /// 高.
        height: usize,
    },

    /// 读取轮廓文件时的底层 I/O 错误.
    Io {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// 由解码器扩展名构造的图像文件名模式无法编译.
    InvalidPattern(regex::Error),
}

/// 数据目录缺陷.
#[derive(Debug)]
pub enum FolderDefect {
    /// 根路径不存在或不是目录.
    NotADirectory,

    /// 映射表文件不存在.
    MissingMappingFile,

    /// 映射表无法读取, 或某行与表头列数不一致.
    MalformedMapping(csv::Error),

    /// 映射表表头不是恰好两列. 参数为实际列数.
    MappingColumns(usize),

    /// 图像根目录不存在.
    MissingImageDir,

    /// 轮廓根目录不存在.
    MissingContourDir,
}

/// 图像解码错误.
#[derive(Debug)]
pub enum DecodeError {
    /// 读取 npy 文件失败.
    Npy(ndarray_npy::ReadNpyError),

    /// 读取 nifti 文件失败.
    Nifti(nifti::NiftiError),

    /// 读取或解码 DICOM 文件失败.
    Dicom(String),

    /// 数据不是二维切片. 参数为实际形状.
    Shape(Vec<usize>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDataFolder { path, defect } => {
                write!(f, "`{}` is not a valid data folder: {defect}", path.display())
            }
            Self::MalformedContourFile { path, line } => {
                write!(f, "malformed contour file `{}` at line {line}", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "cannot decode image `{}`: {source}", path.display())
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid raster dimensions {width}x{height}")
            }
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::InvalidPattern(e) => write!(f, "invalid image filename pattern: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidDataFolder {
                defect: FolderDefect::MalformedMapping(e),
                ..
            } => Some(e),
            Self::Decode { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::InvalidPattern(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for FolderDefect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADirectory => f.write_str("not a directory"),
            Self::MissingMappingFile => f.write_str("mapping file is missing"),
            Self::MalformedMapping(e) => write!(f, "mapping file is malformed ({e})"),
            Self::MappingColumns(n) => write!(f, "mapping file has {n} columns, expected 2"),
            Self::MissingImageDir => f.write_str("image directory is missing"),
            Self::MissingContourDir => f.write_str("contour directory is missing"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npy(e) => write!(f, "npy: {e}"),
            Self::Nifti(e) => write!(f, "nifti: {e}"),
            Self::Dicom(e) => write!(f, "dicom: {e}"),
            Self::Shape(shape) => write!(f, "expected a 2-D slice, found shape {shape:?}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<ndarray_npy::ReadNpyError> for DecodeError {
    #[inline]
    fn from(value: ndarray_npy::ReadNpyError) -> Self {
        Self::Npy(value)
    }
}

impl From<nifti::NiftiError> for DecodeError {
    #[inline]
    fn from(value: nifti::NiftiError) -> Self {
        Self::Nifti(value)
    }
}

impl From<regex::Error> for Error {
    #[inline]
    fn from(value: regex::Error) -> Self {
        Self::InvalidPattern(value)
    }
}
