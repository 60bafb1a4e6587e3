//! 数据集操作.
//!
//! 提供数据目录的索引 ([`DatasetIndex`]), 单张切片记录 ([`Record`]),
//! 以及打乱后的批量迭代器 ([`BatchIter`]).

use crate::consts::layout;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod batch;
mod index;
pub mod matcher;
mod record;

#[cfg(test)]
mod fixture;

pub use batch::{Batch, BatchIter};
pub use index::{DatasetIndex, Summary};
pub use record::{Filenames, Record, RecordData};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 数据目录布局. 所有名称均相对于其上级目录.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    /// 映射表文件名, 位于数据根目录下.
    pub link_file: String,

    /// 图像根目录名, 其下为 `{patient_id}` 子目录.
    pub image_dir: String,

    /// 轮廓根目录名, 其下为 `{study_id}` 子目录.
    pub contour_dir: String,

    /// `{study_id}` 下的内轮廓目录名.
    pub inner_dir: String,

    /// `{study_id}` 下的外轮廓目录名.
    pub outer_dir: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            link_file: layout::LINK_FILE.to_string(),
            image_dir: layout::IMAGE_DIR.to_string(),
            contour_dir: layout::CONTOUR_DIR.to_string(),
            inner_dir: layout::INNER_DIR.to_string(),
            outer_dir: layout::OUTER_DIR.to_string(),
        }
    }
}

impl Layout {
    /// `{root}/{link_file}`.
    #[inline]
    pub fn link_path(&self, root: &Path) -> PathBuf {
        root.join(&self.link_file)
    }

    /// `{root}/{image_dir}`.
    #[inline]
    pub fn image_root(&self, root: &Path) -> PathBuf {
        root.join(&self.image_dir)
    }

    /// `{root}/{contour_dir}`.
    #[inline]
    pub fn contour_root(&self, root: &Path) -> PathBuf {
        root.join(&self.contour_dir)
    }

    /// 某个 patient 的图像目录.
    #[inline]
    pub fn image_dir_of(&self, root: &Path, patient_id: &str) -> PathBuf {
        self.image_root(root).join(patient_id)
    }

    /// 某个 study 的 (内轮廓, 外轮廓) 目录.
    pub fn contour_dirs_of(&self, root: &Path, study_id: &str) -> (PathBuf, PathBuf) {
        let study = self.contour_root(root).join(study_id);
        (study.join(&self.inner_dir), study.join(&self.outer_dir))
    }
}

/// 批量加载的调度模式.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadMode {
    /// 在调用线程上加载, 加载完成后才交付.
    #[default]
    Sync,

    /// 交付第 k 批的同时, 由单个后台线程加载第 k + 1 批.
    Prefetch,
}

/// [`DatasetIndex`] 的构造选项.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexOptions {
    /// 目录布局.
    pub layout: Layout,

    /// 批量加载模式.
    pub mode: LoadMode,
}

impl IndexOptions {
    /// 以默认布局和指定加载模式构造.
    #[inline]
    pub fn with_mode(mode: LoadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}
