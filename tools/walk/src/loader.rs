//! 对 `dicom-berry::dataset` 的更一层封装. 提供更直接的数据集加载器.

use dicom_berry::{DatasetIndex, ImageDecoder, IndexOptions, LoadMode};
use std::env;
use std::path::PathBuf;

/// 数据根目录的环境变量名.
pub const DATA_DIR_ENV: &str = "DICOM_BERRY_DIR";

/// 获取数据根目录.
///
/// 1. 若环境变量 `$DICOM_BERRY_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/dicom-berry`. 无法确定主目录时返回 `None`.
pub fn data_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(DATA_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dicom_berry::dataset::home_dataset_dir_with(["dicom-berry"]),
    }
}

/// 以默认布局和 `mode` 打开 `$DICOM_BERRY_DIR` 或者 `$HOME/dataset/dicom-berry` 下的数据集.
pub fn index_from_env_or_home<D: ImageDecoder>(
    decoder: D,
    mode: LoadMode,
) -> Result<DatasetIndex<D>, String> {
    let root = data_dir_from_env_or_home()
        .ok_or_else(|| format!("cannot locate home directory, set `${DATA_DIR_ENV}`"))?;
    log::info!("opening `{}`", root.display());
    DatasetIndex::with_options(root, decoder, IndexOptions::with_mode(mode)).map_err(|e| e.to_string())
}
