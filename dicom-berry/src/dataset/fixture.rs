//! 测试用的临时数据目录.

use crate::consts::layout;
use crate::decode::{ImageDecoder, NpyDecoder};
use crate::error::DecodeError;
use crate::SerialId;
use ndarray::Array2;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试图像边长.
pub const SIDE: usize = 16;

/// 写入一张 `(h, w)` 的、像素全为 `value` 的 npy 图像.
pub fn write_image(path: &Path, h: usize, w: usize, value: i16) {
    ndarray_npy::write_npy(path, &Array2::<i16>::from_elem((h, w), value)).unwrap();
}

/// 写入正方形轮廓 `[lo, hi] x [lo, hi]`.
pub fn write_square(path: &Path, lo: f64, hi: f64) {
    let text = format!("{lo:.2} {lo:.2}\n{hi:.2} {lo:.2}\n{hi:.2} {hi:.2}\n{lo:.2} {hi:.2}\n");
    fs::write(path, text).unwrap();
}

/// 创建 `images/`, `contours/` 以及映射表.
pub fn make_root(root: &Path, pairs: &[(&str, &str)]) {
    fs::create_dir_all(root.join(layout::IMAGE_DIR)).unwrap();
    fs::create_dir_all(root.join(layout::CONTOUR_DIR)).unwrap();
    let mut text = String::from("patient_id,original_id\n");
    for (pid, sid) in pairs {
        text.push_str(&format!("{pid},{sid}\n"));
    }
    fs::write(root.join(layout::LINK_FILE), text).unwrap();
}

/// 按需写入一个切片的图像 (像素值为序号) 和内外轮廓.
pub fn add_slice(
    root: &Path,
    patient: &str,
    study: &str,
    serial: SerialId,
    (image, inner, outer): (bool, bool, bool),
) {
    let img_dir = root.join(layout::IMAGE_DIR).join(patient);
    let study_dir = root.join(layout::CONTOUR_DIR).join(study);
    let inner_dir = study_dir.join(layout::INNER_DIR);
    let outer_dir = study_dir.join(layout::OUTER_DIR);
    for d in [&img_dir, &inner_dir, &outer_dir] {
        fs::create_dir_all(d).unwrap();
    }
    if image {
        write_image(
            &img_dir.join(format!("{serial}.npy")),
            SIDE,
            SIDE,
            serial as i16,
        );
    }
    if inner {
        let name = format!("IM-0001-{serial:04}-icontour-manual.txt");
        write_square(&inner_dir.join(name), 4.0, 8.0);
    }
    if outer {
        let name = format!("IM-0001-{serial:04}-ocontour-manual.txt");
        write_square(&outer_dir.join(name), 2.0, 12.0);
    }
}

/// 两个 patient, 共 7 张切片.
pub fn standard(root: &Path) {
    make_root(root, &[("SCD0000101", "SC-HF-I-1"), ("SCD0000201", "SC-HF-I-2")]);
    for (serial, flags) in [
        (1, (true, false, false)),
        (2, (true, true, false)),
        (3, (true, true, true)),
        (4, (true, false, true)),
    ] {
        add_slice(root, "SCD0000101", "SC-HF-I-1", serial, flags);
    }
    for (serial, flags) in [
        (20, (true, true, true)),
        (40, (true, true, false)),
        (60, (false, true, true)),
    ] {
        add_slice(root, "SCD0000201", "SC-HF-I-2", serial, flags);
    }
}

/// 统计解码次数的 npy 解码器. 克隆体共享计数.
#[derive(Clone, Debug, Default)]
pub struct CountingDecoder {
    decoded: Arc<AtomicUsize>,
}

impl CountingDecoder {
    /// 至今解码的图像数.
    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::Acquire)
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, path: &Path) -> Result<Array2<i16>, DecodeError> {
        let ans = NpyDecoder.decode(path);
        self.decoded.fetch_add(1, Ordering::Release);
        ans
    }

    fn extension(&self) -> &str {
        "npy"
    }
}
