//! 按文件名中的序号对齐图像、内轮廓、外轮廓三类文件.

use crate::consts::pattern;
use crate::dataset::Filenames;
use crate::SerialId;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// 常量模式, 编译不会失败.
static INNER_CONTOUR: Lazy<Regex> = Lazy::new(|| Regex::new(pattern::INNER_CONTOUR).unwrap());
static OUTER_CONTOUR: Lazy<Regex> = Lazy::new(|| Regex::new(pattern::OUTER_CONTOUR).unwrap());

/// 一个序号及其对应的 (至多三个) 文件.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matched {
    /// 序号.
    pub serial: SerialId,

    /// 对应文件. 缺失的模态为 `None`.
    pub files: Filenames,
}

/// 构造图像文件名模式: 紧邻 `.{extension}` 结尾之前的数字为序号.
pub fn image_pattern(extension: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(\d+)\.{}$", regex::escape(extension)))
}

/// 用 `pattern` 从文件名 `name` 中提取序号. 捕获组 1 必须是十进制数字.
#[inline]
pub fn serial_of(name: &str, pattern: &Regex) -> Option<SerialId> {
    pattern.captures(name)?.get(1)?.as_str().parse().ok()
}

/// 扫描三个目录并按序号对齐.
///
/// 任一目录可以为 `None` (不存在). 列目录失败也视为该模态没有文件.
/// 返回序号严格升序的所有序号的并集, 每个序号附带其 (图像, 内轮廓, 外轮廓) 文件.
///
/// # 注意
///
/// 同一目录中若多个文件解析出相同序号, 则目录列举顺序中靠后的文件生效.
/// 列举顺序依赖平台, 因此这种情况下具体选中哪个文件是不确定的.
pub fn match_serials(
    image_dir: Option<&Path>,
    inner_dir: Option<&Path>,
    outer_dir: Option<&Path>,
    image_pattern: &Regex,
) -> Vec<Matched> {
    let mut images = scan_dir(image_dir, image_pattern);
    let mut inners = scan_dir(inner_dir, &INNER_CONTOUR);
    let mut outers = scan_dir(outer_dir, &OUTER_CONTOUR);

    let serials: Vec<SerialId> = [images.keys(), inners.keys(), outers.keys()]
        .into_iter()
        .kmerge()
        .dedup()
        .copied()
        .collect();

    serials
        .into_iter()
        .map(|serial| Matched {
            serial,
            files: Filenames {
                image: images.remove(&serial),
                inner: inners.remove(&serial),
                outer: outers.remove(&serial),
            },
        })
        .collect()
}

/// 序号 -> 文件路径. 只考虑普通文件.
fn scan_dir(dir: Option<&Path>, pattern: &Regex) -> BTreeMap<SerialId, PathBuf> {
    let mut map = BTreeMap::new();
    let Some(dir) = dir else {
        return map;
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("cannot list `{}`, treated as empty: {e}", dir.display());
            return map;
        }
    };

    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let name = entry.file_name();
        let Some(serial) = name.to_str().and_then(|n| serial_of(n, pattern)) else {
            log::trace!("ignore `{}`", entry.path().display());
            continue;
        };
        let path = entry.path();
        if let Some(prev) = map.insert(serial, path) {
            log::warn!(
                "duplicate serial {serial} in `{}`, `{}` is overridden",
                dir.display(),
                prev.display()
            );
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn presence(m: &Matched) -> (SerialId, bool, bool, bool) {
        (
            m.serial,
            m.files.image.is_some(),
            m.files.inner.is_some(),
            m.files.outer.is_some(),
        )
    }

    #[test]
    fn test_serial_of() {
        let img = image_pattern("dcm").unwrap();
        assert_eq!(serial_of("48.dcm", &img), Some(48));
        assert_eq!(serial_of("IM_0007.dcm", &img), Some(7));
        assert_eq!(serial_of("48.dcm.bak", &img), None);
        assert_eq!(serial_of("48xdcm", &img), None);
        assert_eq!(serial_of("abc.dcm", &img), None);

        assert_eq!(
            serial_of("IM-0001-0048-icontour-manual.txt", &INNER_CONTOUR),
            Some(48)
        );
        assert_eq!(
            serial_of("IM-0001-0048-ocontour-manual.txt", &INNER_CONTOUR),
            None
        );
        assert_eq!(
            serial_of("IM-0001-0120-ocontour-manual.txt", &OUTER_CONTOUR),
            Some(120)
        );
        assert_eq!(serial_of("IM-0001-48-icontour-manual.txt", &INNER_CONTOUR), None);
    }

    #[test]
    fn test_match_partial_presence() {
        let root = tempfile::tempdir().unwrap();
        let (img, inner, outer) = (
            root.path().join("img"),
            root.path().join("inner"),
            root.path().join("outer"),
        );
        for d in [&img, &inner, &outer] {
            fs::create_dir(d).unwrap();
        }
        for i in [3, 1, 2] {
            touch(&img, &format!("{i}.npy"));
        }
        touch(&inner, "IM-0001-0002-icontour-manual.txt");
        touch(&inner, "IM-0001-0003-icontour-manual.txt");
        touch(&outer, "IM-0001-0003-ocontour-manual.txt");
        // 无关文件与子目录.
        touch(&img, "readme.txt");
        fs::create_dir(img.join("9.npy")).unwrap();

        let pattern = image_pattern("npy").unwrap();
        let ans = match_serials(
            Some(img.as_path()),
            Some(inner.as_path()),
            Some(outer.as_path()),
            &pattern,
        );
        let flags: Vec<_> = ans.iter().map(presence).collect();
        assert_eq!(
            flags,
            vec![
                (1, true, false, false),
                (2, true, true, false),
                (3, true, true, true),
            ]
        );
        assert_eq!(ans[2].files.outer, Some(outer.join("IM-0001-0003-ocontour-manual.txt")));
    }

    #[test]
    fn test_match_union_and_absent_dirs() {
        let root = tempfile::tempdir().unwrap();
        let img = root.path().join("img");
        let inner = root.path().join("inner");
        fs::create_dir(&img).unwrap();
        fs::create_dir(&inner).unwrap();
        touch(&img, "10.npy");
        touch(&inner, "IM-0002-0005-icontour-manual.txt");
        touch(&inner, "IM-0002-0020-icontour-manual.txt");

        let pattern = image_pattern("npy").unwrap();
        let missing = root.path().join("does-not-exist");
        let ans = match_serials(
            Some(img.as_path()),
            Some(inner.as_path()),
            Some(missing.as_path()),
            &pattern,
        );
        let flags: Vec<_> = ans.iter().map(presence).collect();
        assert_eq!(
            flags,
            vec![
                (5, false, true, false),
                (10, true, false, false),
                (20, false, true, false),
            ]
        );

        let ans = match_serials(None, Some(inner.as_path()), None, &pattern);
        assert_eq!(ans.iter().map(|m| m.serial).collect::<Vec<_>>(), vec![5, 20]);

        assert!(match_serials(None, None, None, &pattern).is_empty());
    }

    #[test]
    fn test_duplicate_serial_keeps_one() {
        let root = tempfile::tempdir().unwrap();
        let img = root.path().join("img");
        fs::create_dir(&img).unwrap();
        touch(&img, "1.npy");
        touch(&img, "IM_0001.npy");
        touch(&img, "2.npy");

        let pattern = image_pattern("npy").unwrap();
        let ans = match_serials(Some(img.as_path()), None, None, &pattern);
        // 只断言序号集合, 不依赖目录列举顺序.
        assert_eq!(ans.iter().map(|m| m.serial).collect::<Vec<_>>(), vec![1, 2]);
        assert!(ans[0].files.image.is_some());
    }
}
