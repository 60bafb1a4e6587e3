//! 通用常量.

/// 默认目录布局中的名称.
pub mod layout {
    /// `(patient_id, study_id)` 映射表文件名.
    pub const LINK_FILE: &str = "link.csv";

    /// 图像根目录名. 其下每个 patient 一个子目录.
    pub const IMAGE_DIR: &str = "images";

    /// 轮廓根目录名. 其下每个 study 一个子目录.
    pub const CONTOUR_DIR: &str = "contours";

    /// 内轮廓子目录名.
    pub const INNER_DIR: &str = "inner";

    /// 外轮廓子目录名.
    pub const OUTER_DIR: &str = "outer";
}

/// 文件名模式. 捕获组 1 为序号.
pub mod pattern {
    /// 内轮廓文件名模式, 如 `IM-0001-0048-icontour-manual.txt`.
    pub const INNER_CONTOUR: &str = r"-(\d{4})-icontour-.*\.txt$";

    /// 外轮廓文件名模式, 如 `IM-0001-0048-ocontour-manual.txt`.
    pub const OUTER_CONTOUR: &str = r"-(\d{4})-ocontour-.*\.txt$";
}

/// 记录标签中序号的补零宽度.
pub const TAG_SERIAL_WIDTH: usize = 4;

/// 预取线程名.
pub const PREFETCH_THREAD_NAME: &str = "dicom-berry-prefetch";
