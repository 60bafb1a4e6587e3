//! 手绘轮廓: 文本解析与栅格化.
//!
//! 轮廓文件每个非空行包含两个以空白分隔的浮点数 `x y`, 按顺序构成一个隐式闭合的多边形.

use crate::error::{Error, Result};
use crate::{Idx2d, Point, Polygon};
use num::ToPrimitive;
use ordered_float::OrderedFloat;
use std::path::Path;

mod raster;

pub use raster::poly_to_mask;

/// 解析轮廓文件.
///
/// 空白行被跳过, 空文件得到空多边形. 任何非空行若不能解析为恰好两个浮点数,
/// 返回 `Err(Error::MalformedContourFile)`.
pub fn parse_contour_file<P: AsRef<Path>>(path: P) -> Result<Polygon> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_contour_str(&text).map_err(|line| Error::MalformedContourFile {
        path: path.to_owned(),
        line,
    })
}

/// 解析内存中的轮廓文本. 失败时返回出错行号 (从 1 开始).
pub fn parse_contour_str(text: &str) -> std::result::Result<Polygon, usize> {
    let mut polygon = Vec::new();
    for (no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        polygon.push(parse_point(line).ok_or(no + 1)?);
    }
    Ok(polygon)
}

/// 恰好两个有限浮点数, 否则为 `None`. `nan`, `inf` 不是合法坐标.
fn parse_point(line: &str) -> Option<Point> {
    let mut it = line.split_whitespace();
    let x = it.next()?.parse::<f64>().ok()?;
    let y = it.next()?.parse::<f64>().ok()?;
    (it.next().is_none() && x.is_finite() && y.is_finite()).then_some((x, y))
}

/// 由若干多边形的包围盒推出栅格尺寸 `(高, 宽)`.
///
/// 每个方向取 `round(max + 1)`, 负值截断为 0. 没有任何点时返回 `(0, 0)`.
pub fn bounding_shape<'a, I: IntoIterator<Item = &'a Polygon>>(polygons: I) -> Idx2d {
    let mut max_x: Option<OrderedFloat<f64>> = None;
    let mut max_y: Option<OrderedFloat<f64>> = None;
    for &(x, y) in polygons.into_iter().flatten() {
        max_x = max_x.max(Some(OrderedFloat(x)));
        max_y = max_y.max(Some(OrderedFloat(y)));
    }

    #[inline]
    fn extent(m: Option<OrderedFloat<f64>>) -> usize {
        m.and_then(|v| (v.0 + 1.0).round().to_usize()).unwrap_or(0)
    }

    (extent(max_y), extent(max_x))
}

/// 检查 `(height, width)` 的网格能否分配: 以最宽的元素类型 `i16` 计, 总字节数不超过 `isize::MAX`.
pub(crate) fn check_grid(height: usize, width: usize) -> Result<()> {
    height
        .checked_mul(width)
        .and_then(|n| n.checked_mul(std::mem::size_of::<i16>()))
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .map(|_| ())
        .ok_or(Error::InvalidDimensions { width, height })
}
