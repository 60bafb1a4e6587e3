//! 遍历结果.

use crate::profile::Profile;
use std::io::{self, Write};

const SEP: &str = "--------------------------------------------------------";

/// 将 `p` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.3}"),
            None => "/".to_string(),
        }
    }

    let (inner, outer) = p.contour_pixels();
    writeln!(w, "Walk `{name}`:")?;
    writeln!(w, "{S4}Batches: {}", p.batches())?;
    writeln!(w, "{S4}Records: {} ({} with image)", p.records(), p.with_image())?;
    writeln!(w, "{S4}Inner contour pixels: {inner}")?;
    writeln!(w, "{S4}Outer contour pixels: {outer}")?;
    writeln!(w, "{S4}Total waiting time: {} us", p.wait_time_us())?;
    writeln!(
        w,
        "{S4}Average waiting time: {} us per batch",
        f64_to_display(p.avg_wait_time_us())
    )?;
    let t = p.longest_wait().map(|d| d.as_micros() as f64);
    writeln!(w, "{S4}Longest wait: {} us", f64_to_display(t))?;
    write!(w, "{S4}Total machine time: {} us", p.real_time_us())?;
    Ok(())
}

/// 一次遍历的最终结果.
pub struct WalkResult {
    name: String,
    profile: Profile,
}

impl WalkResult {
    #[inline]
    pub fn new(name: String, profile: Profile) -> Self {
        Self { name, profile }
    }

    /// 输出运行结果.
    pub fn report(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut w = stdout.lock();
        writeln!(w, "{SEP}")?;
        describe_into(&self.name, &self.profile, &mut w)?;
        writeln!(w)?;
        writeln!(w, "{SEP}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_empty() {
        let p = Profile::new().finish();
        let mut buf = vec![];
        describe_into("empty", &p, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Walk `empty`:"));
        assert!(text.contains("Batches: 0"));
        assert!(text.contains("Average waiting time: / us per batch"));
        assert!(text.contains("Longest wait: / us"));
    }
}
