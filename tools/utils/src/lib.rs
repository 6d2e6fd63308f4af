//! 命令行工具依赖的通用组件.

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 解析逗号分隔的动物编号列表, 支持 `a-b` 形式的闭区间, 如 `6465,6470-6472`.
///
/// 格式不合法时返回 `None`.
pub fn parse_ids(s: &str) -> Option<Vec<u32>> {
    let mut ans = vec![];
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.trim().parse().ok()?;
                let hi: u32 = hi.trim().parse().ok()?;
                if lo > hi {
                    return None;
                }
                ans.extend(lo..=hi);
            }
            None => ans.push(part.parse().ok()?),
        }
    }
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::{parse_ids, sep_to};

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids("6465"), Some(vec![6465]));
        assert_eq!(parse_ids("1, 3-5,9"), Some(vec![1, 3, 4, 5, 9]));
        assert_eq!(parse_ids(""), Some(vec![]));
        assert_eq!(parse_ids("5-3"), None);
        assert_eq!(parse_ids("a"), None);
    }

    #[test]
    fn test_sep_to() {
        let mut buf = vec![];
        sep_to(&mut buf).unwrap();
        assert!(buf.ends_with(b"-\n"));
    }
}
