//! 정책 규칙.
//!
//! 규칙은 `(ptype, v0..v5)` 튜플입니다. 의미 있는 ptype은 두 가지입니다:
//!
//! - `p`: 권한 규칙 `(주체 또는 역할, 객체, 동작)`
//! - `g`: 그룹 규칙 `(사용자, 역할)`
//!
//! 텍스트 형식은 `ptype, v0, v1, ...`이며 뒤쪽의 빈 필드는 생략됩니다.

use sentinel_core::errno::ERR_INVALID_PARAM;
use sentinel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 권한 규칙 타입.
pub const PTYPE_POLICY: &str = "p";

/// 그룹 규칙 타입.
pub const PTYPE_GROUPING: &str = "g";

/// 규칙 값 슬롯 최대 개수.
pub const MAX_VALUES: usize = 6;

/// 모든 값과 일치하는 토큰.
pub const WILDCARD: &str = "*";

/// 텍스트 형식의 필드 구분자.
const SEPARATOR: char = ',';

/// 정책 규칙.
///
/// 동일성은 튜플 전체로 결정됩니다. 뒤쪽 빈 값은 생성 시 제거되므로
/// `p, a, b, c`와 `p, a, b, c, , `는 같은 규칙입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    ptype: String,
    values: Vec<String>,
}

impl Rule {
    /// 규칙을 생성합니다.
    ///
    /// ptype이 비어 있거나, 값이 6개를 넘거나, 구분자(`,`) 또는 제어 문자를
    /// 포함한 필드가 있으면 `InvalidParam`을 반환합니다.
    pub fn new<I, S>(ptype: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ptype = ptype.into().trim().to_string();
        if ptype.is_empty() {
            return Err(ERR_INVALID_PARAM.with_message("rule type is required"));
        }

        let mut values: Vec<String> = values
            .into_iter()
            .map(|v| v.into().trim().to_string())
            .collect();
        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        if values.len() > MAX_VALUES {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "rule has {} values, at most {} allowed",
                values.len(),
                MAX_VALUES
            )));
        }

        let rule = Self { ptype, values };
        rule.check_text()?;
        Ok(rule)
    }

    /// 텍스트 형식으로 저장했다가 같은 규칙으로 되읽을 수 있는지 확인합니다.
    ///
    /// `p`/`g` 생성자는 검사하지 않으므로 저장 전에 이 검사를 거칩니다.
    pub fn check_text(&self) -> Result<()> {
        let bad = std::iter::once(&self.ptype)
            .chain(&self.values)
            .find(|field| field.contains(SEPARATOR) || field.chars().any(char::is_control));
        match bad {
            Some(field) => Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "rule field {:?} contains a separator or control character",
                field
            ))),
            None => Ok(()),
        }
    }

    /// 권한 규칙 `p(subject, object, action)`.
    pub fn p(subject: &str, object: &str, action: &str) -> Self {
        Self::fixed(PTYPE_POLICY, &[subject, object, action])
    }

    /// 그룹 규칙 `g(user, role)`.
    pub fn g(user: &str, role: &str) -> Self {
        Self::fixed(PTYPE_GROUPING, &[user, role])
    }

    fn fixed(ptype: &str, values: &[&str]) -> Self {
        let mut values: Vec<String> = values.iter().map(|v| v.trim().to_string()).collect();
        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        Self {
            ptype: ptype.to_string(),
            values,
        }
    }

    pub fn ptype(&self) -> &str {
        &self.ptype
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// i번째 값. 없으면 빈 문자열.
    pub fn field(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn is_policy(&self) -> bool {
        self.ptype == PTYPE_POLICY
    }

    pub fn is_grouping(&self) -> bool {
        self.ptype == PTYPE_GROUPING
    }

    /// 필터 일치 여부.
    ///
    /// ptype이 같고 `field_index`부터의 값이 필터 값과 성분별로 같으면
    /// 일치합니다. 빈 필터 값은 아무 값과도 일치합니다.
    pub fn matches_filter(&self, ptype: &str, field_index: usize, field_values: &[&str]) -> bool {
        if self.ptype != ptype {
            return false;
        }
        field_values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .all(|(i, v)| self.field(field_index + i) == *v)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ptype)?;
        for value in &self.values {
            write!(f, ", {}", value)?;
        }
        Ok(())
    }
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(SEPARATOR);
        let ptype = parts.next().unwrap_or("");
        Rule::new(ptype, parts)
    }
}

/// 규칙 텍스트를 줄 단위로 파싱합니다.
///
/// 빈 줄과 `#`으로 시작하는 줄은 건너뜁니다.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Rule::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let rule: Rule = " p ,  editor, posts ,read ".parse().unwrap();
        assert_eq!(rule, Rule::p("editor", "posts", "read"));
        assert_eq!(rule.to_string(), "p, editor, posts, read");
        assert!(rule.is_policy());
        assert_eq!(rule.field(2), "read");
        assert_eq!(rule.field(5), "");
    }

    #[test]
    fn test_trailing_empty_fields_are_dropped() {
        let rule: Rule = "g, alice, admin, , ,".parse().unwrap();
        assert_eq!(rule, Rule::g("alice", "admin"));
        assert_eq!(rule.values().len(), 2);
    }

    #[test]
    fn test_inner_empty_field_is_kept() {
        let rule: Rule = "p, alice, , read".parse().unwrap();
        assert_eq!(rule.values(), ["alice", "", "read"]);
        assert_eq!(rule.to_string(), "p, alice, , read");
    }

    #[test]
    fn test_invalid_rules() {
        assert!("".parse::<Rule>().is_err());
        assert!(", a, b".parse::<Rule>().is_err());
        let err = "p, 1, 2, 3, 4, 5, 6, 7".parse::<Rule>().unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
        assert!("p, 1, 2, 3, 4, 5, 6".parse::<Rule>().is_ok());
    }

    #[test]
    fn test_separator_in_field_rejected() {
        let err = Rule::new("p", ["alice,admin", "posts", "read"]).unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
        assert!(Rule::new("p", ["alice\nadmin", "posts", "read"]).is_err());
        assert!(Rule::new("p,g", ["alice", "admin"]).is_err());

        let unchecked = Rule::g("alice,admin", "editor");
        assert!(unchecked.check_text().is_err());
        assert!(Rule::g("alice", "admin").check_text().is_ok());
    }

    #[test]
    fn test_text_form_reads_back_identical() {
        let rules = [
            Rule::new("p", ["alice", "", "read"]).unwrap(),
            Rule::new("p", ["admin", "*", "*", "tenant-1"]).unwrap(),
            Rule::new("g", ["user:42", "role/editor"]).unwrap(),
        ];
        for rule in rules {
            assert_eq!(rule.to_string().parse::<Rule>().unwrap(), rule);
        }
    }

    #[test]
    fn test_matches_filter() {
        let rule = Rule::p("editor", "posts", "read");
        assert!(rule.matches_filter("p", 0, &["editor"]));
        assert!(rule.matches_filter("p", 1, &["posts", "read"]));
        assert!(rule.matches_filter("p", 0, &["", "posts"]));
        assert!(!rule.matches_filter("g", 0, &["editor"]));
        assert!(!rule.matches_filter("p", 1, &["posts", "update"]));
        assert!(!rule.matches_filter("p", 3, &["x"]));
    }

    #[test]
    fn test_parse_rules_skips_comments() {
        let text = "# roles\ng, alice, admin\n\np, admin, *, *\n";
        let rules = parse_rules(text).unwrap();
        assert_eq!(rules, vec![Rule::g("alice", "admin"), Rule::p("admin", "*", "*")]);
    }
}
