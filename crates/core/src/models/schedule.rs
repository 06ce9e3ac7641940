//! 五字段定时调度表达式
//!
//! 字段依次为: 分钟(0-59) 小时(0-23) 日(1-31) 月(1-12) 星期(0-6, 0=周日)。
//! 每个字段只接受 `*` 或单个整数；范围、列表、步进等扩展语法不被支持，
//! 含有这类语法的字段在匹配时一律判为不命中。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoordinatorError;
use crate::limits::MAX_FIELD_LEN;

/// 表达式字段数
const FIELD_COUNT: usize = 5;

/// 各字段的取值范围（含两端）
const FIELD_RANGES: [(u32, u32); FIELD_COUNT] = [(0, 59), (0, 23), (1, 31), (1, 12), (0, 6)];

/// 各字段名称，用于错误信息
const FIELD_NAMES: [&str; FIELD_COUNT] = ["minute", "hour", "day", "month", "weekday"];

/// 定时调度表达式
///
/// 内部保存规范化（单空格分隔）后的原始文本。通过 [`CronSchedule::parse`]
/// 构造的表达式保证合法；通过 [`CronSchedule::lenient`] 或反序列化得到的
/// 表达式可能是任意文本，匹配时对非法文本恒返回不命中。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    raw: String,
}

impl CronSchedule {
    /// 严格解析表达式，任务创建路径使用
    ///
    /// 要求恰好五个空白分隔的字段，每个字段是 `*` 或取值范围内的整数。
    pub fn parse(input: &str) -> Result<Self, CoordinatorError> {
        let fields: Vec<&str> = input.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(CoordinatorError::InvalidSchedule {
                expr: input.trim().to_string(),
                reason: format!("expected {} fields, got {}", FIELD_COUNT, fields.len()),
            });
        }

        for (index, field) in fields.iter().enumerate() {
            if let Err(reason) = validate_field(field, index) {
                return Err(CoordinatorError::InvalidSchedule {
                    expr: fields.join(" "),
                    reason,
                });
            }
        }

        Ok(Self {
            raw: fields.join(" "),
        })
    }

    /// 宽松构造，从持久化文件加载时使用
    ///
    /// 只做空白规范化，不做合法性检查。
    pub fn lenient(input: &str) -> Self {
        Self {
            raw: input.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    /// 判断表达式在给定时间点是否命中
    ///
    /// 纯函数，无任何副作用。五个字段全部匹配才算命中；
    /// 字段数不是五个、或字段既不是 `*` 也不是合法整数时恒为 false。
    pub fn matches<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let fields: Vec<&str> = self.raw.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return false;
        }

        field_matches(fields[0], at.minute())
            && field_matches(fields[1], at.hour())
            && field_matches(fields[2], at.day())
            && field_matches(fields[3], at.month())
            && field_matches(fields[4], at.weekday().num_days_from_sunday())
    }

    /// 规范化后的表达式文本
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// 单字段匹配: `*` 通配，否则要求字段是与当前时间分量相等的整数
fn field_matches(field: &str, value: u32) -> bool {
    field == "*" || parse_field(field) == Some(value)
}

/// 解析纯数字字段，空串、带符号、含非数字字符、溢出都返回None
fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn validate_field(field: &str, index: usize) -> Result<(), String> {
    let name = FIELD_NAMES[index];
    if field.len() > MAX_FIELD_LEN {
        return Err(format!("{} field too long", name));
    }
    if field == "*" {
        return Ok(());
    }

    let value = match parse_field(field) {
        Some(value) => value,
        None => return Err(format!("{} field must be '*' or an integer", name)),
    };

    let (lo, hi) = FIELD_RANGES[index];
    if !(lo..=hi).contains(&value) {
        return Err(format!("{} value {} out of range {}-{}", name, value, lo, hi));
    }
    Ok(())
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for CronSchedule {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CronSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CronSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::lenient(&raw))
    }
}
