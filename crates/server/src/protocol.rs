//! 协议解析
//!
//! 按行的文本协议，一行一个请求。动词大小写敏感，参数以空白分隔；
//! ADD的命令部分是第五个调度字段之后的整行剩余内容，内部空白原样保留。

use telecron_core::limits::{MAX_COMMAND_LEN, MAX_USERNAME_LEN};
use telecron_core::models::CronSchedule;
use telecron_core::{CoordinatorError, CoordinatorResult};

/// 一条解析完成的协议请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register { username: String, port: u16 },
    Add {
        username: String,
        schedule: CronSchedule,
        command: String,
    },
    List { username: String },
    Remove { id: u64 },
    Clear,
    Status,
    Ping,
    Save,
    Load,
}

impl Request {
    /// 解析一行请求
    ///
    /// 解析失败返回Protocol或InvalidSchedule错误，错误文案就是
    /// 发回客户端的ERR正文；任何失败都不触碰状态。
    pub fn parse(line: &str) -> CoordinatorResult<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(CoordinatorError::Protocol("Empty command".to_string()));
        }

        let (verb, rest) = split_token(trimmed);
        match verb {
            "REGISTER" => parse_register(rest),
            "ADD" => parse_add(rest),
            "LIST" => parse_list(rest),
            "REMOVE" => parse_remove(rest),
            "CLEAR" => Ok(Request::Clear),
            "STATUS" => Ok(Request::Status),
            "PING" => Ok(Request::Ping),
            "SAVE" => Ok(Request::Save),
            "LOAD" => Ok(Request::Load),
            _ => Err(CoordinatorError::Protocol("Unknown command".to_string())),
        }
    }
}

/// 取出第一个空白分隔的token，剩余部分去掉头部空白后一并返回
fn split_token(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

fn validate_username(username: &str) -> CoordinatorResult<()> {
    if username.len() > MAX_USERNAME_LEN {
        return Err(CoordinatorError::Protocol(format!(
            "Username longer than {} bytes",
            MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

fn parse_register(rest: &str) -> CoordinatorResult<Request> {
    let (username, rest) = split_token(rest);
    let (port_text, extra) = split_token(rest);
    if username.is_empty() || port_text.is_empty() || !extra.is_empty() {
        return Err(CoordinatorError::Protocol(
            "Usage: REGISTER <user> <port>".to_string(),
        ));
    }
    validate_username(username)?;

    let port: u16 = port_text
        .parse()
        .map_err(|_| CoordinatorError::Protocol("Invalid port".to_string()))?;
    if port == 0 {
        return Err(CoordinatorError::Protocol("Invalid port".to_string()));
    }

    Ok(Request::Register {
        username: username.to_string(),
        port,
    })
}

fn parse_add(rest: &str) -> CoordinatorResult<Request> {
    let (username, rest) = split_token(rest);
    if username.is_empty() {
        return Err(add_usage());
    }
    validate_username(username)?;

    // 依次取五个调度字段，取完后的剩余即命令文本
    let mut fields = [""; 5];
    let mut rest = rest;
    for slot in fields.iter_mut() {
        let (field, remaining) = split_token(rest);
        if field.is_empty() {
            return Err(add_usage());
        }
        *slot = field;
        rest = remaining;
    }

    let command = rest;
    if command.is_empty() {
        return Err(add_usage());
    }
    if command.len() > MAX_COMMAND_LEN {
        return Err(CoordinatorError::Protocol(format!(
            "Command longer than {} bytes",
            MAX_COMMAND_LEN
        )));
    }

    let schedule = CronSchedule::parse(&fields.join(" "))?;

    Ok(Request::Add {
        username: username.to_string(),
        schedule,
        command: command.to_string(),
    })
}

fn add_usage() -> CoordinatorError {
    CoordinatorError::Protocol(
        "Usage: ADD <user> <min> <hour> <day> <month> <weekday> <command>".to_string(),
    )
}

fn parse_list(rest: &str) -> CoordinatorResult<Request> {
    let (username, extra) = split_token(rest);
    if username.is_empty() || !extra.is_empty() {
        return Err(CoordinatorError::Protocol("Usage: LIST <user>".to_string()));
    }
    validate_username(username)?;

    Ok(Request::List {
        username: username.to_string(),
    })
}

fn parse_remove(rest: &str) -> CoordinatorResult<Request> {
    let (id_text, extra) = split_token(rest);
    if id_text.is_empty() {
        return Err(CoordinatorError::Protocol("No Task ID provided".to_string()));
    }
    if !extra.is_empty() {
        return Err(CoordinatorError::Protocol("Usage: REMOVE <id>".to_string()));
    }

    let id: u64 = id_text
        .parse()
        .map_err(|_| CoordinatorError::Protocol("Invalid Task ID".to_string()))?;

    Ok(Request::Remove { id })
}
