//! Command parsing from host arguments.
//!
//! The host calls in with a function name and a list of string
//! arguments. [`Command::from_args`] validates them and produces a typed
//! [`Command`], so the code executing it never sees a malformed request.
//!
//! Numeric and boolean arguments may arrive wrapped in double quotes;
//! those quotes are stripped before parsing.

use std::path::PathBuf;

use crate::chunk::DeliveryTarget;
use crate::error::ProtocolError;

/// Where LINSERT places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSide {
    Before,
    After,
}

/// A parsed host command, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// SET <key> <value>.
    Set { key: String, value: String },

    /// GET <key>. Returns the value or NotFound.
    Get { key: String },

    /// DEL <key> [key ...]. Removes keys from every keyspace.
    Del { keys: Vec<String> },

    /// EXISTS <key> [key ...]. Counts key presence across keyspaces.
    Exists { keys: Vec<String> },

    /// INCRBY <key> <delta>.
    IncrBy { key: String, delta: i64 },

    /// INCRBYFLOAT <key> <delta>.
    IncrByFloat { key: String, delta: f64 },

    /// HSET <key> <field> <value>.
    HSet {
        key: String,
        field: String,
        value: String,
    },

    /// HMSET <key> <field> <value> [field value ...].
    HMSet {
        key: String,
        pairs: Vec<(String, String)>,
    },

    /// HGET <key> <field> [function entity push].
    HGet {
        key: String,
        field: String,
        delivery: Option<DeliveryTarget>,
    },

    /// HGETALL <key> [function entity push]. Field/value pairs, flattened.
    HGetAll {
        key: String,
        delivery: Option<DeliveryTarget>,
    },

    /// HDEL <key> <field> [field ...].
    HDel { key: String, fields: Vec<String> },

    /// HLEN <key>.
    HLen { key: String },

    /// HKEYS <key> [function entity push].
    HKeys {
        key: String,
        delivery: Option<DeliveryTarget>,
    },

    /// HVALS <key> [function entity push].
    HVals {
        key: String,
        delivery: Option<DeliveryTarget>,
    },

    /// HEXISTS <key> <field>.
    HExists { key: String, field: String },

    /// HINCRBY <key> <field> <delta>.
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },

    /// HINCRBYFLOAT <key> <field> <delta>.
    HIncrByFloat {
        key: String,
        field: String,
        delta: f64,
    },

    /// LPUSH <key> <value> [value ...].
    LPush { key: String, values: Vec<String> },

    /// RPUSH <key> <value> [value ...].
    RPush { key: String, values: Vec<String> },

    /// LPOP <key> [count]. Count defaults to 1 and must be at least 1.
    LPop { key: String, count: usize },

    /// RPOP <key> [count].
    RPop { key: String, count: usize },

    /// LRANGE <key> <start> <end>.
    LRange { key: String, start: i64, end: i64 },

    /// LINDEX <key> <index> [function entity push].
    LIndex {
        key: String,
        index: i64,
        delivery: Option<DeliveryTarget>,
    },

    /// LLEN <key>.
    LLen { key: String },

    /// LINSERT <key> <BEFORE|AFTER|true|false> <pivot> <value>.
    /// A boolean position means "before" when true.
    LInsert {
        key: String,
        side: InsertSide,
        pivot: String,
        value: String,
    },

    /// LSET <key> <index> <value>.
    LSet {
        key: String,
        index: i64,
        value: String,
    },

    /// LREM <key> <count> <value>.
    LRem {
        key: String,
        count: i64,
        value: String,
    },

    /// LTRIM <key> <start> <end>.
    LTrim { key: String, start: i64, end: i64 },

    /// SAVE [backup]. Writes the primary file, plus a backup when true.
    Save { backup: bool },

    /// LOAD [path]. Loads the given file, or the primary file.
    Load { path: Option<PathBuf> },

    /// BACKUPS. Lists backup files, newest first.
    Backups,

    /// VERSION. Returns the library version.
    Version,
}

impl Command {
    /// Parses a command name (case-insensitive) and its arguments.
    pub fn from_args<S: AsRef<str>>(name: &str, args: &[S]) -> Result<Command, ProtocolError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let upper = name.trim().to_ascii_uppercase();
        let args = args.as_slice();

        match upper.as_str() {
            "SET" => parse_set(args),
            "GET" => parse_get(args),
            "DEL" => parse_keys(args, "DEL").map(|keys| Command::Del { keys }),
            "EXISTS" => parse_keys(args, "EXISTS").map(|keys| Command::Exists { keys }),
            "INCRBY" => parse_incrby(args),
            "INCRBYFLOAT" => parse_incrbyfloat(args),
            "HSET" => parse_hset(args),
            "HMSET" => parse_hmset(args),
            "HGET" => parse_hget(args),
            "HGETALL" => parse_key_with_delivery(args, "HGETALL")
                .map(|(key, delivery)| Command::HGetAll { key, delivery }),
            "HDEL" => parse_hdel(args),
            "HLEN" => parse_single_key(args, "HLEN").map(|key| Command::HLen { key }),
            "HKEYS" => parse_key_with_delivery(args, "HKEYS")
                .map(|(key, delivery)| Command::HKeys { key, delivery }),
            "HVALS" => parse_key_with_delivery(args, "HVALS")
                .map(|(key, delivery)| Command::HVals { key, delivery }),
            "HEXISTS" => parse_hexists(args),
            "HINCRBY" => parse_hincrby(args),
            "HINCRBYFLOAT" => parse_hincrbyfloat(args),
            "LPUSH" => parse_push(args, "LPUSH").map(|(key, values)| Command::LPush { key, values }),
            "RPUSH" => parse_push(args, "RPUSH").map(|(key, values)| Command::RPush { key, values }),
            "LPOP" => parse_pop(args, "LPOP").map(|(key, count)| Command::LPop { key, count }),
            "RPOP" => parse_pop(args, "RPOP").map(|(key, count)| Command::RPop { key, count }),
            "LRANGE" => parse_range(args, "LRANGE").map(|(key, start, end)| Command::LRange {
                key,
                start,
                end,
            }),
            "LINDEX" => parse_lindex(args),
            "LLEN" => parse_single_key(args, "LLEN").map(|key| Command::LLen { key }),
            "LINSERT" => parse_linsert(args),
            "LSET" => parse_lset(args),
            "LREM" => parse_lrem(args),
            "LTRIM" => parse_range(args, "LTRIM").map(|(key, start, end)| Command::LTrim {
                key,
                start,
                end,
            }),
            "SAVE" => parse_save(args),
            "LOAD" => parse_load(args),
            "BACKUPS" => no_args(args, "BACKUPS", Command::Backups),
            "VERSION" => no_args(args, "VERSION", Command::Version),
            _ => Err(ProtocolError::UnknownCommand(name.to_owned())),
        }
    }

    /// The canonical (upper-case) command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::IncrBy { .. } => "INCRBY",
            Command::IncrByFloat { .. } => "INCRBYFLOAT",
            Command::HSet { .. } => "HSET",
            Command::HMSet { .. } => "HMSET",
            Command::HGet { .. } => "HGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HDel { .. } => "HDEL",
            Command::HLen { .. } => "HLEN",
            Command::HKeys { .. } => "HKEYS",
            Command::HVals { .. } => "HVALS",
            Command::HExists { .. } => "HEXISTS",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::HIncrByFloat { .. } => "HINCRBYFLOAT",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LPop { .. } => "LPOP",
            Command::RPop { .. } => "RPOP",
            Command::LRange { .. } => "LRANGE",
            Command::LIndex { .. } => "LINDEX",
            Command::LLen { .. } => "LLEN",
            Command::LInsert { .. } => "LINSERT",
            Command::LSet { .. } => "LSET",
            Command::LRem { .. } => "LREM",
            Command::LTrim { .. } => "LTRIM",
            Command::Save { .. } => "SAVE",
            Command::Load { .. } => "LOAD",
            Command::Backups => "BACKUPS",
            Command::Version => "VERSION",
        }
    }

    /// Returns true if the command can change the store's contents.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::Del { .. }
                | Command::IncrBy { .. }
                | Command::IncrByFloat { .. }
                | Command::HSet { .. }
                | Command::HMSet { .. }
                | Command::HDel { .. }
                | Command::HIncrBy { .. }
                | Command::HIncrByFloat { .. }
                | Command::LPush { .. }
                | Command::RPush { .. }
                | Command::LPop { .. }
                | Command::RPop { .. }
                | Command::LInsert { .. }
                | Command::LSet { .. }
                | Command::LRem { .. }
                | Command::LTrim { .. }
        )
    }

    /// The delivery target for commands whose output may be chunked.
    pub fn delivery(&self) -> Option<&DeliveryTarget> {
        match self {
            Command::HGet { delivery, .. }
            | Command::HGetAll { delivery, .. }
            | Command::HKeys { delivery, .. }
            | Command::HVals { delivery, .. }
            | Command::LIndex { delivery, .. } => delivery.as_ref(),
            _ => None,
        }
    }
}

/// All the command names [`Command::from_args`] accepts.
pub const COMMAND_NAMES: &[&str] = &[
    "SET", "GET", "DEL", "EXISTS", "INCRBY", "INCRBYFLOAT", "HSET", "HMSET", "HGET", "HGETALL",
    "HDEL", "HLEN", "HKEYS", "HVALS", "HEXISTS", "HINCRBY", "HINCRBYFLOAT", "LPUSH", "RPUSH",
    "LPOP", "RPOP", "LRANGE", "LINDEX", "LLEN", "LINSERT", "LSET", "LREM", "LTRIM", "SAVE",
    "LOAD", "BACKUPS", "VERSION",
];

// ---------------------------------------------------------------------------
// argument helpers
// ---------------------------------------------------------------------------

fn unquote(arg: &str) -> &str {
    arg.trim().trim_matches('"')
}

fn key(arg: &str, cmd: &str) -> Result<String, ProtocolError> {
    if arg.is_empty() {
        return Err(ProtocolError::EmptyKey(cmd.into()));
    }
    Ok(arg.to_owned())
}

fn parse_i64(arg: &str) -> Result<i64, ProtocolError> {
    unquote(arg)
        .parse()
        .map_err(|_| ProtocolError::InvalidInteger(arg.to_owned()))
}

fn parse_f64(arg: &str) -> Result<f64, ProtocolError> {
    unquote(arg)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProtocolError::InvalidFloat(arg.to_owned()))
}

fn parse_bool(arg: &str) -> Result<bool, ProtocolError> {
    let v = unquote(arg);
    if v.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if v.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ProtocolError::InvalidBool(arg.to_owned()))
    }
}

fn parse_count(arg: &str) -> Result<usize, ProtocolError> {
    let n = parse_i64(arg)?;
    usize::try_from(n)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or(ProtocolError::InvalidCount)
}

/// Parses optional trailing `function entity push` arguments.
fn parse_delivery(extra: &[&str], cmd: &str) -> Result<Option<DeliveryTarget>, ProtocolError> {
    match extra {
        [] => Ok(None),
        [function, entity, push] => Ok(Some(DeliveryTarget {
            function: (*function).to_owned(),
            entity: (*entity).to_owned(),
            push: parse_bool(push)?,
        })),
        _ => Err(ProtocolError::WrongArity(cmd.into())),
    }
}

fn no_args(args: &[&str], cmd: &str, command: Command) -> Result<Command, ProtocolError> {
    if !args.is_empty() {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    Ok(command)
}

// ---------------------------------------------------------------------------
// per-command parsers
// ---------------------------------------------------------------------------

fn parse_single_key(args: &[&str], cmd: &str) -> Result<String, ProtocolError> {
    match args {
        [k] => key(k, cmd),
        _ => Err(ProtocolError::WrongArity(cmd.into())),
    }
}

fn parse_keys(args: &[&str], cmd: &str) -> Result<Vec<String>, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    args.iter().map(|k| key(unquote(k), cmd)).collect()
}

fn parse_key_with_delivery(
    args: &[&str],
    cmd: &str,
) -> Result<(String, Option<DeliveryTarget>), ProtocolError> {
    let [k, extra @ ..] = args else {
        return Err(ProtocolError::WrongArity(cmd.into()));
    };
    Ok((key(k, cmd)?, parse_delivery(extra, cmd)?))
}

fn parse_set(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, value] => Ok(Command::Set {
            key: key(k, "SET")?,
            value: (*value).to_owned(),
        }),
        _ => Err(ProtocolError::WrongArity("SET".into())),
    }
}

fn parse_get(args: &[&str]) -> Result<Command, ProtocolError> {
    parse_single_key(args, "GET").map(|key| Command::Get { key })
}

fn parse_incrby(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, delta] => Ok(Command::IncrBy {
            key: key(k, "INCRBY")?,
            delta: parse_i64(delta)?,
        }),
        _ => Err(ProtocolError::WrongArity("INCRBY".into())),
    }
}

fn parse_incrbyfloat(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, delta] => Ok(Command::IncrByFloat {
            key: key(k, "INCRBYFLOAT")?,
            delta: parse_f64(delta)?,
        }),
        _ => Err(ProtocolError::WrongArity("INCRBYFLOAT".into())),
    }
}

fn parse_hset(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, field, value] => Ok(Command::HSet {
            key: key(k, "HSET")?,
            field: (*field).to_owned(),
            value: (*value).to_owned(),
        }),
        _ => Err(ProtocolError::WrongArity("HSET".into())),
    }
}

fn parse_hmset(args: &[&str]) -> Result<Command, ProtocolError> {
    // key followed by at least one field/value pair
    if args.len() < 3 || args.len() % 2 == 0 {
        return Err(ProtocolError::WrongArity("HMSET".into()));
    }
    let pairs = args[1..]
        .chunks_exact(2)
        .map(|pair| (pair[0].to_owned(), pair[1].to_owned()))
        .collect();
    Ok(Command::HMSet {
        key: key(args[0], "HMSET")?,
        pairs,
    })
}

fn parse_hget(args: &[&str]) -> Result<Command, ProtocolError> {
    let [k, field, extra @ ..] = args else {
        return Err(ProtocolError::WrongArity("HGET".into()));
    };
    Ok(Command::HGet {
        key: key(k, "HGET")?,
        field: (*field).to_owned(),
        delivery: parse_delivery(extra, "HGET")?,
    })
}

fn parse_hdel(args: &[&str]) -> Result<Command, ProtocolError> {
    let [k, fields @ ..] = args else {
        return Err(ProtocolError::WrongArity("HDEL".into()));
    };
    if fields.is_empty() {
        return Err(ProtocolError::WrongArity("HDEL".into()));
    }
    Ok(Command::HDel {
        key: key(k, "HDEL")?,
        fields: fields.iter().map(|f| (*f).to_owned()).collect(),
    })
}

fn parse_hexists(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, field] => Ok(Command::HExists {
            key: key(k, "HEXISTS")?,
            field: (*field).to_owned(),
        }),
        _ => Err(ProtocolError::WrongArity("HEXISTS".into())),
    }
}

fn parse_hincrby(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, field, delta] => Ok(Command::HIncrBy {
            key: key(k, "HINCRBY")?,
            field: (*field).to_owned(),
            delta: parse_i64(delta)?,
        }),
        _ => Err(ProtocolError::WrongArity("HINCRBY".into())),
    }
}

fn parse_hincrbyfloat(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, field, delta] => Ok(Command::HIncrByFloat {
            key: key(k, "HINCRBYFLOAT")?,
            field: (*field).to_owned(),
            delta: parse_f64(delta)?,
        }),
        _ => Err(ProtocolError::WrongArity("HINCRBYFLOAT".into())),
    }
}

fn parse_push(args: &[&str], cmd: &str) -> Result<(String, Vec<String>), ProtocolError> {
    let [k, values @ ..] = args else {
        return Err(ProtocolError::WrongArity(cmd.into()));
    };
    if values.is_empty() {
        return Err(ProtocolError::WrongArity(cmd.into()));
    }
    Ok((key(k, cmd)?, values.iter().map(|v| (*v).to_owned()).collect()))
}

fn parse_pop(args: &[&str], cmd: &str) -> Result<(String, usize), ProtocolError> {
    match args {
        [k] => Ok((key(k, cmd)?, 1)),
        [k, count] => Ok((key(k, cmd)?, parse_count(count)?)),
        _ => Err(ProtocolError::WrongArity(cmd.into())),
    }
}

fn parse_range(args: &[&str], cmd: &str) -> Result<(String, i64, i64), ProtocolError> {
    match args {
        [k, start, end] => Ok((key(k, cmd)?, parse_i64(start)?, parse_i64(end)?)),
        _ => Err(ProtocolError::WrongArity(cmd.into())),
    }
}

fn parse_lindex(args: &[&str]) -> Result<Command, ProtocolError> {
    let [k, index, extra @ ..] = args else {
        return Err(ProtocolError::WrongArity("LINDEX".into()));
    };
    Ok(Command::LIndex {
        key: key(k, "LINDEX")?,
        index: parse_i64(index)?,
        delivery: parse_delivery(extra, "LINDEX")?,
    })
}

fn parse_linsert(args: &[&str]) -> Result<Command, ProtocolError> {
    let [k, side, pivot, value] = args else {
        return Err(ProtocolError::WrongArity("LINSERT".into()));
    };
    let side = match unquote(side).to_ascii_uppercase().as_str() {
        "BEFORE" => InsertSide::Before,
        "AFTER" => InsertSide::After,
        _ => {
            if parse_bool(side)? {
                InsertSide::Before
            } else {
                InsertSide::After
            }
        }
    };
    Ok(Command::LInsert {
        key: key(k, "LINSERT")?,
        side,
        pivot: (*pivot).to_owned(),
        value: (*value).to_owned(),
    })
}

fn parse_lset(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, index, value] => Ok(Command::LSet {
            key: key(k, "LSET")?,
            index: parse_i64(index)?,
            value: (*value).to_owned(),
        }),
        _ => Err(ProtocolError::WrongArity("LSET".into())),
    }
}

fn parse_lrem(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [k, count, value] => Ok(Command::LRem {
            key: key(k, "LREM")?,
            count: parse_i64(count)?,
            value: (*value).to_owned(),
        }),
        _ => Err(ProtocolError::WrongArity("LREM".into())),
    }
}

fn parse_save(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [] => Ok(Command::Save { backup: false }),
        [backup] => Ok(Command::Save {
            backup: parse_bool(backup)?,
        }),
        _ => Err(ProtocolError::WrongArity("SAVE".into())),
    }
}

fn parse_load(args: &[&str]) -> Result<Command, ProtocolError> {
    match args {
        [] => Ok(Command::Load { path: None }),
        [path] => Ok(Command::Load {
            path: Some(PathBuf::from(unquote(path))),
        }),
        _ => Err(ProtocolError::WrongArity("LOAD".into())),
    }
}
