//! Static command metadata for autocomplete and inline help.
//!
//! Validation happens in `ramdb_protocol::Command::from_args`; this
//! table only drives tab-completion and the `help` display.

use std::collections::BTreeMap;

/// Metadata for a single ramdb command.
pub struct CommandInfo {
    /// Uppercase command name (e.g. "SET").
    pub name: &'static str,
    /// Argument synopsis (e.g. "key field value").
    pub args: &'static str,
    /// Functional group for help display.
    pub group: &'static str,
    /// One-line summary.
    pub summary: &'static str,
}

/// All known commands, sorted alphabetically within each group.
pub static COMMANDS: &[CommandInfo] = &[
    // --- generic ---
    CommandInfo {
        name: "DEL",
        args: "key [key ...]",
        group: "generic",
        summary: "delete keys from every keyspace",
    },
    CommandInfo {
        name: "EXISTS",
        args: "key [key ...]",
        group: "generic",
        summary: "count key occurrences across keyspaces",
    },
    // --- string ---
    CommandInfo {
        name: "GET",
        args: "key",
        group: "string",
        summary: "get the value of a key",
    },
    CommandInfo {
        name: "INCRBY",
        args: "key delta",
        group: "string",
        summary: "add an integer to a key's value",
    },
    CommandInfo {
        name: "INCRBYFLOAT",
        args: "key delta",
        group: "string",
        summary: "add a float to a key's value",
    },
    CommandInfo {
        name: "SET",
        args: "key value",
        group: "string",
        summary: "set the value of a key",
    },
    // --- hash ---
    CommandInfo {
        name: "HDEL",
        args: "key field [field ...]",
        group: "hash",
        summary: "delete hash fields",
    },
    CommandInfo {
        name: "HEXISTS",
        args: "key field",
        group: "hash",
        summary: "check whether a hash field exists",
    },
    CommandInfo {
        name: "HGET",
        args: "key field [function entity push]",
        group: "hash",
        summary: "get the value of a hash field",
    },
    CommandInfo {
        name: "HGETALL",
        args: "key [function entity push]",
        group: "hash",
        summary: "get all fields and values of a hash",
    },
    CommandInfo {
        name: "HINCRBY",
        args: "key field delta",
        group: "hash",
        summary: "add an integer to a hash field",
    },
    CommandInfo {
        name: "HINCRBYFLOAT",
        args: "key field delta",
        group: "hash",
        summary: "add a float to a hash field",
    },
    CommandInfo {
        name: "HKEYS",
        args: "key [function entity push]",
        group: "hash",
        summary: "get all field names of a hash",
    },
    CommandInfo {
        name: "HLEN",
        args: "key",
        group: "hash",
        summary: "get the number of fields in a hash",
    },
    CommandInfo {
        name: "HMSET",
        args: "key field value [field value ...]",
        group: "hash",
        summary: "set several hash fields",
    },
    CommandInfo {
        name: "HSET",
        args: "key field value",
        group: "hash",
        summary: "set a hash field",
    },
    CommandInfo {
        name: "HVALS",
        args: "key [function entity push]",
        group: "hash",
        summary: "get all values of a hash",
    },
    // --- list ---
    CommandInfo {
        name: "LINDEX",
        args: "key index [function entity push]",
        group: "list",
        summary: "get an element by index",
    },
    CommandInfo {
        name: "LINSERT",
        args: "key BEFORE|AFTER pivot value",
        group: "list",
        summary: "insert an element next to a pivot",
    },
    CommandInfo {
        name: "LLEN",
        args: "key",
        group: "list",
        summary: "get the length of a list",
    },
    CommandInfo {
        name: "LPOP",
        args: "key [count]",
        group: "list",
        summary: "remove and return elements from the head",
    },
    CommandInfo {
        name: "LPUSH",
        args: "key value [value ...]",
        group: "list",
        summary: "push values onto the head",
    },
    CommandInfo {
        name: "LRANGE",
        args: "key start end",
        group: "list",
        summary: "get a range of elements",
    },
    CommandInfo {
        name: "LREM",
        args: "key count value",
        group: "list",
        summary: "remove elements equal to a value",
    },
    CommandInfo {
        name: "LSET",
        args: "key index value",
        group: "list",
        summary: "set an element by index",
    },
    CommandInfo {
        name: "LTRIM",
        args: "key start end",
        group: "list",
        summary: "trim a list to a range",
    },
    CommandInfo {
        name: "RPOP",
        args: "key [count]",
        group: "list",
        summary: "remove and return elements from the tail",
    },
    CommandInfo {
        name: "RPUSH",
        args: "key value [value ...]",
        group: "list",
        summary: "append values to the tail",
    },
    // --- persistence ---
    CommandInfo {
        name: "BACKUPS",
        args: "",
        group: "persistence",
        summary: "list backup files, newest first",
    },
    CommandInfo {
        name: "LOAD",
        args: "[path]",
        group: "persistence",
        summary: "replace the store with a snapshot file",
    },
    CommandInfo {
        name: "SAVE",
        args: "[backup]",
        group: "persistence",
        summary: "write the store to disk, optionally with a backup",
    },
    // --- server ---
    CommandInfo {
        name: "VERSION",
        args: "",
        group: "server",
        summary: "show the ramdb version",
    },
];

/// Looks up a command by name (case-insensitive).
pub fn find_command(name: &str) -> Option<&'static CommandInfo> {
    let upper = name.to_uppercase();
    COMMANDS.iter().find(|c| c.name == upper)
}

/// Returns all known command names for autocomplete.
pub fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|c| c.name).collect()
}

/// Groups commands by their functional group for help display.
pub fn commands_by_group() -> BTreeMap<&'static str, Vec<&'static CommandInfo>> {
    let mut groups = BTreeMap::new();
    for cmd in COMMANDS {
        groups.entry(cmd.group).or_insert_with(Vec::new).push(cmd);
    }
    groups
}
