//! The two owner-guarded Lua scripts from spec.md §4.A. Scripts are the
//! sole means of owner-guarded mutation; a script that fails to execute
//! is surfaced as a [`crate::StoreError`], never silently recovered.

pub const REFRESH_IF_OWNER: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
  return redis.call("EXPIRE", KEYS[1], ARGV[2])
else
  return 0
end
"#;

pub const DELETE_IF_OWNER: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
  return redis.call("DEL", KEYS[1])
else
  return 0
end
"#;
