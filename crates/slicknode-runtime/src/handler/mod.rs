//! Lua handler modules.
//!
//! A handler module is a Lua 5.4 file that evaluates to its export. The
//! export is either a function or a table whose `default` field is a
//! function. The function is called with `(payload, context)` and returns a
//! result, or a coroutine which is resumed until it finishes. An error raised
//! by the function, or while resuming its coroutine, is a handler failure.
//!
//! Both loading strategies go through the functions in this module, so the
//! export and failure rules are identical whether a handler runs in-process
//! or in a worker.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mlua::{Function, Lua, LuaSerdeExt, MultiValue, SerializeOptions, Value};

use crate::error::{HandlerError, LoadError};

/// Calls the handler under `pcall` and drives a returned coroutine to
/// completion, passing each yielded value back into the next resume.
/// Returns `true, result` or `false, error_value`.
const INVOKE_CHUNK: &str = r"
local handler, payload, context = ...
local ok, result = pcall(handler, payload, context)
if not ok then
    return false, result
end
if type(result) ~= 'thread' then
    return true, result
end
local value = nil
while coroutine.status(result) ~= 'dead' do
    local resumed, yielded = coroutine.resume(result, value)
    if not resumed then
        return false, yielded
    end
    value = yielded
end
return true, value
";

/// Registry key under which the compiled invoke helper is kept.
const INVOKE_KEY: &str = "slicknode_runtime.invoke";

/// Returns the file a module path refers to.
///
/// Candidates are tried in order: the path itself, the path with `.lua`
/// appended, and `init.lua` inside the path.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] when no candidate is a file.
pub fn resolve_module_path(module_path: &Path) -> Result<PathBuf, LoadError> {
    let mut with_extension = module_path.as_os_str().to_owned();
    with_extension.push(".lua");
    [
        module_path.to_path_buf(),
        PathBuf::from(with_extension),
        module_path.join("init.lua"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
    .ok_or_else(|| LoadError::NotFound {
        path: module_path.to_path_buf(),
    })
}

/// Resolves, reads, compiles and evaluates a module, returning its export.
///
/// # Errors
///
/// Returns a [`LoadError`] if the module cannot be found or read, fails to
/// compile, or raises an error while being evaluated.
pub fn load_export(lua: &Lua, module_path: &Path) -> Result<Value, LoadError> {
    let file = resolve_module_path(module_path)?;
    load_file(lua, &file)
}

/// Evaluates an already resolved module file and returns its export.
///
/// # Errors
///
/// Returns a [`LoadError`] if the file cannot be read, fails to compile, or
/// raises an error while being evaluated.
pub fn load_file(lua: &Lua, file: &Path) -> Result<Value, LoadError> {
    let source = fs::read(file).map_err(|err| LoadError::Read {
        path: file.to_path_buf(),
        source: Arc::new(err),
    })?;
    let chunk = lua
        .load(source.as_slice())
        .set_name(format!("@{}", file.display()))
        .into_function()
        .map_err(|err| LoadError::Compile {
            message: describe(&err),
        })?;
    chunk.call::<Value>(()).map_err(|err| LoadError::Evaluate {
        message: describe(&err),
    })
}

/// Normalises a module export into the handler function.
///
/// A table export is replaced by its `default` field; the result must be a
/// function.
///
/// # Errors
///
/// Returns [`LoadError::NotInvocable`] naming the Lua type of the unwrapped
/// value when it is not a function.
pub fn unwrap_invocable(export: Value) -> Result<Function, LoadError> {
    let candidate = match export {
        Value::Table(table) => table
            .get::<Value>("default")
            .map_err(|err| LoadError::Evaluate {
                message: describe(&err),
            })?,
        other => other,
    };
    match candidate {
        Value::Function(function) => Ok(function),
        other => Err(LoadError::NotInvocable {
            type_name: lua_type_name(&other),
        }),
    }
}

/// Calls a handler with JSON arguments and returns its JSON result.
///
/// JSON `null` arrives in Lua as `nil`.
///
/// # Errors
///
/// Returns a [`HandlerError`] carrying the handler's failure message, or
/// describing why the arguments or the result could not be converted.
pub fn invoke(
    lua: &Lua,
    handler: &Function,
    payload: &serde_json::Value,
    context: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let to_lua = |value: &serde_json::Value| {
        lua.to_value_with(value, argument_options()).map_err(|err| {
            HandlerError::new(format!(
                "failed to pass arguments to handler: {}",
                describe(&err)
            ))
        })
    };
    let lua_payload = to_lua(payload)?;
    let lua_context = to_lua(context)?;

    let (succeeded, value) = invoke_helper(lua)
        .and_then(|helper| helper.call::<(bool, Value)>((handler.clone(), lua_payload, lua_context)))
        .map_err(|err| HandlerError::new(describe(&err)))?;

    if !succeeded {
        return Err(HandlerError::new(failure_message(&value)));
    }
    lua.from_value::<serde_json::Value>(value).map_err(|err| {
        HandlerError::new(format!(
            "handler result cannot be represented as JSON: {}",
            describe(&err)
        ))
    })
}

/// Extracts the message from a value raised by a handler.
///
/// Strings are used without the `<chunk>:<line>: ` position Lua prepends to
/// `error(message)`, and tables contribute their `message` field.
#[must_use]
pub fn failure_message(value: &Value) -> String {
    match value {
        Value::String(message) => strip_location(&message.to_string_lossy()).to_owned(),
        Value::Table(table) => match table.raw_get::<Value>("message") {
            Ok(Value::String(message)) => String::from(message.to_string_lossy()),
            _ => String::from("handler raised a table without a message"),
        },
        other => format!("handler raised a {} value", lua_type_name(other)),
    }
}

/// Renders an `mlua` error without wrapper noise or stack traceback.
#[must_use]
pub fn describe(error: &mlua::Error) -> String {
    match error {
        mlua::Error::SyntaxError { message, .. } | mlua::Error::RuntimeError(message) => message
            .split("\nstack traceback:")
            .next()
            .unwrap_or_default()
            .to_owned(),
        mlua::Error::CallbackError { cause, .. } => describe(cause),
        other => other.to_string(),
    }
}

/// Returns the name Lua's `type()` reports for a value.
///
/// `mlua` distinguishes integers from floats; Lua calls both `number`.
#[must_use]
pub fn lua_type_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) | Value::Number(_) => "number",
        other => other.type_name(),
    }
}

/// Sends `print` and the default `io` output of `lua` to stderr.
///
/// A worker's stdout carries only the protocol response, so handler output
/// must not reach it.
///
/// # Errors
///
/// Returns an `mlua` error if the globals cannot be replaced.
pub fn route_output_to_stderr(lua: &Lua) -> mlua::Result<()> {
    let print = lua.create_function(|_, args: MultiValue| {
        let parts = args
            .iter()
            .map(Value::to_string)
            .collect::<mlua::Result<Vec<_>>>()?;
        drop(writeln!(io::stderr().lock(), "{}", parts.join("\t")));
        Ok(())
    })?;
    lua.globals().set("print", print)?;
    lua.load("io.output(io.stderr)\nio.stdout = io.stderr")
        .set_name("=stdio")
        .exec()
}

/// Removes a leading `<source>:<line>: ` position from an error message.
fn strip_location(message: &str) -> &str {
    let Some((location, rest)) = message.split_once(": ") else {
        return message;
    };
    match location.rsplit_once(':') {
        Some((source, line))
            if !source.is_empty()
                && !line.is_empty()
                && line.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            rest
        }
        _ => message,
    }
}

fn argument_options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

fn invoke_helper(lua: &Lua) -> mlua::Result<Function> {
    if let Some(helper) = lua.named_registry_value::<Option<Function>>(INVOKE_KEY)? {
        return Ok(helper);
    }
    let helper = lua.load(INVOKE_CHUNK).set_name("=invoke").into_function()?;
    lua.set_named_registry_value(INVOKE_KEY, helper.clone())?;
    Ok(helper)
}
