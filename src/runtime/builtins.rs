use std::collections::HashMap;
use std::sync::LazyLock;

use crate::lang::value::Value;
use crate::runtime::console::Console;
use crate::runtime::runtime_error::RuntimeError;

/// A native function. Arguments arrive in call order.
pub type Builtin = fn(&[Value], &mut Console<'_>) -> Result<Value, RuntimeError>;

pub static BUILTINS: LazyLock<HashMap<&'static str, Builtin>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, Builtin> = HashMap::new();
    table.insert("print", print);
    table.insert("tostring", tostring);
    table.insert("tonumber", tonumber);
    table.insert("read", read);
    table
});

fn first(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Nil)
}

/// Writes each argument on its own line.
fn print(args: &[Value], console: &mut Console<'_>) -> Result<Value, RuntimeError> {
    for arg in args {
        console.write_line(&arg.to_string())?;
    }
    console.flush()?;
    Ok(Value::Nil)
}

fn tostring(args: &[Value], _: &mut Console<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::String(first(args).to_string()))
}

/// `nil` when the argument has no numeric reading.
fn tonumber(args: &[Value], _: &mut Console<'_>) -> Result<Value, RuntimeError> {
    Ok(first(args).to_number().map_or(Value::Nil, Value::Number))
}

fn read(_: &[Value], console: &mut Console<'_>) -> Result<Value, RuntimeError> {
    Ok(console.read_line()?.map_or(Value::Nil, Value::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value], input: &str) -> (Value, String) {
        let mut out = Vec::new();
        let result = {
            let mut console = Console::new(input.as_bytes(), &mut out);
            BUILTINS[name](args, &mut console).unwrap()
        };
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_each_argument_on_its_own_line() {
        let (result, out) = call("print", &[Value::Number(1.0), Value::from("a")], "");
        assert_eq!(result, Value::Nil);
        assert_eq!(out, "1\na\n");
    }

    #[test]
    fn test_tostring() {
        assert_eq!(call("tostring", &[Value::Number(4.0)], "").0, Value::from("4"));
        assert_eq!(call("tostring", &[], "").0, Value::from("nil"));
    }

    #[test]
    fn test_tonumber() {
        assert_eq!(call("tonumber", &[Value::from("2.5")], "").0, Value::Number(2.5));
        assert_eq!(call("tonumber", &[Value::from("abc")], "").0, Value::Nil);
    }

    #[test]
    fn test_read() {
        assert_eq!(call("read", &[], "line one\nrest").0, Value::from("line one"));
        assert_eq!(call("read", &[], "").0, Value::Nil);
    }
}
