use quill::bytecode::{CodeObject, Op};
use quill::codegen_error::CodegenError;
use quill::ir::{Instruction, LinearIr};
use quill::runtime::RuntimeError;
use quill::{Console, Error, Value, VmConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run_with(source: &str, input: &str, config: VmConfig) -> (quill::Result<Option<Value>>, String) {
    init_tracing();
    let mut out = Vec::new();
    let result = {
        let console = Console::new(input.as_bytes(), &mut out);
        quill::run_source(source, config, console)
    };
    (result, String::from_utf8(out).unwrap())
}

/// Runs a program and returns what it printed.
fn run(source: &str) -> String {
    let (result, out) = run_with(source, "", VmConfig::default());
    if let Err(e) = result {
        panic!("program failed: {}\noutput so far: {}", e, out);
    }
    out
}

fn run_binary(bytes: &[u8]) -> String {
    let mut out = Vec::new();
    {
        let console = Console::new(std::io::empty(), &mut out);
        quill::run_binary(bytes, VmConfig::default(), console).unwrap();
    }
    String::from_utf8(out).unwrap()
}

const FIB: &str = "
    function fib(n)
        if n < 2 then
            return n
        end
        return fib(n - 1) + fib(n - 2)
    end
    print(fib(10))
";

#[test]
fn test_print_sum() {
    assert_eq!(run("print(1 + 2)"), "3\n");
}

#[test]
fn test_while_loop() {
    assert_eq!(run("i = 0 while i < 3 do print(i) i = i + 1 end"), "0\n1\n2\n");
}

#[test]
fn test_function_call() {
    assert_eq!(
        run("function add(a, b) return a + b end print(add(2, 3))"),
        "5\n"
    );
}

#[test]
fn test_break_leaves_loop() {
    assert_eq!(
        run("i = 0 while i < 5 do if i == 2 then break end print(i) i = i + 1 end"),
        "0\n1\n"
    );
}

#[test]
fn test_recursion() {
    assert_eq!(run(FIB), "55\n");
}

#[test]
fn test_recursion_past_frame_limit_overflows() {
    let config = VmConfig { max_frames: 50 };
    let (result, _) = run_with("function f(n) f(n + 1) end f(0)", "", config);
    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::StackOverflow { limit: 50 }))
    ));
}

#[test]
fn test_default_frame_limit() {
    let (result, _) = run_with("function f() f() end f()", "", VmConfig::default());
    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::StackOverflow { limit: 1000 }))
    ));
}

#[test]
fn test_empty_branches_and_bodies() {
    assert_eq!(
        run("if true then else end if false then end while false do end print(\"ok\")"),
        "ok\n"
    );
}

#[test]
fn test_else_branch() {
    assert_eq!(
        run("x = 3 if x > 5 then print(\"big\") else print(\"small\") end"),
        "small\n"
    );
}

#[test]
fn test_logical_operators() {
    assert_eq!(run("if 1 < 2 and not false then print(\"yes\") end"), "yes\n");
    assert_eq!(run("x = nil or 7 print(x)"), "7\n");
}

#[test]
fn test_missing_arguments_are_nil() {
    assert_eq!(run("function f(a, b) print(b) end f(1)"), "nil\n");
}

#[test]
fn test_string_builtins() {
    assert_eq!(
        run("x = tonumber(\"4\") + 1 print(tostring(x) + \"!\")"),
        "5!\n"
    );
}

#[test]
fn test_read_builtin() {
    let (result, out) = run_with(
        "name = read() print(\"hello \" + name)",
        "bob\n",
        VmConfig::default(),
    );
    result.unwrap();
    assert_eq!(out, "hello bob\n");
}

#[test]
fn test_print_multiple_arguments() {
    assert_eq!(run("print(1, \"two\", true, nil)"), "1\ntwo\ntrue\nnil\n");
}

#[test]
fn test_top_level_return_value() {
    let (result, _) = run_with("x = 20 return x + 1", "", VmConfig::default());
    assert_eq!(result.unwrap(), Some(Value::Number(21.0)));

    let (result, _) = run_with("x = 1", "", VmConfig::default());
    assert_eq!(result.unwrap(), None);
}

#[test]
fn test_forward_reference_faults_as_unknown_builtin() {
    let (result, _) = run_with("g() function g() end", "", VmConfig::default());
    match result {
        Err(Error::Runtime(RuntimeError::UnknownBuiltin(name))) => assert_eq!(name, "g"),
        other => panic!("expected an unknown builtin fault, got {:?}", other),
    }
}

#[test]
fn test_too_many_arguments_rejected() {
    let err = quill::compile("function f(a) end f(1, 2)").unwrap_err();
    assert!(matches!(
        err,
        Error::Codegen(CodegenError::TooManyArguments { .. })
    ));
}

#[test]
fn test_errors_tagged_by_phase() {
    assert!(matches!(quill::compile("x = $"), Err(Error::Lexer(_))));
    assert!(matches!(quill::compile("x = "), Err(Error::Parser(_))));
    assert!(matches!(quill::compile("break"), Err(Error::Codegen(_))));
    assert!(matches!(
        quill::run_binary(&[99], VmConfig::default(), Console::new(std::io::empty(), std::io::sink())),
        Err(Error::Decode(_))
    ));
}

#[test]
fn test_keyword_prefixed_identifier_is_split() {
    // `ending` lexes as `end` `ing`
    let err = quill::parse("ending = 1").unwrap_err();
    assert!(matches!(err, Error::Parser(_)));
}

#[test]
fn test_comments_ignored() {
    assert_eq!(run("-- leading comment\nprint(4) -- trailing\n"), "4\n");
}

#[test]
fn test_compile_is_deterministic() {
    let first = quill::compile(FIB).unwrap();
    let second = quill::compile(FIB).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_binary_runs_like_source() {
    let sources = [
        FIB,
        "i = 0 while i < 5 do if i == 2 then break end print(i) i = i + 1 end",
        "print(\"a b\" + \"c\")",
        "if \"false\" then print(\"taken\") end print(\"after\")",
        "x = \"nil\" print(x == nil)",
        "print(\"12\" + \"3\")",
    ];
    for source in sources {
        let bytes = quill::compile(source).unwrap();
        assert_eq!(run_binary(&bytes), run(source), "source: {}", source);
    }
}

#[test]
fn test_decode_is_operationally_identical() {
    let code = quill::compile_to_bytecode(FIB).unwrap();
    let decoded = CodeObject::decode(&code.encode().unwrap()).unwrap();
    assert_eq!(decoded, code);

    // re-encoding a decoded program is stable even when literals were re-classified
    let code = quill::compile_to_bytecode("x = \"nil\" y = \"12\" print(x, y)").unwrap();
    let once = CodeObject::decode(&code.encode().unwrap()).unwrap();
    let twice = CodeObject::decode(&once.encode().unwrap()).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn test_literal_text_classified_the_same_on_both_entry_points() {
    assert_eq!(run("print(\"12\" + \"3\")"), "15\n");
    assert_eq!(run("if \"false\" then print(\"taken\") end"), "");
    assert_eq!(run("x = \"nil\" print(x == nil)"), "true\n");
}

#[test]
fn test_floored_remainder() {
    assert_eq!(run("print(7 % 3, -7 % 3, 7 % -3, -7 % -3)"), "1\n2\n-2\n-1\n");
}

#[test]
fn test_linear_ir_invariants() {
    let ir = quill::generate_ir(FIB).unwrap();
    ir.validate().unwrap();
    for (id, instr) in ir.iter() {
        assert!(!instr.is_blank(), "blank at {}", id);
        if let Some(target) = instr.target() {
            assert!(target < ir.len(), "instruction {} targets {}", id, target);
        }
    }
    assert!(matches!(ir.get(ir.len() - 1), Some(Instruction::End)));
}

#[test]
fn test_every_slot_is_numbered() {
    let ir = quill::generate_ir(FIB).unwrap();
    let mut names: Vec<&str> = Vec::new();
    for (_, instr) in ir.iter() {
        let name = match instr {
            Instruction::Assignment { lhs, .. } => lhs.as_str(),
            Instruction::Parameter {
                name: Some(name), ..
            } => name.as_str(),
            _ => continue,
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let code = quill::compile_to_bytecode(FIB).unwrap();
    for op in &code.ops {
        if let Op::Pushv(slot) = op {
            assert!(*slot < names.len(), "slot {} was never numbered", slot);
        }
    }
}

#[test]
fn test_ir_snapshot() {
    let ir = quill::generate_ir(FIB).unwrap();
    let bytes = ir.to_postcard().unwrap();
    assert_eq!(LinearIr::from_postcard(&bytes).unwrap(), ir);
}

#[test]
fn test_listings() {
    let ir = quill::generate_ir("print(1)").unwrap();
    assert_eq!(
        ir.to_string(),
        "0: __tmp0 = 1\n1: push parameter __tmp0\n2: call print 1\n3: end\n"
    );
    let code = quill::compile_to_bytecode("x = 1").unwrap();
    assert_eq!(
        code.to_string(),
        "0: PUSHL 0\n1: PUSHL 1\n2: LOAD\n3: PUSHL 1\n4: PUSHV 0\n5: LOAD\n6: HAULT\n"
    );
}
