mod common;

use pretty_assertions::assert_eq;

use common::{assert_runtime_error, error, eval, output, show};
use quill::value::Value;

#[test]
fn program_value_is_the_list_of_statement_values() {
    let (result, _) = common::run("var x = 40\nx + 2");

    assert_eq!(result.unwrap().to_string(), "[40, 42]");
}

#[test]
fn top_level_return_ends_the_program() {
    let (result, output) = common::run("log(1)\nreturn 7\nlog(2)");

    assert_eq!(result.unwrap().to_string(), "7");
    assert_eq!(output, "1\n");
}

#[test]
fn arithmetic_coercions() {
    assert_eq!(show("none + none"), "0");
    assert_eq!(show("\"abc\" + 5"), "abc5");
    assert_eq!(show("true + true"), "2");
    assert_eq!(show("none / 5"), "0");
    assert_eq!(show("7 % 4"), "3");
    assert_eq!(show("2 ** 10"), "1024");
    assert_eq!(show("\"ab\" * 3"), "ababab");
    assert_eq!(show("[1] + 2"), "[1, 2]");
}

#[test]
fn division_errors() {
    assert_runtime_error("5 / none", "Division by zero");
    assert_runtime_error("5 % 0", "Division by zero");
}

#[test]
fn illegal_operations_name_the_operand_types() {
    assert_runtime_error("[1] - 1", "Illegal operation");
    assert_runtime_error("-\"x\"", "Illegal operation");
}

#[test]
fn equality() {
    assert_eq!(show("5 == \"5\""), "true");
    assert_eq!(show("[1, [2]] == [1, [2]]"), "true");
    assert_eq!(show("{a: 1} != {a: 2}"), "true");
    assert_eq!(show("none == 0"), "false");
    assert_eq!(show("func f() -> 1\nf == f"), "false");
}

#[test]
fn logical_operators_return_operands() {
    assert_eq!(show("0 or \"x\""), "x");
    assert_eq!(show("\"\" and 1"), "");
    assert_eq!(show("none ?? 5"), "5");
    assert_eq!(show("0 ?? 5"), "0");
    assert_eq!(show("not []"), "true");
}

#[test]
fn short_circuit_skips_the_right_side() {
    assert_eq!(output("false and log(\"never\")\ntrue or log(\"never\")\n1 ?? log(\"never\")"), "");
}

#[test]
fn typeof_names() {
    assert_eq!(show("typeof 1"), "number");
    assert_eq!(show("typeof [1]"), "list");
    assert_eq!(show("typeof {}"), "dict");
    assert_eq!(show("typeof none"), "none");
    assert_eq!(show("typeof log"), "function");
    assert_eq!(show("typeof Math"), "object");
}

#[test]
fn variables_and_scopes() {
    assert_eq!(show("var x = 1\nx = x + 1\nx"), "2");
    assert_runtime_error("var x = 1\nvar x = 2", "'x' already exists");
    assert_runtime_error("y + 1", "'y' is not defined");
    assert_runtime_error("y = 1", "'y' is not defined");

    let shadowed = "var x = 1
    func f():
      var x = 2
      return x
    end
    [f(), x]";
    assert_eq!(show(shadowed), "[2, 1]");
}

#[test]
fn inline_blocks_scope_like_full_blocks() {
    assert_eq!(show("var x=1; if true: var x=2 end; x"), "1");
    assert_eq!(show("var x=1; if true: x=2 end; x"), "2");
    assert_eq!(show("if false: 1 else: 2 end"), "2");
    assert_eq!(show("var n = 0; while n < 3: n += 1 end; n"), "3");
    assert_eq!(show("func seven(): return 7 end; seven()"), "7");
}

#[test]
fn self_referencing_containers() {
    assert_eq!(output("var a = [1]\na[] = a\nlog(a)"), "[1, [...]]\n");
    assert_eq!(output("var d = {}\nd.me = d\nlog(d)"), "{\"me\": {...}}\n");
    assert_eq!(show("var a = [1]\na[] = a\na == a"), "true");

    let cloned = "var a = [1]
    a[] = a
    var b = clone(a)
    b[0] = 5
    [a[0], b[1][0], a == b]";
    assert_eq!(show(cloned), "[1, 5, false]");
}

#[test]
fn delete_removes_a_variable() {
    assert_runtime_error("var x = 1\ndelete x\nx", "'x' is not defined");
    assert_runtime_error("delete nothing", "'nothing' is not defined in this scope");
}

#[test]
fn constants_cannot_change() {
    assert_eq!(show("define LIMIT = 10\nLIMIT * 2"), "20");
    assert_runtime_error("define LIMIT = 10\nLIMIT = 2", "Cannot assign to constant 'LIMIT'");
    assert_runtime_error("define LIMIT = 10\ndefine LIMIT = 2", "Constant 'LIMIT' already exists");
    assert_runtime_error(
        "define LIMIT = 10\nfunc f():\n  var LIMIT = 1\nend\nf()",
        "'LIMIT' is a constant and cannot be redeclared",
    );
    assert_runtime_error("var log = 1", "'log' is a constant and cannot be redeclared");
    assert_runtime_error(
        "func make() -> define LIMIT = 1\ndefine LIMIT = make()",
        "Constant 'LIMIT' already exists",
    );
}

#[test]
fn declared_types_are_checked_on_every_write() {
    let mismatch = error("var x: number = \"a\"");
    assert!(mismatch.is_type(), "got: {}", mismatch);
    assert!(mismatch.to_string().contains("expected 'number' but got 'string'"));

    assert!(error("var n: number = 1\nn = \"s\"").is_type());
    assert!(error("func f(a: string) -> a\nf(1)").is_type());
    assert!(error("define PI: string = 3").is_type());

    assert_eq!(show("var anything: any = 1\nanything = \"s\""), "s");
    assert!(error("var d: dynamic = none").is_type());
}

#[test]
fn increments() {
    assert_eq!(show("var i = 1\n[i++, i]"), "[1, 2]");
    assert_eq!(show("var i = 1\n[++i, i]"), "[2, 2]");
    assert_eq!(show("var i\ni--"), "none");
    assert_runtime_error("var s = \"a\"\ns++", "Cannot increment or decrement");
}

#[test]
fn compound_assignment() {
    assert_eq!(show("var x = 2\nx **= 3\nx"), "8");
    assert_eq!(show("var x\nx ??= 4\nx ??= 5\nx"), "4");
}

#[test]
fn if_is_an_expression() {
    assert_eq!(show("var n = 5\nif n > 3: \"big\" else \"small\""), "big");
    assert_eq!(show("if false: 1"), "none");
    assert_eq!(show("var n = 0\nif n: 1 elif n == 0: 2 else 3"), "2");
}

#[test]
fn multi_line_if_runs_its_block() {
    let source = "var n = 2
    if n == 1:
      log(\"one\")
    elif n == 2:
      log(\"two\")
      log(\"still two\")
    else:
      log(\"other\")
    end";

    assert_eq!(output(source), "two\nstill two\n");
}

#[test]
fn loops_collect_their_values() {
    assert_eq!(show("for i to 3: i * 2"), "[0, 2, 4]");
    assert_eq!(show("for i = 3 to 0 step -1: i"), "[3, 2, 1]");
    assert_eq!(show("for i = 1 to 6 step 2: i"), "[1, 3, 5]");
    assert_eq!(show("var i = 0\nwhile i < 3: i++"), "[0, 1, 2]");
    assert_eq!(show("for i = 5 to 1: i"), "[]");
}

#[test]
fn for_loop_bounds_must_be_numbers() {
    assert_runtime_error("for i to 3 step 0: i", "The step of a for loop cannot be 0");
    assert_runtime_error("for i to \"3\": i", "Expected a number as for loop end");
}

#[test]
fn break_and_continue() {
    assert_eq!(show("for i to 10: if i == 3: break else i"), "[0, 1, 2]");
    assert_eq!(
        show("foreach [1, 2, 3, 4] as x: if x % 2 == 0: continue else x * 10"),
        "[10, 30]"
    );
}

#[test]
fn loop_signals_stop_at_the_function_boundary() {
    let inner_loop = "func firsts():
      var out = []
      for i to 5:
        if i == 1: continue
        if i == 3: break
        out[] = i
      end
      out[] = 7
      return out
    end
    var collected = []
    for j to 2: collected = collected + firsts()
    collected";
    assert_eq!(show(inner_loop), "[0, 2, 7, 0, 2, 7]");

    let nested_return = "func find(target):
      foreach [[1, 2], [3, 4]] as row:
        foreach row as x:
          if x == target: return x * 10
        end
      end
      return -1
    end
    [find(3), find(9), find(1)]";
    assert_eq!(show(nested_return), "[30, -1, 10]");

    let stray = "func stray():
      break
    end
    for i to 3: stray()";
    assert_eq!(show(stray), "[none, none, none]");
}

#[test]
fn foreach_forms() {
    assert_eq!(show("foreach [\"a\", \"b\"] as i, v: i"), "[0, 1]");
    assert_eq!(show("foreach {a: 1, b: 2} as k, v: k + v"), "[\"a1\", \"b2\"]");
    assert_eq!(show("foreach {a: 1, b: 2} as v: v"), "[1, 2]");
    assert_eq!(show("foreach \"hey\" as c: c"), "[\"h\", \"e\", \"y\"]");
    assert_runtime_error("foreach 5 as x: x", "Cannot iterate over a value of type 'number'");
}

#[test]
fn loop_variables_are_fresh_each_iteration() {
    let source = "var fns = []
    for i to 3: fns[] = func() -> i
    foreach fns as f: f()";

    assert_eq!(show(source), "[0, 1, 2]");
}

#[test]
fn switch_picks_the_first_matching_case() {
    let source = "func describe(x):
      switch x:
        case 1, 2:
          return \"low\"
        case 3:
          return \"three\"
        default:
          return \"high\"
      end
    end
    [describe(2), describe(3), describe(9)]";

    assert_eq!(show(source), "[\"low\", \"three\", \"high\"]");
    assert_eq!(show("switch 4:\n  case 1:\n    1\nend"), "none");
}

#[test]
fn functions_and_recursion() {
    let source = "func fib(n) -> if n < 2: n else fib(n - 1) + fib(n - 2)
    fib(10)";

    assert_eq!(show(source), "55");
    assert_eq!(show("func f():\n  1\nend\nf()"), "none");
    assert_eq!(show("var square = func(x) -> x * x\nsquare(4)"), "16");
}

#[test]
fn closures_keep_their_scope() {
    let source = "func counter():
      var count = 0
      return func() -> ++count
    end
    var next = counter()
    next()
    next()";

    assert_eq!(show(source), "2");
}

#[test]
fn default_optional_and_rest_parameters() {
    assert_eq!(
        show("func greet(name, greeting = \"Hello\") -> greeting + \", \" + name\ngreet(\"Ann\")"),
        "Hello, Ann"
    );
    assert_eq!(show("func f(a?: number) -> a\nf()"), "none");
    assert_eq!(show("func f(first, ...rest) -> rest\nf(1, 2, 3)"), "[2, 3]");
    assert_eq!(show("func f(...rest) -> rest\nf()"), "[]");
}

#[test]
fn argument_count_errors() {
    assert_runtime_error("func f(a) -> a\nf()", "Missing argument 'a' (0 given)");
    assert_runtime_error("func f(a) -> a\nf(1, 2)", "Expected at most 1 argument(s) but got 2");
    assert_runtime_error("var x = 1\nx()", "A value of type 'number' is not callable");
}

#[test]
fn optional_chaining() {
    assert_eq!(show("var d = none\nd?.name"), "none");
    assert_eq!(show("var d = none\nd?.name.first"), "none");
    assert_eq!(show("var f = none\nf?.(1)"), "none");
    assert_eq!(show("var xs = none\nxs?.[0]"), "none");
    assert_runtime_error("var d = none\nd.name", "Cannot read property 'name'");
}

#[test]
fn enums() {
    let source = "enum Color:
      Red,
      Green,
      Blue
    end";

    assert_eq!(show(&format!("{}\nColor.Blue", source)), "2");
    assert_eq!(show(&format!("{}\nColor::Red", source)), "0");
    assert_eq!(show(&format!("{}\ntypeof Color", source)), "enum");
    assert_runtime_error(&format!("{}\nColor.Pink", source), "'Pink' is not a member of enum 'Color'");
    assert_runtime_error(&format!("{}\nvar Color = 1", source), "'Color' is a constant");
    assert_runtime_error("enum E:\n  A,\n  A\nend", "Duplicate member 'A' in enum 'E'");
}

#[test]
fn log_writes_display_forms() {
    assert_eq!(
        output("log(\"a\", 1, [1, \"b\"], {k: none}, true)"),
        "a 1 [1, \"b\"] {\"k\": none} true\n"
    );
}

#[test]
fn native_functions() {
    assert_eq!(show("len([1, 2, 3])"), "3");
    assert_eq!(show("len(\"héllo\")"), "5");
    assert_eq!(show("str(12) + str(true)"), "12true");
    assert_eq!(show("num(\"3.5\") + 1"), "4.5");
    assert_eq!(show("keys({b: 1, a: 2})"), "[\"b\", \"a\"]");
    assert_eq!(show("clock() > 0"), "true");

    assert_runtime_error("num(\"x\")", "Cannot convert \"x\" to a number");
    assert_runtime_error("len(1, 2)", "'len' expects 1 argument(s) but got 2");
    assert_runtime_error("len(5)", "A value of type 'number' has no length");
}

#[test]
fn native_classes() {
    assert_eq!(show("Math.floor(2.7)"), "2");
    assert_eq!(show("Math::ceil(2.1)"), "3");
    assert_eq!(show("Math.round(-2.5)"), "-2");
    assert_eq!(show("Math.max(1, 5, 3)"), "5");
    assert_eq!(show("Math.PI > 3.14"), "true");
    assert_eq!(show("Time.now > 0"), "true");
    assert_eq!(show("typeof Time.iso()"), "string");

    assert_runtime_error("Math.min()", "Expected at least one argument");
    assert_runtime_error("Math.tau", "'tau' does not exist on 'Math'");
}

#[test]
fn runtime_errors_carry_their_context() {
    let error = error("func broken():\n  return missing\nend\nbroken()");

    let message = error.to_string();
    assert!(message.contains("<function broken>"), "got: {}", message);
    assert!(message.contains("'missing' is not defined"), "got: {}", message);
}

#[test]
fn program_result_value_kinds() {
    assert!(matches!(eval("1 > 0"), Value::Boolean(true)));
    assert!(matches!(eval("none"), Value::None));
}
