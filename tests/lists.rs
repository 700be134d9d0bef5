mod common;

use pretty_assertions::assert_eq;

use common::{assert_runtime_error, show};

#[test]
fn reads_with_negative_indices() {
    assert_eq!(show("var xs = [1, 2, 3]\nxs[-1]"), "3");
    assert_eq!(show("var xs = [1, 2, 3]\nxs[0] + xs[-3]"), "2");
    assert_eq!(show("var s = \"abc\"\ns[1]"), "b");
}

#[test]
fn reads_out_of_range_fail() {
    assert_runtime_error("var xs = [1, 2, 3]\nxs[5]", "Index 5 is out of range for 'xs' (length 3)");
    assert_runtime_error("var xs = [1]\nxs[-2]", "out of range");
    assert_runtime_error("var xs = [1]\nxs[\"a\"]", "List 'xs' must be indexed with a number");
    assert_runtime_error("var n = 4\nn[0]", "Cannot index 'n' of type 'number'");
}

#[test]
fn writes_past_the_end_pad_with_none() {
    assert_eq!(show("var xs = [1]\nxs[3] = 4\nxs"), "[1, none, none, 4]");
    assert_eq!(show("var xs = [1, 2]\nxs[-1] = 9\nxs"), "[1, 9]");
    assert_runtime_error("var xs = [1]\nxs[-5] = 0", "Invalid index -5 for list 'xs'");
}

#[test]
fn empty_brackets_push() {
    assert_eq!(show("var xs = []\nxs[] = 1\nxs[] = 2\nxs"), "[1, 2]");
    assert_runtime_error("var xs = []\nxs[]", "Empty brackets on 'xs' can only be assigned to");
}

#[test]
fn nested_writes_reach_the_inner_list() {
    assert_eq!(
        show("var grid = [[0, 0], [0, 0]]\ngrid[1][0] = 5\ngrid"),
        "[[0, 0], [5, 0]]"
    );
    assert_eq!(
        show("var d = {rows: [[1]]}\nd[\"rows\"][0][] = 2\nd"),
        "{\"rows\": [[1, 2]]}"
    );
    assert_runtime_error(
        "var xs = [1]\nxs[0][0] = 2",
        "'xs' holds a 'number' here, not a list or a dictionary",
    );
}

#[test]
fn slices() {
    let xs = "var xs = [1, 2, 3, 4]\n";

    assert_eq!(show(&format!("{}xs[1:3]", xs)), "[2, 3]");
    assert_eq!(show(&format!("{}xs[1:]", xs)), "[2, 3, 4]");
    assert_eq!(show(&format!("{}xs[:2]", xs)), "[1, 2]");
    assert_eq!(show(&format!("{}xs[1:-1]", xs)), "[2, 3]");
    assert_eq!(show(&format!("{}xs[3:1]", xs)), "[]");
    assert_eq!(show(&format!("{}xs[2:99]", xs)), "[3, 4]");

    assert_runtime_error(&format!("{}xs[-1:]", xs), "The start of a slice cannot be negative");
    assert_runtime_error("var s = \"abc\"\ns[0:1]", "slices only apply to lists");
}

#[test]
fn slice_results_are_new_lists() {
    assert_eq!(show("var xs = [1, 2, 3]\nvar ys = xs[0:2]\nys[] = 9\nxs"), "[1, 2, 3]");
}

#[test]
fn slice_assignment_splices() {
    assert_eq!(show("var xs = [1, 2, 3, 4]\nxs[1:3] = [\"a\"]\nxs"), "[1, \"a\", 4]");
    assert_eq!(show("var xs = [1, 2]\nxs[1:1] = [7, 8]\nxs"), "[1, 7, 8, 2]");
    assert_eq!(show("var xs = [1, 2, 3]\nxs[:1] = 0\nxs"), "[0, 2, 3]");
}

#[test]
fn delete_compacts_lists() {
    assert_eq!(show("var xs = [1, 2, 3]\ndelete xs[0]\nxs"), "[2, 3]");
    assert_eq!(show("var xs = [1, 2, 3]\ndelete xs[-1]\nxs"), "[1, 2]");
    assert_eq!(show("var xs = [1, 2, 3, 4]\ndelete xs[1:3]\nxs"), "[1, 4]");
    assert_runtime_error("var xs = [1]\ndelete xs[3]", "Index 3 is out of range for 'xs' (length 1)");
}

#[test]
fn dictionaries() {
    assert_eq!(show("var d = {a: 1}\nd[\"b\"] = 2\nd"), "{\"a\": 1, \"b\": 2}");
    assert_eq!(show("var d = {a: 1}\nd[\"a\"] = 5\nd"), "{\"a\": 5}");
    assert_eq!(show("var d = {a: 1}\nd[\"missing\"]"), "none");
    assert_eq!(show("var d = {a: 1}\nd.a + 1"), "2");
    assert_eq!(show("var d = {}\nd.name = \"x\"\nd"), "{\"name\": \"x\"}");
    assert_eq!(show("var name = \"q\"\n{name}"), "{\"name\": \"q\"}");

    assert_runtime_error("var d = {}\nd[1]", "Dictionary 'd' must be indexed with a string");
    assert_runtime_error("{a: 1, a: 2}", "Duplicate key 'a' in dictionary");
}

#[test]
fn dictionary_merge_and_delete() {
    assert_eq!(
        show("var d = {a: 1, b: 2}\nd[] = {b: 3, c: 4}\nd"),
        "{\"a\": 1, \"b\": 3, \"c\": 4}"
    );
    assert_eq!(show("{a: 1} + {a: 2, b: 3}"), "{\"a\": 2, \"b\": 3}");
    assert_eq!(show("var d = {a: 1, b: 2}\ndelete d[\"a\"]\nd"), "{\"b\": 2}");
    assert_eq!(show("var d = {a: 1}\ndelete d[\"zzz\"]\nd"), "{\"a\": 1}");

    assert_runtime_error("var d = {}\nd[] = [1]", "Only a dictionary can be merged into 'd'");
    assert_runtime_error("var d = {a: 1}\nd[0:1]", "slices only apply to lists");
}

#[test]
fn containers_are_shared_by_reference() {
    assert_eq!(show("var a = [1, 2]\nvar b = a\nb[] = 3\na"), "[1, 2, 3]");
    assert_eq!(show("var a = {x: 1}\nvar b = a\nb.x = 2\na.x"), "2");
    assert_eq!(
        show("func add(xs) -> xs[] = \"added\"\nvar items = []\nadd(items)\nitems"),
        "[\"added\"]"
    );
}

#[test]
fn clone_breaks_sharing_at_every_level() {
    let source = "var a = [1, [2]]
    var b = clone(a)
    b[1][] = 3
    b[] = 4
    [a, b]";

    assert_eq!(show(source), "[[1, [2]], [1, [2, 3], 4]]");
}

#[test]
fn list_operators() {
    assert_eq!(show("[1, 2] + [3]"), "[1, 2, 3]");
    assert_eq!(show("0 + [1]"), "[0, 1]");
    assert_eq!(show("[0] * 3"), "[0, 0, 0]");
    assert_eq!(show("[1, 2] > 1"), "true");
    assert_eq!(show("var a = [1]\nvar b = a + 2\na"), "[1]");
    assert_runtime_error("[1] * -1", "Cannot repeat a sequence -1 times");
}
