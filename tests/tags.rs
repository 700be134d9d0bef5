mod common;

use std::rc::Rc;

use pretty_assertions::assert_eq;

use common::{assert_runtime_error, error, eval, show};
use quill::value::{Html, Value};

fn html(value: &Value) -> Rc<Html> {
    match value {
        Value::Html(html) => Rc::clone(html),
        other => panic!("expected html, got {}", other),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => panic!("expected text, got {}", other),
    }
}

const CARD: &str = "tag Card:
  prop title: string
  prop subtitle = \"no subtitle\"
  state clicks = 0

  method render() -> <div.card><h1>{self.title}</h1><p>{self.subtitle}</p></div>
end
";

#[test]
fn native_elements_keep_their_shape() {
    let node = html(&eval("<div.card.big#main data-user-id=\"7\" title={\"hi\"}>\n  \"text\"\n  <br/>\n</div>"));

    assert_eq!(node.tagname, "div");
    assert_eq!(node.classes, vec!["card".to_string(), "big".to_string()]);
    assert_eq!(node.id.as_deref(), Some("main"));
    assert_eq!(node.attributes.len(), 2);
    assert_eq!(node.attributes[0].0, "data-user-id");
    assert_eq!(text(&node.attributes[1].1), "hi");
    assert_eq!(node.children.len(), 2);
    assert_eq!(text(&node.children[0]), "text");
    assert_eq!(html(&node.children[1]).tagname, "br");
    assert!(node.component.is_none());
}

#[test]
fn bare_attributes_are_true() {
    let node = html(&eval("<input disabled/>"));

    assert!(matches!(node.attributes[0].1, Value::Boolean(true)));
}

#[test]
fn children_are_flattened() {
    let node = html(&eval("<ul>{foreach [\"a\", \"b\"] as x: <li>{x}</li>}{none}</ul>"));

    assert_eq!(node.children.len(), 2);
    let second = html(&node.children[1]);
    assert_eq!(second.tagname, "li");
    assert_eq!(text(&second.children[0]), "b");
}

#[test]
fn attributes_are_checked_against_the_element() {
    assert!(matches!(eval("<a href=\"/home\" aria-label=\"Home\"/>"), Value::Html(_)));
    assert_runtime_error("<div href=\"/home\"/>", "'href' is not a valid attribute of <div>");
    assert_runtime_error("<blink/>", "Unknown tag 'blink'");
}

#[test]
fn event_handlers_must_be_callable() {
    let node = html(&eval("func go() -> 1\n<button @click={go}>\"Go\"</button>"));
    assert_eq!(node.events[0].0, "click");

    assert_runtime_error(
        "<button @click={5}>\"Go\"</button>",
        "Handler for '@click' must be callable, got 'number'",
    );
}

#[test]
fn user_tags_render_their_template() {
    let node = html(&eval(&format!("{}<Card title=\"Hello\"/>", CARD)));

    assert_eq!(node.tagname, "Card");
    assert_eq!(node.component.as_deref(), Some("Card"));
    assert_eq!(node.children.len(), 1);

    let card = html(&node.children[0]);
    assert_eq!(card.tagname, "div");
    assert_eq!(card.classes, vec!["card".to_string()]);

    let heading = html(&card.children[0]);
    assert_eq!(text(&heading.children[0]), "Hello");

    let paragraph = html(&card.children[1]);
    assert_eq!(text(&paragraph.children[0]), "no subtitle");
}

#[test]
fn props_are_validated() {
    assert_runtime_error(&format!("{}<Card/>", CARD), "<Card> requires prop 'title'");
    assert_runtime_error(
        &format!("{}<Card title=\"x\" color=\"red\"/>", CARD),
        "<Card> has no prop 'color'",
    );
    assert_runtime_error(
        &format!("{}<Card title=\"x\" clicks={{1}}/>", CARD),
        "<Card> has no prop 'clicks'",
    );
    assert!(error(&format!("{}<Card title={{5}}/>", CARD)).is_type());
}

#[test]
fn tag_children_are_passed_to_render() {
    let source = "tag Panel:
      method render() -> <section>{self.children}</section>
    end
    <Panel><p>\"a\"</p>\"b\"</Panel>";

    let node = html(&eval(source));
    let section = html(&node.children[0]);

    assert_eq!(section.tagname, "section");
    assert_eq!(section.children.len(), 2);
    assert_eq!(html(&section.children[0]).tagname, "p");
    assert_eq!(text(&section.children[1]), "b");
}

#[test]
fn render_methods_can_use_state_and_helpers() {
    let source = "tag Counter:
      prop start?: number
      state count = 10

      method label() -> \"count: \" + (self.start ?? self.count)
      method render() -> <span>{self.label()}</span>
    end
    [<Counter/>, <Counter start={3}/>]";

    let Value::List(items) = eval(source) else {
        panic!("expected a list");
    };
    let items = items.borrow();

    let first = html(&html(&items[0]).children[0]);
    assert_eq!(text(&first.children[0]), "count: 10");

    let second = html(&html(&items[1]).children[0]);
    assert_eq!(text(&second.children[0]), "count: 3");
}

#[test]
fn tag_definition_errors() {
    assert_runtime_error("tag Empty:\n  prop x?\nend\n<Empty/>", "<Empty> has no 'render' method");
    assert_runtime_error(
        "tag div:\n  method render() -> none\nend",
        "'div' is a native element and cannot be redefined",
    );
    assert_runtime_error(
        "tag Box:\n  prop children\nend",
        "'children' is reserved for the tag's child nodes",
    );
    assert_runtime_error(
        "tag Box:\n  prop a\n  state a = 1\nend",
        "'a' is declared more than once",
    );
    assert!(error("tag Box:\n  state n: number = \"x\"\nend").is_type());
}

#[test]
fn html_values_have_their_own_type() {
    assert_eq!(show("typeof <br/>"), "html");
    assert_eq!(show("tag T:\n  method render() -> none\nend\ntypeof T"), "tag");
}
