mod common;

use pretty_assertions::assert_eq;

use common::{assert_runtime_error, error, output, show};

const ANIMALS: &str = "class Animal:
  protected property name: string = \"\"

  method __init(name):
    self.name = name
  end

  method speak() -> self.name + \" makes a sound\"
  method __repr() -> \"<\" + self.name + \">\"
end

class Dog extends Animal:
  override method speak() -> super() + \" (woof)\"
  method fetch() -> self.name + \" fetches\"
end
";

fn with_animals(rest: &str) -> String {
    format!("{}{}", ANIMALS, rest)
}

#[test]
fn constructor_and_methods() {
    assert_eq!(show(&with_animals("var a = new Animal(\"Cat\")\na.speak()")), "Cat makes a sound");
    assert_eq!(show(&with_animals("var d = new Dog(\"Rex\")\nd.fetch()")), "Rex fetches");
}

#[test]
fn super_runs_the_parent_method() {
    assert_eq!(
        show(&with_animals("var d = new Dog(\"Rex\")\nd.speak()")),
        "Rex makes a sound (woof)"
    );
}

#[test]
fn repr_drives_display() {
    assert_eq!(output(&with_animals("log(new Dog(\"Rex\"))")), "<Rex>\n");
    assert_eq!(show(&with_animals("var d = new Dog(\"Rex\")\nd.toString()")), "<Rex>");
    assert_eq!(show(&with_animals("str(new Animal(\"Cat\"))")), "<Cat>");
}

#[test]
fn instances_without_repr_display_their_class() {
    assert_eq!(output("class Point:\nend\nlog(new Point)"), "<Point instance>\n");
}

#[test]
fn protected_members_stay_inside_the_hierarchy() {
    assert_runtime_error(
        &with_animals("var d = new Dog(\"Rex\")\nd.name"),
        "'name' is protected in class 'Dog'",
    );
    assert_runtime_error(
        &with_animals("var d = new Dog(\"Rex\")\nd.name = \"Max\""),
        "'name' is protected in class 'Dog'",
    );
}

#[test]
fn instanceof_and_names() {
    assert_eq!(show(&with_animals("new Dog(\"Rex\") instanceof Animal")), "true");
    assert_eq!(show(&with_animals("new Animal(\"Cat\") instanceof Dog")), "false");
    assert_eq!(show(&with_animals("5 instanceof Animal")), "false");
    assert_eq!(show(&with_animals("new Dog(\"Rex\").__name")), "Dog");
    assert_eq!(show(&with_animals("Dog.__name")), "Dog");
    assert_eq!(show(&with_animals("typeof new Dog(\"Rex\")")), "Dog");
    assert_eq!(show(&with_animals("typeof Dog")), "class");

    assert_runtime_error(
        &with_animals("var d = new Dog(\"Rex\")\nd instanceof d"),
        "The right side of 'instanceof' must be a class",
    );
}

#[test]
fn private_members() {
    let source = "class Account:
      private property balance = 0

      method deposit(amount):
        self.balance += amount
        return self.balance
      end
    end
    var account = new Account
    account.deposit(5)
    account.deposit(5)";

    assert_eq!(show(source), "10");
    assert_runtime_error(
        &format!("{}\naccount.balance", source),
        "'balance' is private in class 'Account'",
    );
}

#[test]
fn private_members_are_not_inherited() {
    let source = "class Base:
      private property secret = 1
      method reveal() -> self.secret
    end
    class Child extends Base:
      method peek() -> self.secret
    end
    var child = new Child
    child.peek()";

    assert_eq!(show(source), "none");
}

#[test]
fn static_members() {
    let source = "class Counter:
      static property count = 0

      static method bump():
        Counter::count = Counter::count + 1
        return Counter::count
      end
    end
    Counter::bump()
    Counter::bump()";

    assert_eq!(show(source), "2");
    assert_runtime_error(&format!("{}\nCounter.count", source), "'count' is static; access it with '::'");
    assert_runtime_error(
        "class A:\n  method f() -> 1\nend\nA::f",
        "'f' is not static; access it with '.'",
    );
    assert_runtime_error("class A:\nend\nA::missing", "Static member 'missing' does not exist on 'A'");
}

#[test]
fn instances_do_not_carry_static_members() {
    assert_eq!(
        show("class A:\n  static property n = 1\nend\nvar a = new A\na.n"),
        "none"
    );
}

#[test]
fn getters_and_setters() {
    let source = "class Temperature:
      private property celsius = 0

      getter fahrenheit -> self.celsius * 9 / 5 + 32

      setter fahrenheit(value):
        self.celsius = (value - 32) * 5 / 9
      end
    end
    var t = new Temperature
    t.fahrenheit = 212";

    assert_eq!(show(&format!("{}\nt.fahrenheit", source)), "212");
    assert_runtime_error(&format!("{}\nt.celsius", source), "'celsius' is private");

    assert_runtime_error(
        "class A:\n  getter x -> 1\nend\nvar a = new A\na.x = 2",
        "'x' has a getter but no setter",
    );
    assert_runtime_error(
        "class A:\n  setter x(v): 1\nend\nvar a = new A\na.x",
        "'x' has a setter but no getter",
    );
}

#[test]
fn instances_get_their_own_property_values() {
    let source = "class Bag:
      property items = []
    end
    var a = new Bag
    var b = new Bag
    a.items[] = 1
    [a.items, b.items]";

    assert_eq!(show(source), "[[1], []]");
}

#[test]
fn undeclared_properties_are_added_to_instances() {
    assert_eq!(show("class A:\nend\nvar a = new A\na.extra = 5\na.extra"), "5");
    assert_eq!(show("class A:\nend\nvar a = new A\na.missing"), "none");
    assert_runtime_error("class A:\nend\nA.extra = 5", "'extra' does not exist on 'A'");
}

#[test]
fn typed_properties() {
    assert!(error("class P:\n  property x: number = 0\nend\nvar p = new P\np.x = \"a\"").is_type());
    assert!(error("class P:\n  property x: number = \"a\"\nend").is_type());
}

#[test]
fn member_assignment_rules() {
    assert_runtime_error(
        "class A:\n  method f() -> 1\nend\nvar a = new A\na.f = 2",
        "Cannot assign to method 'f'",
    );
    assert_runtime_error("class A:\nend\nvar a = new A\na.__name = \"B\"", "'__name' is read-only");
}

#[test]
fn overriding_requires_the_keyword() {
    assert_runtime_error(
        "class A:\n  method f() -> 1\nend\nclass B extends A:\n  method f() -> 2\nend",
        "'f' is already defined by a parent class; declare it with 'override'",
    );
    assert_eq!(
        show("class A:\n  method f() -> 1\nend\nclass B extends A:\n  override method f() -> 2\nend\nvar b = new B\nb.f()"),
        "2"
    );
}

#[test]
fn special_methods_are_checked() {
    assert_runtime_error(
        "class A:\n  static method __init() -> 1\nend",
        "'__init' must be a public, non-static method declared without 'override'",
    );
    assert_runtime_error(
        "class A:\n  property __repr = 1\nend",
        "'__repr' must be a public, non-static method",
    );
    assert_runtime_error("class A:\n  method __repr(x) -> x\nend", "'__repr' takes no arguments");
    assert_runtime_error("class A:\n  property toString = 1\nend", "'toString' is reserved");
    assert_runtime_error(
        "class A:\n  method f() -> 1\n  property f = 2\nend",
        "'f' is declared more than once",
    );
}

#[test]
fn class_definition_errors() {
    assert_runtime_error("class A:\nend\nclass A:\nend", "Class 'A' already exists");
    assert_runtime_error("class B extends Missing:\nend", "Parent class 'Missing' is not defined");
    assert_runtime_error("var x = 1\nclass B extends x:\nend", "classes can only extend classes");
}

#[test]
fn instantiation_errors() {
    assert_runtime_error("class A:\nend\nnew A(1)", "Class 'A' has no '__init' but got 1 argument(s)");
    assert_runtime_error("new Missing()", "Class 'Missing' is not defined");
    assert_runtime_error("class A:\nend\nA()", "Class 'A' cannot be called; use 'new A(...)'");
}

#[test]
fn super_needs_a_method_and_a_parent() {
    assert_runtime_error("super()", "'super' can only be used inside a method");
    assert_runtime_error(
        "class A:\n  method f() -> super()\nend\nvar a = new A\na.f()",
        "Class 'A' has no parent class",
    );
}

#[test]
fn methods_read_off_instances_stay_bound() {
    let source = "class Greeter:
      property word = \"hi\"
      method greet(name) -> self.word + \" \" + name
    end
    var greet = new Greeter().greet
    greet(\"Ann\")";

    assert_eq!(show(source), "hi Ann");
}

#[test]
fn inherited_constructor_runs_for_subclasses() {
    let source = "class Shape:
      property sides = 0
      method __init(sides):
        self.sides = sides
      end
    end
    class Square extends Shape:
    end
    new Square(4).sides";

    assert_eq!(show(source), "4");
}

#[test]
fn multi_level_super_chains() {
    let source = "class A:
      method who() -> \"A\"
    end
    class B extends A:
      override method who() -> super() + \"B\"
    end
    class C extends B:
      override method who() -> super() + \"C\"
    end
    new C().who()";

    assert_eq!(show(source), "ABC");
}

#[test]
fn property_defaults_can_use_methods() {
    let source = "class Settings:
      static method base() -> 10
      method double(n) -> n * 2

      property size = self.double(4)
      property limit = Settings::base() + 1
    end
    var s = new Settings
    [s.size, s.limit]";

    assert_eq!(show(source), "[8, 11]");
}
