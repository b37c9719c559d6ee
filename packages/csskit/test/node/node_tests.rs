//! Node Tests
//!
//! Cloning, moving, positions, errors and warnings of single nodes.

use csskit::node::RawField;
use csskit::source_map::Position;
use csskit::stringifier::RawKey;
use csskit::{parse, ErrorOptions, Node, NodeProps, NodeType, ProcessOptions};

fn parse_css(css: &str) -> Node {
    parse(css, &ProcessOptions::default()).unwrap()
}

fn first_decl(root: &Node) -> Node {
    root.first().unwrap().first().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_error_at_node_start() {
        let css = parse_css("a{}");
        let error = css.first().unwrap().error("Test", &ErrorOptions::default());
        assert_eq!(error.message(), "<css input>:1:1: Test");
        assert_eq!(error.line, Some(1));
    }

    #[test]
    fn should_create_error_for_detached_node() {
        let error = Node::new_rule("a").error("Test", &ErrorOptions::default());
        assert_eq!(error.message(), "<css input>: Test");
        assert_eq!(error.line, None);
    }

    #[test]
    fn should_attach_warning_to_result() {
        let css = parse_css("a{}");
        let mut result = css.to_result(&ProcessOptions::default()).unwrap();
        let rule = css.first().unwrap();

        let warning = rule.warn(
            &mut result,
            "Test",
            ErrorOptions {
                plugin: Some("lint".into()),
                ..Default::default()
            },
        );
        assert_eq!(warning.line, Some(1));
        assert_eq!(warning.column, Some(1));
        assert_eq!(warning.to_string(), "lint: <css input>:1:1: Test");
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].node.as_ref(), Some(&rule));
    }

    #[test]
    fn should_remove_node_from_parent() {
        let css = parse_css("a{one:1;two:2}");
        let one = first_decl(&css);
        one.remove();

        assert_eq!(css.to_string(), "a{two:2}");
        assert!(one.parent().is_none());
    }

    #[test]
    fn should_replace_node() {
        let css = parse_css("a{one:1;two:2}");
        let one = first_decl(&css);
        one.replace_with(NodeProps::decl("fix", "fixed")).unwrap();

        assert_eq!(css.to_string(), "a{fix:fixed;two:2}");
        assert!(one.parent().is_none());
    }

    #[test]
    fn should_replace_node_with_several_nodes() {
        let css = parse_css("a{one:1;three:3}");
        let one = first_decl(&css);
        one.replace_with(vec![
            Node::new_decl("one", "1"),
            Node::new_decl("two", "2"),
        ])
        .unwrap();

        assert_eq!(css.to_string(), "a{one:1;two:2;three:3}");
    }

    #[test]
    fn should_clone_deeply() {
        let css = parse_css("a{color:black}");
        let rule = css.first().unwrap();
        let clone = rule.clone_node();

        assert!(clone.parent().is_none());
        assert_eq!(clone.first().unwrap().parent().as_ref(), Some(&clone));
        assert_eq!(clone.raws().between, None);

        clone.first().unwrap().set_prop("x");
        assert_eq!(first_decl(&css).prop(), "color");
        assert_eq!(clone.to_string(), "a {\n    x: black\n}");
    }

    #[test]
    fn should_override_fields_in_clone() {
        let decl = Node::new_decl("color", "black");
        let clone = decl.clone_with(NodeProps {
            value: Some("white".into()),
            ..Default::default()
        });
        assert_eq!(clone.prop(), "color");
        assert_eq!(clone.value(), "white");
        assert_eq!(decl.value(), "black");
    }

    #[test]
    fn should_clone_before_and_after() {
        let css = parse_css("a{one:1}");
        let one = first_decl(&css);
        let copy = one
            .clone_before(NodeProps {
                value: Some("2".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(css.to_string(), "a{one:2;one:1}");
        assert_eq!(copy.next().as_ref(), Some(&one));

        let css = parse_css("a{one:1}");
        first_decl(&css)
            .clone_after(NodeProps {
                value: Some("2".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(css.to_string(), "a{one:1;one:2}");
    }

    #[test]
    fn should_move_node_to_other_parent() {
        let css = parse_css("a{one:1}b{}");
        let one = first_decl(&css);
        let b = css.last().unwrap();
        one.move_to(&b).unwrap();

        assert_eq!(css.to_string(), "a{}b{one:1}");
        assert_eq!(one.parent().as_ref(), Some(&b));
    }

    #[test]
    fn should_move_node_between_siblings() {
        let css = parse_css("a{one:1;two:2;three:3}");
        let rule = css.first().unwrap();
        let one = rule.child(0).unwrap();
        let three = rule.child(2).unwrap();

        one.move_after(&three).unwrap();
        assert_eq!(css.to_string(), "a{two:2;three:3;one:1}");

        one.move_before(&rule.first().unwrap()).unwrap();
        assert_eq!(css.to_string(), "a{one:1;two:2;three:3}");
    }

    #[test]
    fn should_find_siblings() {
        let css = parse_css("a{one:1;two:2}");
        let rule = css.first().unwrap();
        let one = rule.child(0).unwrap();
        let two = rule.child(1).unwrap();

        assert_eq!(one.next().as_ref(), Some(&two));
        assert_eq!(two.prev().as_ref(), Some(&one));
        assert!(one.prev().is_none());
        assert!(two.next().is_none());
        assert!(Node::new_rule("a").next().is_none());
    }

    #[test]
    fn should_find_root() {
        let css = parse_css("@page{a{color:black}}");
        let decl = css.first().unwrap().first().unwrap().first().unwrap();
        assert_eq!(decl.root(), css);

        let detached = Node::new_decl("a", "1");
        assert_eq!(detached.root(), detached);
    }

    #[test]
    fn should_compute_position_inside_node() {
        let css = parse_css("@rule param {}");
        let at_rule = css.first().unwrap();

        assert_eq!(at_rule.position_by(Some(7), None), Some(Position::new(1, 8)));
        assert_eq!(at_rule.position_by(None, Some("am")), Some(Position::new(1, 10)));
        assert_eq!(at_rule.position_by(None, Some("missing")), Some(Position::new(1, 1)));
        assert_eq!(at_rule.position_by(None, None), Some(Position::new(1, 1)));
    }

    #[test]
    fn should_count_lines_inside_node() {
        let css = parse_css("a {\n  color:\n    black\n}");
        let decl = first_decl(&css);
        assert_eq!(decl.position_by(None, Some("black")), Some(Position::new(3, 5)));
    }

    #[test]
    fn should_read_raw_values() {
        let css = parse_css("a{color:black}");
        let decl = first_decl(&css);
        assert_eq!(decl.raw(Some(RawField::Between), RawKey::Colon), ":");

        let rule = Node::new_rule("b");
        rule.append(NodeProps::decl("color", "white")).unwrap();
        assert_eq!(
            rule.first().unwrap().raw(Some(RawField::Between), RawKey::Colon),
            ": "
        );
    }

    #[test]
    fn should_clean_raws() {
        let css = parse_css("a{one:1}");
        css.first().unwrap().clean_raws(false);
        assert_eq!(css.to_string(), "a {\n    one: 1\n}");
    }

    #[test]
    fn should_convert_to_json() {
        let css = parse("a{color:black!important}", &ProcessOptions::from_path("a.css")).unwrap();
        let json = css.to_json();

        assert_eq!(json["type"], "root");
        let decl = &json["nodes"][0]["nodes"][0];
        assert_eq!(decl["type"], "decl");
        assert_eq!(decl["prop"], "color");
        assert_eq!(decl["value"], "black");
        assert_eq!(decl["important"], true);
        assert_eq!(decl["raws"]["between"], ":");
        assert_eq!(decl["raws"]["important"], "!important");
        assert_eq!(decl["source"]["start"]["line"], 1);
        assert_eq!(decl["source"]["start"]["column"], 3);
        assert_eq!(decl["source"]["input"]["file"], "a.css");
    }

    #[test]
    fn should_use_input_id_in_json_for_unnamed_css() {
        let css = parse_css("a{}");
        let json = css.first().unwrap().to_json();
        assert_eq!(json["selector"], "a");
        assert_eq!(json["source"]["input"]["id"], "<input css 1>");
        assert!(json["nodes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn should_read_type_specific_fields() {
        let css = parse_css("@media print{a{}}/* note */");
        let media = css.first().unwrap();
        assert_eq!(media.node_type(), NodeType::AtRule);
        assert_eq!(media.name(), "media");
        assert_eq!(media.params(), "print");
        assert_eq!(css.last().unwrap().text(), "note");
        assert_eq!(media.first().unwrap().selectors(), vec!["a"]);
    }

    #[test]
    fn should_set_selectors_with_existing_separator() {
        let css = parse_css("a, b{}");
        let rule = css.first().unwrap();
        rule.set_selectors(&["em", "strong", "i"]);
        assert_eq!(rule.selector(), "em, strong, i");

        let rule = Node::new_rule("a");
        rule.set_selectors(&["em", "strong"]);
        assert_eq!(rule.selector(), "em, strong");
    }
}
