//! Container Tests
//!
//! Iteration under mutation, walkers, insertion with formatting copied
//! from siblings, and value replacement.

use csskit::node::ReplaceOptions;
use csskit::{parse, Node, NodeProps, NodeType, ProcessOptions, Walk};
use regex::Regex;

fn parse_css(css: &str) -> Node {
    parse(css, &ProcessOptions::default()).unwrap()
}

fn props(container: &Node) -> Vec<String> {
    container.nodes().iter().map(Node::prop).collect()
}

const EXAMPLE: &str = "a { a: 1; b: 2 }\
/* a */\
@keyframes anim {\
/* b */\
to { c: 3 }\
}\
@media all and (max-width: 100px) {\
em { color: black }\
}\
@page {}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_iterate_children_with_index() {
        let css = parse_css("a{one:1;two:2}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        let result = rule.each(|decl, index| {
            seen.push((decl.prop(), index));
        });

        assert_eq!(result, Walk::Continue);
        assert_eq!(seen, vec![("one".to_string(), 0), ("two".to_string(), 1)]);
    }

    #[test]
    fn should_stop_iteration() {
        let css = parse_css("a{one:1;two:2}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        let result = rule.each(|decl, _| {
            seen.push(decl.prop());
            Walk::Stop
        });

        assert_eq!(result, Walk::Stop);
        assert_eq!(seen, vec!["one"]);
    }

    #[test]
    fn should_allow_removing_current_child() {
        let css = parse_css("a{a:1;b:2;c:3}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        rule.each(|decl, _| {
            seen.push(decl.prop());
            decl.remove();
        });

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert!(rule.is_empty());
    }

    #[test]
    fn should_skip_nodes_inserted_before_cursor() {
        let css = parse_css("a{a:1;b:2;c:3}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        rule.each(|decl, _| {
            seen.push(decl.prop());
            if decl.prop() == "b" {
                rule.insert_before(decl, NodeProps::decl("x", "0")).unwrap();
            }
        });

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(props(&rule), vec!["a", "x", "b", "c"]);
    }

    #[test]
    fn should_visit_nodes_inserted_after_cursor() {
        let css = parse_css("a{a:1;b:2;c:3}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        rule.each(|decl, _| {
            seen.push(decl.prop());
            if decl.prop() == "b" {
                rule.insert_after(decl, NodeProps::decl("x", "0")).unwrap();
            }
        });

        assert_eq!(seen, vec!["a", "b", "x", "c"]);
    }

    #[test]
    fn should_keep_position_when_prepending() {
        let css = parse_css("a{a:1;b:2}");
        let rule = css.first().unwrap();
        let mut seen = Vec::new();
        rule.each(|decl, _| {
            seen.push(decl.prop());
            if decl.prop() == "a" {
                rule.prepend(NodeProps::decl("x", "0")).unwrap();
            }
        });

        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(props(&rule), vec!["x", "a", "b"]);
    }

    #[test]
    fn should_walk_all_descendants() {
        let css = parse_css(EXAMPLE);
        let mut types = Vec::new();
        css.walk(|node, _| {
            types.push(node.node_type());
        });

        assert_eq!(
            types,
            vec![
                NodeType::Rule,
                NodeType::Declaration,
                NodeType::Declaration,
                NodeType::Comment,
                NodeType::AtRule,
                NodeType::Comment,
                NodeType::Rule,
                NodeType::Declaration,
                NodeType::AtRule,
                NodeType::Rule,
                NodeType::Declaration,
                NodeType::AtRule,
            ]
        );
    }

    #[test]
    fn should_stop_walk() {
        let css = parse_css(EXAMPLE);
        let mut count = 0;
        let result = css.walk(|node, _| {
            count += 1;
            node.node_type() != NodeType::Comment
        });

        assert_eq!(result, Walk::Stop);
        assert_eq!(count, 4);
    }

    #[test]
    fn should_walk_declarations_by_property() {
        let css = parse_css(EXAMPLE);
        let mut all = Vec::new();
        css.walk_decls(|decl, _| all.push(decl.prop()));
        assert_eq!(all, vec!["a", "b", "c", "color"]);

        let mut exact = Vec::new();
        css.walk_decls_by("color", |decl, _| exact.push(decl.value()));
        assert_eq!(exact, vec!["black"]);

        let mut pattern = Vec::new();
        css.walk_decls_by("/^[ab]$/", |decl, _| pattern.push(decl.prop()));
        assert_eq!(pattern, vec!["a", "b"]);

        let mut regex = Vec::new();
        css.walk_decls_by(Regex::new("^c").unwrap(), |decl, _| {
            regex.push(decl.prop())
        });
        assert_eq!(regex, vec!["c", "color"]);
    }

    #[test]
    fn should_walk_rules_at_rules_and_comments() {
        let css = parse_css(EXAMPLE);

        let mut selectors = Vec::new();
        css.walk_rules(|rule, _| selectors.push(rule.selector()));
        assert_eq!(selectors, vec!["a", "to", "em"]);

        let mut names = Vec::new();
        css.walk_at_rules(|at_rule, _| names.push(at_rule.name()));
        assert_eq!(names, vec!["keyframes", "media", "page"]);

        let mut params = Vec::new();
        css.walk_at_rules_by("media", |at_rule, _| params.push(at_rule.params()));
        assert_eq!(params, vec!["all and (max-width: 100px)"]);

        let mut texts = Vec::new();
        css.walk_comments(|comment, _| texts.push(comment.text()));
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn should_append_css_text() {
        let css = parse_css("a{a:1}");
        let rule = css.first().unwrap();
        rule.append("b:2").unwrap();

        assert_eq!(css.to_string(), "a{a:1;b:2}");
        assert!(rule.last().unwrap().source().is_none());
    }

    #[test]
    fn should_copy_before_of_last_root_node() {
        let css = parse_css("a{}\nb{}");
        css.append(NodeProps::rule("c")).unwrap();
        assert_eq!(css.to_string(), "a{}\nb{}\nc{}");
    }

    #[test]
    fn should_prepend_to_root() {
        let css = parse_css("a {}\nb {}");
        css.prepend(NodeProps::rule("em")).unwrap();
        assert_eq!(css.to_string(), "em {}\na {}\nb {}");
    }

    #[test]
    fn should_clone_nodes_of_other_trees() {
        let css = parse_css("a{}");
        let other = parse_css("b{}");
        css.append(&other).unwrap();

        assert_eq!(other.len(), 1);
        assert_eq!(css.len(), 2);
        assert_eq!(css.last().unwrap().parent().as_ref(), Some(&css));

        let decl = Node::new_decl("color", "black");
        let first = Node::new_rule("a");
        first.push(decl.clone());
        let second = Node::new_rule("b");
        second.append(&decl).unwrap();
        assert_eq!(first.len(), 1);
        assert_ne!(second.first().as_ref(), Some(&decl));
    }

    #[test]
    fn should_move_node_on_push() {
        let decl = Node::new_decl("color", "black");
        let first = Node::new_rule("a");
        first.push(decl.clone());
        let second = Node::new_rule("b");
        second.push(decl.clone());

        assert!(first.is_empty());
        assert_eq!(decl.parent().as_ref(), Some(&second));
    }

    #[test]
    fn should_insert_around_index() {
        let css = parse_css("a{a:1;c:3}");
        let rule = css.first().unwrap();
        rule.insert_before(1usize, NodeProps::decl("b", "2")).unwrap();
        rule.insert_after(2usize, NodeProps::decl("d", "4")).unwrap();

        assert_eq!(css.to_string(), "a{a:1;b:2;c:3;d:4}");
    }

    #[test]
    fn should_find_index_of_child() {
        let css = parse_css("a{one:1;two:2}");
        let rule = css.first().unwrap();
        let two = rule.last().unwrap();

        assert_eq!(rule.index(&two), Some(1));
        assert_eq!(rule.index(1usize), Some(1));
        assert_eq!(rule.index(2usize), None);
        assert_eq!(rule.index(&Node::new_decl("a", "1")), None);
    }

    #[test]
    fn should_remove_children() {
        let css = parse_css("a{one:1;two:2;three:3}");
        let rule = css.first().unwrap();
        let one = rule.first().unwrap();

        rule.remove_child(&one);
        assert!(one.parent().is_none());
        rule.remove_child(1usize);
        assert_eq!(css.to_string(), "a{two:2}");

        rule.remove_all();
        assert!(rule.is_empty());
        assert!(rule.is_container());
    }

    #[test]
    fn should_keep_root_spacing_when_removing_first_node() {
        let css = parse_css("a{}\n\nb{}");
        css.remove_child(0usize);
        assert_eq!(css.to_string(), "b{}");
    }

    #[test]
    fn should_check_every_and_some() {
        let css = parse_css("a{one:1;two:2}");
        let rule = css.first().unwrap();

        assert!(rule.every(|node| node.node_type() == NodeType::Declaration));
        assert!(!rule.every(|node| node.prop() == "one"));
        assert!(rule.some(|node| node.prop() == "two"));
        assert!(!rule.some(|node| node.prop() == "three"));
    }

    #[test]
    fn should_replace_values() {
        let css = parse_css("a{one:1px;two:1px 2px}");
        css.replace_values(Regex::new(r"(\d+)px").unwrap(), &ReplaceOptions::default(), "${1}em");
        assert_eq!(css.to_string(), "a{one:1em;two:1em 2em}");

        let css = parse_css("a{one:1px;two:1px 2px}");
        css.replace_values("1px", &ReplaceOptions::default(), "3px");
        assert_eq!(css.to_string(), "a{one:3px;two:3px 2px}");
    }

    #[test]
    fn should_restrict_replacement_by_props_and_fast_check() {
        let css = parse_css("a{one:1px;two:1px 2px}");
        let options = ReplaceOptions {
            props: vec!["one".into()],
            fast: None,
        };
        css.replace_values("1px", &options, "0");
        assert_eq!(css.to_string(), "a{one:0;two:1px 2px}");

        let css = parse_css("a{one:1px;two:1px 2px}");
        let options = ReplaceOptions {
            props: Vec::new(),
            fast: Some("2px".into()),
        };
        css.replace_values("1px", &options, "0");
        assert_eq!(css.to_string(), "a{one:1px;two:0 2px}");
    }

    #[test]
    fn should_replace_values_with_callback() {
        let css = parse_css("a{one:abc;two:b}");
        css.replace_values_with("b", &ReplaceOptions::default(), |matched| {
            matched.to_uppercase()
        });
        assert_eq!(css.to_string(), "a{one:aBc;two:B}");
    }

    #[test]
    fn should_create_nodes_from_props() {
        let rule = Node::new_rule("a");
        rule.append(NodeProps::decl("color", "black")).unwrap();
        rule.append(NodeProps::comment("note")).unwrap();
        rule.append(NodeProps::at_rule("media", "print")).unwrap();

        let types: Vec<NodeType> = rule.nodes().iter().map(Node::node_type).collect();
        assert_eq!(
            types,
            vec![NodeType::Declaration, NodeType::Comment, NodeType::AtRule]
        );
    }

    #[test]
    fn should_reject_incomplete_props() {
        let rule = Node::new_rule("a");
        let error = rule
            .append(NodeProps {
                prop: Some("color".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(error.to_string(), "Value field is missed in node creation");

        let error = rule.append(NodeProps::default()).unwrap_err();
        assert_eq!(error.to_string(), "Unknown node type in node creation");
        assert!(rule.is_empty());
    }
}
