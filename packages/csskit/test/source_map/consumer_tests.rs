//! Source Map Consumer Tests
//!
//! Position lookups in both directions, sources and their content, and
//! indexed maps.

use csskit::source_map::{
    Bias, GeneratedPosition, Order, OriginalPosition, SourceMapConsumer, SourceMapGenerator,
};
use csskit::Error;

const EXAMPLE_MAP: &str = r#"{
  "version": 3,
  "file": "out.css",
  "sources": ["a.css", "b.css"],
  "names": ["color"],
  "mappings": "AAAA,IAAIA;ACEF",
  "sourcesContent": ["a{}", null]
}"#;

const INDEXED_MAP: &str = r#"{
  "version": 3,
  "file": "out.css",
  "sections": [
    {
      "offset": { "line": 0, "column": 0 },
      "map": { "version": 3, "sources": ["a.css"], "names": [], "mappings": "AAAA" }
    },
    {
      "offset": { "line": 1, "column": 4 },
      "map": { "version": 3, "sources": ["b.css"], "names": [], "mappings": "AACA" }
    }
  ]
}"#;

fn original(source: &str, line: usize, column: usize, name: Option<&str>) -> OriginalPosition {
    OriginalPosition {
        source: source.into(),
        line,
        column,
        name: name.map(str::to_owned),
    }
}

fn generated(line: usize, column: usize) -> GeneratedPosition {
    GeneratedPosition { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_original_positions() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();

        assert_eq!(
            consumer.original_position_for(1, 0, Bias::GreatestLowerBound).unwrap(),
            Some(original("a.css", 1, 0, None))
        );
        assert_eq!(
            consumer.original_position_for(1, 4, Bias::GreatestLowerBound).unwrap(),
            Some(original("a.css", 1, 4, Some("color")))
        );
        assert_eq!(
            consumer.original_position_for(1, 2, Bias::GreatestLowerBound).unwrap(),
            Some(original("a.css", 1, 0, None))
        );
        assert_eq!(
            consumer.original_position_for(1, 2, Bias::LeastUpperBound).unwrap(),
            Some(original("a.css", 1, 4, Some("color")))
        );
        assert_eq!(
            consumer.original_position_for(2, 7, Bias::GreatestLowerBound).unwrap(),
            Some(original("b.css", 3, 2, None))
        );
    }

    #[test]
    fn should_not_cross_generated_lines() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();
        assert_eq!(
            consumer.original_position_for(1, 10, Bias::LeastUpperBound).unwrap(),
            None
        );
        assert_eq!(
            consumer.original_position_for(3, 0, Bias::GreatestLowerBound).unwrap(),
            None
        );
    }

    #[test]
    fn should_find_generated_positions() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();

        assert_eq!(
            consumer
                .generated_position_for("b.css", 3, 2, Bias::GreatestLowerBound)
                .unwrap(),
            Some(generated(2, 0))
        );
        assert_eq!(
            consumer
                .generated_position_for("a.css", 1, 4, Bias::GreatestLowerBound)
                .unwrap(),
            Some(generated(1, 4))
        );
        assert_eq!(
            consumer
                .generated_position_for("missing.css", 1, 0, Bias::GreatestLowerBound)
                .unwrap(),
            None
        );
    }

    #[test]
    fn should_find_all_generated_positions() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();

        assert_eq!(
            consumer.all_generated_positions_for("a.css", 1, None).unwrap(),
            vec![generated(1, 0), generated(1, 4)]
        );
        assert_eq!(
            consumer.all_generated_positions_for("a.css", 1, Some(4)).unwrap(),
            vec![generated(1, 4)]
        );
        assert!(consumer
            .all_generated_positions_for("c.css", 1, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn should_list_sources_and_content() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();

        assert_eq!(consumer.file(), Some("out.css"));
        assert_eq!(consumer.sources().unwrap(), vec!["a.css", "b.css"]);
        assert_eq!(consumer.source_content_for("a.css").unwrap(), Some("a{}"));
        assert_eq!(consumer.source_content_for("b.css").unwrap(), None);
        assert!(!consumer.has_contents_of_all_sources().unwrap());

        let stripped = consumer.without_content();
        assert_eq!(stripped.source_content_for("a.css").unwrap(), None);
    }

    #[test]
    fn should_iterate_mappings_in_both_orders() {
        let consumer = SourceMapConsumer::from_json(EXAMPLE_MAP).unwrap();

        let mut generated_order = Vec::new();
        consumer
            .each_mapping(Order::Generated, |mapping| {
                generated_order.push((mapping.generated.line, mapping.generated.column));
                Ok(())
            })
            .unwrap();
        assert_eq!(generated_order, vec![(1, 0), (1, 4), (2, 0)]);

        let mut sources = Vec::new();
        consumer
            .each_mapping(Order::Original, |mapping| {
                sources.push(mapping.source.clone().unwrap_or_default());
                Ok(())
            })
            .unwrap();
        assert_eq!(sources, vec!["a.css", "a.css", "b.css"]);
    }

    #[test]
    fn should_join_sources_onto_source_root() {
        let json = r#"{"version":3,"sourceRoot":"http://x.org/app/","sources":["a.css"],"names":[],"mappings":"AAAA","sourcesContent":["a{}"]}"#;
        let consumer = SourceMapConsumer::from_json(json).unwrap();

        assert_eq!(consumer.sources().unwrap(), vec!["http://x.org/app/a.css"]);
        assert_eq!(
            consumer
                .source_content_for("http://x.org/app/a.css")
                .unwrap(),
            Some("a{}")
        );
        assert!(consumer.has_contents_of_all_sources().unwrap());
    }

    #[test]
    fn should_strip_xssi_prefix() {
        let json = format!(")]}}'{}", EXAMPLE_MAP);
        let consumer = SourceMapConsumer::from_json(&json).unwrap();
        assert_eq!(consumer.sources().unwrap().len(), 2);
    }

    #[test]
    fn should_reject_invalid_maps() {
        let error = SourceMapConsumer::from_json(
            r#"{"version":2,"sources":[],"names":[],"mappings":""}"#,
        )
        .err()
        .unwrap();
        assert_eq!(error.to_string(), "Invalid source map: Unsupported version: 2");

        let error = SourceMapConsumer::from_json(
            r#"{"version":3,"sources":["a.css"],"names":[],"mappings":"A!AA"}"#,
        )
        .err()
        .unwrap();
        assert!(matches!(error, Error::Vlq(_)));

        assert!(matches!(
            SourceMapConsumer::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn should_read_generator_directly() {
        let json = r#"{"version":3,"sources":["a.css","b.css"],"names":["color"],"mappings":"AAAA,IAAIA;ACEF","file":"out.css"}"#;
        let parsed = SourceMapConsumer::from_json(json).unwrap();
        let generator = SourceMapGenerator::from_consumer(&parsed).unwrap();
        let consumer = SourceMapConsumer::from_generator(&generator);

        assert_eq!(
            consumer.original_position_for(1, 5, Bias::GreatestLowerBound).unwrap(),
            Some(original("a.css", 1, 4, Some("color")))
        );
        assert_eq!(
            consumer
                .generated_position_for("b.css", 3, 2, Bias::GreatestLowerBound)
                .unwrap(),
            Some(generated(2, 0))
        );
    }

    #[test]
    fn should_look_up_positions_in_sections() {
        let consumer = SourceMapConsumer::from_json(INDEXED_MAP).unwrap();

        assert_eq!(consumer.file(), Some("out.css"));
        assert_eq!(consumer.sources().unwrap(), vec!["a.css", "b.css"]);
        assert_eq!(
            consumer.original_position_for(1, 1, Bias::GreatestLowerBound).unwrap(),
            Some(original("a.css", 1, 0, None))
        );
        assert_eq!(
            consumer.original_position_for(2, 6, Bias::GreatestLowerBound).unwrap(),
            Some(original("b.css", 2, 0, None))
        );
    }

    #[test]
    fn should_refuse_reverse_lookups_in_indexed_maps() {
        let consumer = SourceMapConsumer::from_json(INDEXED_MAP).unwrap();
        let error = consumer
            .generated_position_for("a.css", 1, 0, Bias::GreatestLowerBound)
            .unwrap_err();

        assert!(matches!(error, Error::UnsupportedIndexedMap(_)));
        assert_eq!(
            error.to_string(),
            "Indexed source maps do not support generated_position_for"
        );
    }

    #[test]
    fn should_reject_sections_with_url() {
        let json = r#"{"version":3,"sections":[{"offset":{"line":0,"column":0},"url":"a.map"}]}"#;
        let error = SourceMapConsumer::from_json(json).err().unwrap();
        assert!(error
            .to_string()
            .contains("Support for url field in sections not implemented."));
    }
}
