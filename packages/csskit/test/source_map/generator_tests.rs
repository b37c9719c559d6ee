//! Source Map Generator Tests
//!
//! VLQ digits, mapping serialization and rebasing through another map.

use csskit::source_map::{vlq, Mapping, Position, SourceMapConsumer, SourceMapGenerator, VlqError};
use csskit::Error;

fn mapping(line: usize, column: usize, source: &str, original: (usize, usize)) -> Mapping {
    Mapping::new(Position::new(line, column))
        .with_original(source, Position::new(original.0, original.1))
}

/// `out.css` built from two files, one mapping carrying a name
fn example_generator() -> SourceMapGenerator {
    let mut generator = SourceMapGenerator::new(Some("out.css".into()), None, false);
    generator.add_mapping(mapping(1, 0, "a.css", (1, 0))).unwrap();
    generator
        .add_mapping(mapping(1, 4, "a.css", (1, 4)).with_name("color"))
        .unwrap();
    generator.add_mapping(mapping(2, 0, "b.css", (3, 2))).unwrap();
    generator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_vlq_values() {
        assert_eq!(vlq::encode(-1), "D");
        assert_eq!(vlq::encode(4), "I");
        assert_eq!(vlq::encode(-2), "F");
        assert_eq!(vlq::encode(123), "2H");
        assert_eq!(vlq::decode("2H"), Ok((123, 2)));
        assert_eq!(vlq::decode("DAAA"), Ok((-1, 1)));
    }

    #[test]
    fn should_reject_broken_vlq() {
        assert_eq!(vlq::decode("!"), Err(VlqError::InvalidDigit('!')));
        assert_eq!(vlq::decode("g"), Err(VlqError::UnexpectedEnd));
        assert_eq!(vlq::encode_digit(64), Err(VlqError::DigitOutOfRange(64)));
        assert_eq!(vlq::encode_digit(63), Ok('/'));
    }

    #[test]
    fn should_serialize_mappings() {
        let generator = example_generator();
        assert_eq!(generator.serialize_mappings(), "AAAA,IAAIA;ACEF");
        assert_eq!(
            generator.to_string(),
            r#"{"version":3,"sources":["a.css","b.css"],"names":["color"],"mappings":"AAAA,IAAIA;ACEF","file":"out.css"}"#
        );
    }

    #[test]
    fn should_sort_mappings_added_out_of_order() {
        let mut generator = SourceMapGenerator::new(Some("out.css".into()), None, false);
        generator.add_mapping(mapping(2, 0, "b.css", (3, 2))).unwrap();
        generator
            .add_mapping(mapping(1, 4, "a.css", (1, 4)).with_name("color"))
            .unwrap();
        generator.add_mapping(mapping(1, 0, "a.css", (1, 0))).unwrap();

        let columns: Vec<(usize, usize)> = generator
            .mappings()
            .to_array()
            .iter()
            .map(|m| (m.generated.line, m.generated.column))
            .collect();
        assert_eq!(columns, vec![(1, 0), (1, 4), (2, 0)]);
        assert_eq!(generator.mappings().len(), 3);
    }

    #[test]
    fn should_write_generated_only_mappings() {
        let mut generator = SourceMapGenerator::default();
        generator
            .add_mapping(Mapping::new(Position::new(1, 3)))
            .unwrap();
        generator.add_mapping(mapping(1, 5, "a.css", (2, 0))).unwrap();
        assert_eq!(generator.serialize_mappings(), "G,EACA");
    }

    #[test]
    fn should_skip_validation_when_asked() {
        let mut generator = SourceMapGenerator::new(None, None, true);
        assert!(generator
            .add_mapping(Mapping::new(Position::new(0, 0)))
            .is_ok());

        let mut generator = SourceMapGenerator::default();
        let error = generator
            .add_mapping(Mapping::new(Position::new(1, 0)).with_name("x"))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidMapping(_)));
    }

    #[test]
    fn should_embed_sources_content() {
        let mut generator = example_generator();
        generator.set_source_content("a.css", Some("a{}".into()));
        let raw = generator.to_raw();
        assert_eq!(raw.sources_content, Some(vec![Some("a{}".to_string()), None]));
        assert!(generator.to_string().ends_with(r#""sourcesContent":["a{}",null]}"#));
    }

    #[test]
    fn should_copy_map_from_consumer() {
        let json = r#"{"version":3,"sources":["a.css"],"names":[],"mappings":"AAAA;AAEA","file":"out.css","sourcesContent":["a{}"]}"#;
        let consumer = SourceMapConsumer::from_json(json).unwrap();
        let generator = SourceMapGenerator::from_consumer(&consumer).unwrap();
        assert_eq!(generator.to_string(), json);
    }

    #[test]
    fn should_apply_previous_map() {
        let mut first = SourceMapGenerator::new(Some("b.css".into()), None, false);
        first.add_mapping(mapping(1, 0, "a.css", (2, 4))).unwrap();
        first.set_source_content("a.css", Some("x".into()));
        let consumer = SourceMapConsumer::from_generator(&first);

        let mut second = SourceMapGenerator::new(Some("c.css".into()), None, false);
        second.add_mapping(mapping(1, 0, "b.css", (1, 0))).unwrap();
        second.add_mapping(mapping(1, 5, "b.css", (1, 3))).unwrap();
        second.apply_source_map(&consumer, None, None).unwrap();

        assert_eq!(second.sources().collect::<Vec<_>>(), vec!["a.css"]);
        assert_eq!(second.serialize_mappings(), "AACI,KAAA");
        assert_eq!(second.to_raw().sources_content, Some(vec![Some("x".to_string())]));
    }

    #[test]
    fn should_join_map_path_onto_rebased_sources() {
        let mut first = SourceMapGenerator::new(Some("b.css".into()), None, false);
        first.add_mapping(mapping(1, 0, "a.css", (1, 0))).unwrap();
        let consumer = SourceMapConsumer::from_generator(&first);

        let mut second = SourceMapGenerator::new(Some("c.css".into()), None, false);
        second.add_mapping(mapping(1, 0, "b.css", (1, 0))).unwrap();
        second
            .apply_source_map(&consumer, Some("b.css"), Some("maps"))
            .unwrap();

        assert_eq!(second.sources().collect::<Vec<_>>(), vec!["maps/a.css"]);
    }

    #[test]
    fn should_need_source_file_to_apply_map() {
        let first = SourceMapGenerator::default();
        let consumer = SourceMapConsumer::from_generator(&first);
        let mut second = SourceMapGenerator::default();

        let error = second.apply_source_map(&consumer, None, None).unwrap_err();
        assert!(matches!(error, Error::MissingSourceFile));
    }
}
