use property_aggregator::normalizer::{parse_amount, parse_count, parse_flag, slugify};

#[test]
fn test_slugify_is_deterministic() {
    assert_eq!(slugify("La Finca Golf"), "la-finca-golf");
    assert_eq!(slugify("  La-Finca   Golf!!"), "la-finca-golf");
    assert_eq!(slugify("La Finca Golf"), slugify("La Finca Golf"));
}

#[test]
fn test_slugify_folds_spanish_diacritics() {
    assert_eq!(slugify("Doña Pepa"), "dona-pepa");
    assert_eq!(slugify("Los Alcázares"), "los-alcazares");
    assert_eq!(slugify("Jávea"), "javea");
    assert_eq!(slugify("ÁTICO EN MÁLAGA"), "atico-en-malaga");
}

#[test]
fn test_slugify_trims_and_collapses() {
    assert_eq!(slugify("---hello---world---"), "hello-world");
    assert_eq!(slugify(""), "");
    assert_eq!(slugify("!!!"), "");
    assert_eq!(slugify("GRECIA II"), "grecia-ii");
}

#[test]
fn test_distinct_names_produce_distinct_slugs() {
    assert_ne!(slugify("Mirasal 2"), slugify("Mirasal 3"));
    assert_ne!(slugify("Gomera Star"), slugify("Gomera Sun"));
}

#[test]
fn test_parse_amount_degrades_to_zero() {
    assert_eq!(parse_amount("250000"), 250_000);
    assert_eq!(parse_amount(" 250000 "), 250_000);
    assert_eq!(parse_amount("189500.50"), 189_501);
    assert_eq!(parse_amount(""), 0);
    assert_eq!(parse_amount("POA"), 0);
    assert_eq!(parse_amount("-5"), 0);
}

#[test]
fn test_parse_count() {
    assert_eq!(parse_count("3"), 3);
    assert_eq!(parse_count("not a number"), 0);
    assert_eq!(parse_count(""), 0);
}

#[test]
fn test_parse_flag_variants() {
    assert!(parse_flag("1"));
    assert!(parse_flag("yes"));
    assert!(parse_flag("YES"));
    assert!(parse_flag("true"));
    assert!(!parse_flag("0"));
    assert!(!parse_flag("no"));
    assert!(!parse_flag(""));
}
