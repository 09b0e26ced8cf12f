use nlsparql::core::TagFlags;
use nlsparql::parsing::query_normalizer::QueryNormalizer;
use nlsparql::parsing::question_normalizer::QuestionNormalizer;
use nlsparql::Error;

fn normalizer() -> QueryNormalizer {
    QueryNormalizer::new().unwrap()
}

#[test]
fn test_pure_interm_round_trip() {
    let n = normalizer();
    let pure = "select ?x where { ?x dbo:author dbr:Victor_Hugo . }";
    let interm = n.to_interm(pure, false, TagFlags::none());
    assert_eq!(interm, "select var_x where brack_open var_x dbo_author dbr_Victor_Hugo sep_dot brack_close");
    assert_eq!(n.to_pure_sparql(&interm).unwrap(), pure);

    let tagged = n.to_interm(pure, true, TagFlags::all());
    assert_eq!(n.to_pure_sparql(&tagged).unwrap(), pure);
}

#[test]
fn test_round_trip_across_query_shapes() {
    let n = normalizer();
    let queries = [
        "select ?x where { ?x dbo:author dbr:J._K._Rowling . }",
        "select ?n where { dbr:Paris <http://xmlns.com/foaf/0.1/name> ?n }",
        "select ?x where { ?x dbo:height ?h . filter ( ?h >= 2 ) }",
        "select count ( ?uri ) where { ?uri dbo:author dbr:Victor_Hugo }",
        "select ?x where { ?x dbo:height ?h } order by desc ( ?h ) limit 1",
        "select ?x where { ?x dbp:name ?n . filter regex ( ?n , 'paris' ) }",
        "select ?x where { dbr:Paris_(Texas) dbo:mayor ?x }",
        "ask where { dbr:Washington,_D.C. dbo:country dbr:United_States }",
        "select ?x where { dbr:AT&T dbo:keyPerson ?x }",
        "select ?x where { ?x rdf:type dbo:Film . ?x dct:subject dbc:French_films }",
    ];

    for pure in queries {
        let interm = n.to_interm(pure, true, TagFlags::all());
        assert_eq!(n.to_pure_sparql(&interm).unwrap(), pure, "via {}", interm);
    }
}

#[test]
fn test_each_flag_only_touches_its_class() {
    let n = normalizer();
    let pure = "select ?x where { dbr:Paris dbo:country ?x . ?x dbp:genre dbc:French_novels }";

    for bits in 0..16u8 {
        let flags = TagFlags {
            resource: bits & 1 != 0,
            property: bits & 2 != 0,
            category: bits & 4 != 0,
            ontology: bits & 8 != 0,
        };
        let pick = |on: bool, literal: &'static str, opaque: &'static str| if on { literal } else { opaque };
        let expected = format!(
            "select var_x where brack_open {} {} var_x sep_dot var_x {} {} brack_close",
            pick(flags.resource, "dbr:Paris", "dbr_Paris"),
            pick(flags.ontology, "dbo:country", "dbo_country"),
            pick(flags.property, "dbp:genre", "dbp_genre"),
            pick(flags.category, "dbc:French_novels", "dbc_French_novels"),
        );
        assert_eq!(n.to_interm(pure, true, flags), expected, "{:?}", flags);
    }
}

#[test]
fn test_resource_flag_leaves_other_classes_alone() {
    let n = normalizer();
    let pure = "select ?x where { ?x dbp:genre dbc:French_novels . ?x dbo:author dbr:Victor_Hugo }";
    let only_resources = n.to_interm(pure, true, TagFlags::only_resources());
    let none = n.to_interm(pure, true, TagFlags::none());
    assert_eq!(only_resources.replace("dbr:Victor_Hugo", "dbr_Victor_Hugo"), none);
}

#[test]
fn test_uppercase_keywords_are_lowered() {
    let interm = normalizer().to_interm("SELECT DISTINCT ?Uri WHERE { ?Uri dbo:author dbr:Victor_Hugo }", false, TagFlags::none());
    assert_eq!(interm, "select distinct var_uri where brack_open var_uri dbo_author dbr_Victor_Hugo brack_close");
}

#[test]
fn test_full_iris_are_shortened() {
    let interm = normalizer().to_interm(
        "select ?uri where { ?uri <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://dbpedia.org/ontology/Film> }",
        true,
        TagFlags::only_resources(),
    );
    assert_eq!(interm, "select var_uri where brack_open var_uri rdf_type dbo_Film brack_close");
}

#[test]
fn test_corrected_query_converts_to_pure() {
    let n = normalizer();
    let corrected = n.correct_query("select var_a where brack_open dbr_Stephen_Hawking. dbo_spouse var_a brack_close");
    let pure = n.to_pure_sparql(&corrected).unwrap();
    assert_eq!(pure, "select ?a where { dbr:Stephen_Hawking . dbo:spouse ?a }");
}

#[test]
fn test_two_order_by_markers_rejected() {
    let err = normalizer()
        .escape_for_remote_query("select ?x where { ?x dbo:a ?h } _oba_ ?h _obd_ ?x")
        .unwrap_err();
    assert!(matches!(err, Error::MalformedQuery(_)));
}

#[test]
fn test_question_correction() {
    let questions = QuestionNormalizer::new().unwrap();
    assert_eq!(questions.correct("Who is the mayor of Paris? Thanks"), "who is the mayor of paris ?");
    assert_eq!(questions.correct(""), "");
}
