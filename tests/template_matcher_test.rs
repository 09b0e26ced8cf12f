use nlsparql::config::TemplateConfig;
use nlsparql::dataset::{Entry, TemplateId};
use nlsparql::templates::extraction::derive_templates;
use nlsparql::templates::matcher::extract_slots;
use nlsparql::templates::{assign_templates, match_template, CompiledTemplate, Template, TemplateField, TemplateLibrary};
use nlsparql::Error;
use serde_json::json;

fn library() -> TemplateLibrary {
    let templates: Vec<Template> = serde_json::from_value(json!([
        {
            "_id": "country",
            "question_template": "in which country is <a> ?",
            "interm_sparql_template": "select var_x where brack_open <a> dbo_country var_x brack_close",
            "pure_sparql_template": "select ?x where { <a> dbo:country ?x }"
        },
        {
            "_id": "location",
            "question_template": "where is <a> located ?",
            "interm_sparql_template": "select var_x where brack_open <a> dbo_location var_x brack_close",
            "pure_sparql_template": "select ?x where { <a> dbo:location ?x }",
            "uri_interm_sparql_template": "select var_x where brack_open <a> dbo:location var_x brack_close"
        }
    ]))
    .unwrap();
    TemplateLibrary::new(templates).unwrap()
}

fn entry(id: &str, question: &str, interm: &str) -> Entry {
    let mut entry = Entry::new(id);
    entry.question.question = Some(question.to_string());
    entry.query.interm_sparql = Some(interm.to_string());
    entry
}

#[test]
fn test_library_from_json() {
    let library = library();
    assert_eq!(library.len(), 2);
    let template = library.get_by_id(&TemplateId::from("location")).unwrap();
    assert!(!template.template().question_regex.is_empty());
    assert!(matches!(library.get_by_id(&TemplateId::from("nope")), Err(Error::NotFound(_))));
}

#[test]
fn test_match_and_extract() {
    let library = library();
    let e = entry(
        "1",
        "where is dbr_Louvre located ?",
        "select var_x where brack_open dbr_Louvre dbo_location var_x brack_close",
    );
    let template = match_template(&library, &e).unwrap();
    assert_eq!(template.id(), &TemplateId::from("location"));

    let slots = extract_slots(template, "1", "SELECT ?x WHERE { dbr:Louvre dbo:location ?x }").unwrap();
    assert_eq!(slots, vec!["dbr:Louvre"]);

    let uri = template.instantiate(TemplateField::UriIntermSparql, &slots).unwrap();
    assert_eq!(uri, "select var_x where brack_open dbr:Louvre dbo:location var_x brack_close");
}

#[test]
fn test_instantiate_checks_slot_count() {
    let library = library();
    let template = library.get_by_id(&TemplateId::from("country")).unwrap();
    let err = template.instantiate(TemplateField::PureSparql, &["dbr:A", "dbr:B"]).unwrap_err();
    assert!(matches!(err, Error::SlotCountMismatch { expected: 1, found: 2, .. }));
}

#[test]
fn test_assign_templates_keeps_failed_entries() {
    let library = library();
    let mut entries = vec![
        entry("1", "in which country is dbr_Lyon ?", "select var_x where brack_open dbr_Lyon dbo_country var_x brack_close"),
        entry("2", "who wrote dbr_Dune ?", "select var_x where brack_open dbr_Dune dbo_author var_x brack_close"),
    ];
    let report = assign_templates(&library, &mut entries);

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed_ids(), vec!["2"]);
    assert_eq!(entries[0].template_id, Some(TemplateId::from("country")));
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_derived_template_extracts_slots() {
    let mut source = Entry::new("1");
    source.question.question = Some("in which country is lyon ?".to_string());
    source.query.interm_sparql = Some("select var_x where brack_open dbr_Lyon dbo_country var_x brack_close".to_string());
    source.query.pure_sparql = Some("select ?x where { dbr:Lyon dbo:country ?x }".to_string());

    let templates = derive_templates(&[source], &TemplateConfig::default().keep_predicates);
    let compiled = CompiledTemplate::new(templates[0].clone()).unwrap();
    assert_eq!(
        compiled.extract_slots("select ?x where { dbr:Nice dbo:country ?x }"),
        Some(vec!["dbr:Nice".to_string(), "dbo:country".to_string()])
    );
}

#[test]
fn test_instantiated_slots_extract_back() {
    let compiled = CompiledTemplate::new(Template {
        id: TemplateId::from("pair"),
        pure_sparql_template: "ask where { <a> dbo:country <b> }".to_string(),
        ..Template::default()
    })
    .unwrap();

    let cases = [
        ["dbr:Paris", "dbr:France"],
        ["dbr:Paris_(Texas)", "dbr:United_States"],
        ["$1", "x+y"],
        ["a.b*c", "[0-9]"],
        ["dbr:AT&T", "{x}"],
        ["?y", "\\d"],
    ];

    for values in cases {
        let query = compiled.instantiate(TemplateField::PureSparql, &values).unwrap();
        assert_eq!(compiled.extract_slots(&query).unwrap(), values.to_vec(), "{}", query);
    }
}
