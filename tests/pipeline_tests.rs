//! End-to-end tests for the schema build pipeline
//!
//! Builds schemas from the catalogs under `tests/fixtures` and from fluent
//! and type-configuration calls, then checks the finished schema.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use schema_forge::config::BuildConfig;
use schema_forge::schema::analysis::RelationshipGraph;
use schema_forge::schema::compare;
use schema_forge::{
    Cardinality, Checksum, CollectingSink, DiagnosticCode, NameChain, NamedKind, NamingConvention,
    NamingConventions, ObjectDecl, ScalarKind, Schema, SchemaBuilder, SchemaError, SourceCatalog,
    TypeConfiguration, TypeExpr,
};

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn blog_catalog() -> SourceCatalog {
    SourceCatalog::from_json_str(include_str!("fixtures/blog.json")).unwrap()
}

fn person_catalog() -> SourceCatalog {
    SourceCatalog::from_json_str(include_str!("fixtures/person.json")).unwrap()
}

fn kebab() -> NamingConventions {
    NamingConventions::new()
        .with_types(NameChain::new().then(NamingConvention::KebabCase))
        .with_properties(NameChain::new().then(NamingConvention::KebabCase))
}

fn build_blog() -> Schema {
    let mut builder = SchemaBuilder::new("blog").with_catalog(blog_catalog());
    builder.object("Article");
    builder.build().unwrap()
}

fn names<'a>(items: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    items.map(String::as_str).collect()
}

// =============================================================================
// Authoring styles
// =============================================================================

/// The person catalog with every annotation stripped
fn plain_person_catalog() -> SourceCatalog {
    let mut catalog = person_catalog();
    for object in &mut catalog.objects {
        for member in &mut object.members {
            member.annotations = Default::default();
        }
    }
    catalog
}

fn configure_person(builder: &mut SchemaBuilder) {
    builder.object("Person").identity("Id");
    builder
        .object("Person")
        .property("FirstName", ScalarKind::String)
        .required(true);
    builder
        .object("Person")
        .property("LastName", ScalarKind::String)
        .required(true);
    builder
        .object("Person")
        .property("PhoneNumbers", TypeExpr::list(TypeExpr::named("PhoneNumber")))
        .relationship();
    builder.object("PhoneNumber").identity("Number");
}

struct PersonConfiguration;

impl TypeConfiguration for PersonConfiguration {
    fn configure(&self, builder: &mut SchemaBuilder) {
        configure_person(builder);
    }
}

fn person_from_annotations() -> Schema {
    let mut builder = SchemaBuilder::new("people")
        .with_catalog(person_catalog())
        .with_conventions(kebab());
    builder.object("Person");
    builder.build().unwrap()
}

fn person_from_configuration() -> Schema {
    let mut builder = SchemaBuilder::new("people")
        .with_catalog(plain_person_catalog())
        .with_conventions(kebab());
    builder.apply_configuration(&PersonConfiguration);
    builder.build().unwrap()
}

fn person_from_fluent_calls() -> Schema {
    let mut builder = SchemaBuilder::new("people")
        .with_catalog(plain_person_catalog())
        .with_conventions(kebab());
    configure_person(&mut builder);
    builder.build().unwrap()
}

#[test]
fn test_annotated_person_model() {
    let schema = person_from_annotations();

    assert_eq!(
        names(schema.objects().iter().map(|o| &o.name)),
        vec!["address", "person", "phone-number"]
    );

    let person = schema.find_object("person").unwrap();
    assert_eq!(
        names(person.properties.iter().map(|p| &p.name)),
        vec!["id", "first-name", "last-name", "mailing-address", "phone-numbers"]
    );
    let required: Vec<bool> = person.properties.iter().map(|p| p.required).collect();
    assert_eq!(required, vec![true, true, true, false, false]);
    assert_eq!(person.identity_property().unwrap().name, "id");

    let address = schema
        .resolve_property(person.find_property("mailing-address").unwrap())
        .unwrap();
    assert_eq!(address.name(), "address");
    assert_eq!(address.kind(), NamedKind::Object);

    assert_eq!(person.relationships.len(), 1);
    let phones = &person.relationships[0];
    assert_eq!(phones.name, "phone-numbers");
    assert_eq!(phones.cardinality, Cardinality::ToMany);
    assert_eq!(schema.resolve_relationship(phones).unwrap().name, "phone-number");

    let kind = schema.find_enumeration("phone-kind").unwrap();
    let values: Vec<&str> = kind.values.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(values, vec!["Mobile", "Home", "Work"]);

    assert_eq!(names(schema.scalars().iter().map(|s| &s.name)), vec!["int", "string"]);
}

#[test]
fn test_three_authoring_styles_agree() {
    let annotated = person_from_annotations();
    let configured = person_from_configuration();
    let fluent = person_from_fluent_calls();

    assert_eq!(compare::diff(&annotated, &configured), None);
    assert_eq!(compare::diff(&annotated, &fluent), None);
    assert_eq!(annotated.fingerprint(), configured.fingerprint());
    assert_eq!(annotated.fingerprint(), fluent.fingerprint());
}

// =============================================================================
// Precedence
// =============================================================================

fn named_person(annotation: bool, configuration: bool, fluent: bool) -> String {
    let mut decl = ObjectDecl::new("Person");
    if annotation {
        decl = decl.named("Human");
    }
    let mut builder = SchemaBuilder::new("p")
        .with_catalog(SourceCatalog::new().with_object(decl))
        .with_conventions(
            NamingConventions::new().with_types(NameChain::new().then(NamingConvention::UpperCase)),
        );

    // Fluent call first: recording order never decides precedence
    if fluent {
        builder.object("Person").name("individual");
    }
    if configuration {
        builder.apply_configuration(&|b: &mut SchemaBuilder| {
            b.object("Person").name("configured");
        });
    } else {
        builder.object("Person");
    }

    let schema = builder.build().unwrap();
    schema.objects()[0].name.clone()
}

#[test]
fn test_higher_level_wins_regardless_of_order() {
    assert_eq!(named_person(true, true, true), "individual");
    assert_eq!(named_person(true, true, false), "configured");
    assert_eq!(named_person(true, false, false), "Human");
    assert_eq!(named_person(false, false, false), "PERSON");
}

#[test]
fn test_same_level_last_write_wins() {
    let mut builder = SchemaBuilder::new("p");
    builder.object("Person").name("first").name("second");
    builder.object("Person").description("one");
    builder.object("Person").description("two");
    let schema = builder.build().unwrap();

    let person = &schema.objects()[0];
    assert_eq!(person.name, "second");
    assert_eq!(person.description.as_deref(), Some("two"));
}

// =============================================================================
// Article scenario
// =============================================================================

#[test]
fn test_article_end_to_end() {
    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::new("blog")
        .with_catalog(blog_catalog())
        .with_diagnostics(sink.clone());
    builder.object("Article");
    let schema = builder.build().unwrap();

    assert_eq!(
        names(schema.objects().iter().map(|o| &o.name)),
        vec!["Article", "Comment", "Person"]
    );
    assert_eq!(names(schema.scalars().iter().map(|s| &s.name)), vec!["guid", "int", "string"]);
    assert!(schema.enumerations().is_empty());

    let article = schema.find_object("Article").unwrap();
    assert_eq!(article.description.as_deref(), Some("A published piece of writing"));
    assert_eq!(article.relationships.len(), 2);

    let author = article.find_relationship("Author").unwrap();
    assert_eq!(author.cardinality, Cardinality::ToOne);
    assert_eq!(schema.resolve_relationship(author).unwrap().name, "Person");

    let comments = article.find_relationship("Comments").unwrap();
    assert_eq!(comments.cardinality, Cardinality::ToMany);
    assert_eq!(schema.resolve_relationship(comments).unwrap().name, "Comment");
    assert!(article.find_property("Comments").unwrap().required);

    let comment = schema.find_object("Comment").unwrap();
    assert!(comment.find_property("Draft").is_none());

    // Scalars were never configured, only referenced
    assert_eq!(sink.count(DiagnosticCode::ImplicitTypeAdded), 3);
    assert_eq!(sink.count(DiagnosticCode::PropertyIgnored), 1);
    assert_eq!(sink.count(DiagnosticCode::RelationshipOmitted), 0);
}

#[test]
fn test_excluded_relationship_target_keeps_property() {
    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::new("blog")
        .with_catalog(blog_catalog())
        .with_diagnostics(sink.clone());
    builder.object("Article");
    builder.exclude(TypeExpr::named("Person")).unwrap();
    let schema = builder.build().unwrap();

    assert!(schema.find_object("Person").is_none());
    let article = schema.find_object("Article").unwrap();

    // The property stays with its token; only the relationship goes
    let author = article.find_property("Author").unwrap();
    assert!(author.required);
    assert!(matches!(
        schema.resolve_property(author),
        Err(SchemaError::UnresolvedType { .. })
    ));
    assert!(schema.render_tree().contains("<unresolved"));

    assert!(article.find_relationship("Author").is_none());
    assert_eq!(article.relationships.len(), 1);

    assert_eq!(sink.count(DiagnosticCode::DanglingTarget), 1);
    assert_eq!(sink.count(DiagnosticCode::RelationshipOmitted), 1);
}

#[test]
fn test_exclude_before_enumeration_is_configured() {
    let mut builder = SchemaBuilder::new("palette");
    builder.exclude(TypeExpr::named("Color")).unwrap();
    builder.enumeration("Color").value("Red");
    builder
        .object("Person")
        .identity("Id")
        .property("Id", ScalarKind::Int);
    builder
        .object("Person")
        .property("Color", TypeExpr::named("Color"));
    let schema = builder.build().unwrap();

    assert!(schema.enumerations().is_empty());
    assert!(schema.find_object("Color").is_none());
    let person = schema.find_object("Person").unwrap();
    assert!(person.find_property("Color").is_some());
}

#[test]
fn test_exclusion_survives_merge_into_enumeration() {
    let mut colors = SchemaBuilder::new("palette");
    colors.enumeration("Color").value("Red");
    colors
        .object("Person")
        .property("Color", TypeExpr::named("Color"));

    // Excluded here with no enumeration marker for the key
    let mut excluding = SchemaBuilder::new("palette");
    excluding.exclude(TypeExpr::named("Color")).unwrap();

    colors.merge(excluding).unwrap();
    let schema = colors.build().unwrap();

    assert!(schema.enumerations().is_empty());
    assert!(schema.find_object("Color").is_none());
}

#[test]
fn test_relationship_to_non_resource_is_dropped() {
    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::new("shop").with_diagnostics(sink.clone());
    builder
        .object("Order")
        .identity("Id")
        .property("Id", ScalarKind::Int);
    builder
        .object("Order")
        .property("Customer", TypeExpr::named("Customer"))
        .relationship();
    builder.object("Customer").property("Name", ScalarKind::String);
    let schema = builder.build().unwrap();

    let order = schema.find_object("Order").unwrap();
    assert!(order.relationships.is_empty());
    assert!(order.find_property("Customer").is_some());
    assert_eq!(sink.count(DiagnosticCode::RelationshipOmitted), 1);
}

// =============================================================================
// Forward references
// =============================================================================

#[test]
fn test_cyclic_objects_resolve_to_each_other() {
    let mut builder = SchemaBuilder::new("cycle");
    builder.object("A").identity("Id").property("Id", ScalarKind::Int);
    builder
        .object("A")
        .property("B", TypeExpr::named("B"))
        .relationship();
    builder.object("B").identity("Id").property("Id", ScalarKind::Int);
    builder
        .object("B")
        .property("As", TypeExpr::list(TypeExpr::named("A")))
        .relationship();
    let schema = builder.build().unwrap();

    let a = schema.find_object("A").unwrap();
    let b = schema.find_object("B").unwrap();

    let to_b = a.find_relationship("B").unwrap();
    assert_eq!(to_b.cardinality, Cardinality::ToOne);
    let resolved_b = schema.resolve_relationship(to_b).unwrap();
    assert!(std::ptr::eq(resolved_b, b));

    let to_a = resolved_b.find_relationship("As").unwrap();
    assert_eq!(to_a.cardinality, Cardinality::ToMany);
    let resolved_a = schema.resolve_relationship(to_a).unwrap();
    assert!(std::ptr::eq(resolved_a, a));
    assert_eq!(resolved_a.relationships.len(), 1);
}

#[test]
fn test_schema_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Schema>();

    let schema = Arc::new(build_blog());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let article = schema.find_object("Article").unwrap();
                article
                    .relationships
                    .iter()
                    .map(|r| schema.resolve_relationship(r).unwrap().name.clone())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["Person", "Comment"]);
    }
}

// =============================================================================
// Classification & reconciliation
// =============================================================================

#[test]
fn test_nested_collection_property_fails() {
    let mut builder = SchemaBuilder::new("grid");
    builder
        .object("Grid")
        .property("Cells", "[[int]]".parse::<TypeExpr>().unwrap());

    let err = builder.build().unwrap_err();
    match &err {
        SchemaError::NestedCollectionProperty { owner, property, ty } => {
            assert_eq!(owner, "Grid");
            assert_eq!(property, "Cells");
            assert_eq!(ty, "[[int]]");
        }
        other => panic!("Expected NestedCollectionProperty, got {:?}", other),
    }
    assert!(err.to_string().contains("Cells"));
}

#[test]
fn test_implicit_scalar_gets_natural_name() {
    let mut builder = SchemaBuilder::new("events");
    builder
        .object("Event")
        .property("At", TypeExpr::from(ScalarKind::DateTime).nullable());
    let schema = builder.build().unwrap();

    let scalar = schema.find_scalar("date-time").unwrap();
    assert_eq!(scalar.key.to_string(), "date-time");
    assert_eq!(schema.scalars().len(), 1);
}

#[test]
fn test_unreferenced_explicit_scalar_is_dropped() {
    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::new("money").with_diagnostics(sink.clone());
    builder.scalar(ScalarKind::Decimal).name("money");
    builder.scalar(ScalarKind::Guid).name("uuid");
    builder.object("Invoice").property("Id", ScalarKind::Guid);
    let schema = builder.build().unwrap();

    assert!(schema.find_scalar("money").is_none());
    assert!(schema.find_scalar("uuid").is_some());
    assert_eq!(schema.scalars().len(), 1);
    assert_eq!(sink.count(DiagnosticCode::UnusedTypeRemoved), 1);
}

#[test]
fn test_unreferenced_explicit_enumeration_is_dropped() {
    let mut builder = SchemaBuilder::new("colors");
    builder.enumeration("Color").value("Red");
    builder.object("Car").property("Plate", ScalarKind::String);
    let schema = builder.build().unwrap();
    assert!(schema.enumerations().is_empty());
}

#[test]
fn test_exclude_is_idempotent_end_to_end() {
    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::new("x").with_diagnostics(sink.clone());
    builder.object("Counter").property("Value", ScalarKind::Int);
    builder.object("Counter").property("Label", ScalarKind::String);
    builder.exclude(ScalarKind::Int).unwrap();
    builder.exclude(ScalarKind::Int).unwrap();
    let schema = builder.build().unwrap();

    assert_eq!(sink.count(DiagnosticCode::TypeExcluded), 1);
    assert!(schema.find_scalar("int").is_none());
    let counter = schema.find_object("Counter").unwrap();
    let value = counter.find_property("Value").unwrap();
    assert!(schema.resolve_property(value).is_err());
    assert!(counter.find_property("Label").is_some());
    assert_eq!(sink.count(DiagnosticCode::DanglingTarget), 1);
}

#[test]
fn test_identity_typo_suggests_members() {
    let mut builder = SchemaBuilder::new("x");
    builder
        .object("Person")
        .identity("Idd")
        .property("Id", ScalarKind::Int);
    match builder.build().unwrap_err() {
        SchemaError::IdentityNotFound { owner, property, suggestions } => {
            assert_eq!(owner, "Person");
            assert_eq!(property, "Idd");
            assert!(suggestions.contains(&"Id".to_string()));
        }
        other => panic!("Expected IdentityNotFound, got {:?}", other),
    }
}

#[test]
fn test_duplicate_property_names_fail() {
    let mut builder = SchemaBuilder::new("x");
    builder.object("Point").property("X", ScalarKind::Int).name("coord");
    builder.object("Point").property("Y", ScalarKind::Int).name("coord");
    assert!(matches!(
        builder.build(),
        Err(SchemaError::DuplicateProperty { .. })
    ));
}

#[test]
fn test_merge_combines_builders() {
    let mut first = SchemaBuilder::new("blog").with_catalog(blog_catalog());
    first.object("Article");
    let mut second = SchemaBuilder::new("other").with_catalog(blog_catalog());
    second.object("Article").name("Post");

    first.merge(second).unwrap();
    let schema = first.build().unwrap();
    assert_eq!(schema.name(), "blog");
    assert!(schema.find_object("Post").is_some());
    assert!(schema.find_object("Article").is_none());
}

// =============================================================================
// Configuration & loading
// =============================================================================

#[test]
fn test_builder_from_config() {
    let config = BuildConfig::from_toml_str(
        r#"
        [schema]
        name = "journal"

        [conventions]
        type_names = ["kebab-case"]
        property_names = ["camel-case"]

        [discovery]
        ignore_members = ["^Article\\.Body$"]
        "#,
    )
    .unwrap();

    let mut builder = SchemaBuilder::from_config(&config)
        .unwrap()
        .with_catalog(blog_catalog());
    builder.object("Article");
    let schema = builder.build().unwrap();

    assert_eq!(schema.name(), "journal");
    let article = schema.find_object("article").unwrap();
    assert!(article.find_property("title").is_some());
    assert!(article.find_property("body").is_none());
    let author = article.find_relationship("author").unwrap();
    assert_eq!(schema.resolve_relationship(author).unwrap().name, "person");
}

#[test]
fn test_objects_from_catalog_registers_every_declaration() {
    let mut builder = SchemaBuilder::new("fixtures")
        .with_catalog(SourceCatalog::load_file(&fixtures_path().join("cycle.toml")).unwrap());
    builder.objects_from_catalog();
    let schema = builder.build().unwrap();

    assert_eq!(
        names(schema.objects().iter().map(|o| &o.name)),
        vec!["Player", "Team"]
    );
    let player = schema.find_object("Player").unwrap();
    let team = player.find_relationship("Team").unwrap();
    assert_eq!(schema.resolve_relationship(team).unwrap().name, "Team");
    assert!(!player.find_property("Team").unwrap().required);
}

// =============================================================================
// Rendering, analysis & comparison
// =============================================================================

#[test]
fn test_fingerprint_check() {
    let schema = build_blog();
    let expected = schema.fingerprint();
    assert!(build_blog().matches_fingerprint(&expected));
    assert!(!person_from_annotations().matches_fingerprint(&expected));
    assert!(!schema.matches_fingerprint(&Checksum::from("0".repeat(64))));
}

#[test]
fn test_rendering_is_deterministic() {
    let first = build_blog();
    let second = build_blog();
    assert_eq!(first.render_tree(), second.render_tree());
    assert_eq!(first.to_string(), first.render_tree());

    let tree = first.render_tree();
    assert!(tree.starts_with("schema blog\n"));
    assert!(tree.contains("→ Comments to-many [Comment]"));

    let json: serde_json::Value = serde_json::from_str(&first.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "blog");
    assert_eq!(json["objects"].as_array().unwrap().len(), 3);
}

#[test]
fn test_relationship_graph_of_blog() {
    let schema = build_blog();
    let graph = RelationshipGraph::from_schema(&schema).unwrap();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.cycles().is_empty());
    assert_eq!(graph.related("Article"), vec!["Comment", "Person"]);

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph Relationships {"));
    assert!(dot.contains("\"Article\" -> \"Comment\" [label=\"Comments (to-many)\", style=bold];"));
}

#[test]
fn test_relationship_graph_reports_cycles() {
    let mut builder = SchemaBuilder::new("teams")
        .with_catalog(SourceCatalog::load(&fixtures_path().join("cycle.toml")).unwrap());
    builder.object("Team");
    let schema = builder.build().unwrap();
    let graph = RelationshipGraph::from_schema(&schema).unwrap();

    let cycles = graph.cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].members, vec!["Player", "Team"]);
    assert!(!cycles[0].is_self_referential);
    assert!(graph.is_cyclic("Team"));
}

#[test]
fn test_compare_reports_changes() {
    let before = build_blog();

    let mut builder = SchemaBuilder::new("blog").with_catalog(blog_catalog());
    builder.object("Article").ignore_property("Body");
    let after = builder.build().unwrap();

    let diff = compare::diff(&before, &after).unwrap();
    assert_eq!(diff.added, 0);
    assert_eq!(diff.removed, 1);
    assert!(diff.unified.contains("· Body: string"));
}
