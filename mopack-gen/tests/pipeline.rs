//! End-to-end pipeline behavior: tag grammar, field expansion, reference
//! resolution, and the diagnostics surface.

use mopack_gen::{
    process, ArraySize, Base, Elem, FieldDecl, Severity, Shape, Struct, TypeDecl, TypeRef,
};

fn record(name: &str, fields: Vec<FieldDecl>) -> TypeDecl {
    TypeDecl::new(name, Shape::Record(fields))
}

/// Unwrap the mandatory outer Ptr and return the record.
fn as_record(elem: &Elem) -> &Struct {
    let Elem::Ptr(p) = elem else { panic!("record not wrapped in Ptr: {elem:?}") };
    p.value.as_struct().expect("Ptr does not wrap a Struct")
}

#[test]
fn tags_rename_and_omit_fields() {
    let outcome = process(&[record(
        "Foo",
        vec![
            FieldDecl::tagged("bar", TypeRef::named("i64"), "b"),
            FieldDecl::tagged("skip", TypeRef::named("String"), "-"),
            FieldDecl::new("keep", TypeRef::named("bool")),
        ],
    )]);

    assert_eq!(outcome.elems.len(), 1);
    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.name, "Foo");
    assert!(!record.as_tuple);
    let keys: Vec<(&str, &str)> =
        record.fields.iter().map(|f| (f.name.as_str(), f.tag.as_str())).collect();
    assert_eq!(keys, [("bar", "b"), ("keep", "keep")]);
    assert!(outcome.diagnostics.is_empty());
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn alias_of_a_known_base_lowers_with_convert() {
    let outcome = process(&[
        TypeDecl::new("Celsius", Shape::Alias(TypeRef::named("f64"))),
        record("Thermo", vec![FieldDecl::new("t", TypeRef::named("Celsius"))]),
    ]);

    assert_eq!(outcome.elems.len(), 1);
    let record = as_record(&outcome.elems[0]);
    let base = record.fields[0].elem.as_base().unwrap();
    assert_eq!(base.base, Base::Float64);
    assert_eq!(base.ident.as_deref(), Some("Celsius"));
    assert!(base.convert);
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn processed_references_delegate_instead_of_lowering() {
    let outcome = process(&[
        record("Inner", vec![FieldDecl::new("x", TypeRef::named("u32"))]),
        record("Outer", vec![FieldDecl::new("inner", TypeRef::named("Inner"))]),
    ]);

    assert_eq!(outcome.elems.len(), 2);
    let outer = as_record(&outcome.elems[1]);
    let base = outer.fields[0].elem.as_base().unwrap();
    assert_eq!(base.base, Base::Ident);
    assert_eq!(base.ident.as_deref(), Some("Inner"));
    assert!(!base.convert);
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn multi_name_fields_expand() {
    let outcome = process(&[record(
        "Point",
        vec![FieldDecl::multi(["x", "y", "z"], TypeRef::named("f32"))],
    )]);

    let record = as_record(&outcome.elems[0]);
    let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z"]);
    for field in &record.fields {
        assert_eq!(field.tag, field.name);
        assert_eq!(field.elem.as_base().unwrap().base, Base::Float32);
    }
}

#[test]
fn embedded_fields_take_the_type_name() {
    let outcome = process(&[
        record("Header", vec![FieldDecl::new("seq", TypeRef::named("u64"))]),
        record(
            "Message",
            vec![
                FieldDecl::embedded(TypeRef::pointer(TypeRef::named("Header"))),
                FieldDecl::new("body", TypeRef::slice(TypeRef::named("u8"))),
            ],
        ),
    ]);

    let message = as_record(&outcome.elems[1]);
    assert_eq!(message.fields[0].name, "Header");
    assert_eq!(message.fields[0].tag, "Header");
    assert!(matches!(&message.fields[0].elem, Elem::Ptr(_)));
    assert_eq!(message.fields[1].elem.as_base().unwrap().base, Base::Bytes);
}

#[test]
fn embedded_qualified_fields_are_skipped_with_a_warning() {
    let outcome = process(&[record(
        "Wrapper",
        vec![
            FieldDecl::embedded(TypeRef::Path {
                module: "other".to_owned(),
                name: "Thing".to_owned(),
            }),
            FieldDecl::new("ok", TypeRef::named("bool")),
        ],
    )]);

    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields[0].name, "ok");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].severity, Severity::Warning);
    assert_eq!(outcome.diagnostics[0].decl, "Wrapper");
}

#[test]
fn extension_tag_rewrites_base_fields() {
    let outcome = process(&[record(
        "Carrier",
        vec![
            FieldDecl::tagged("plain", TypeRef::named("RawExtension"), "p,extension"),
            FieldDecl::tagged(
                "boxed",
                TypeRef::pointer(TypeRef::named("RawExtension")),
                "q,extension",
            ),
        ],
    )]);

    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.fields.len(), 2);
    assert_eq!(record.fields[0].elem.as_base().unwrap().base, Base::Ext);
    let Elem::Ptr(p) = &record.fields[1].elem else { panic!("expected Ptr") };
    assert_eq!(p.value.as_base().unwrap().base, Base::Ext);
}

#[test]
fn extension_tag_on_a_container_is_skipped_with_a_warning() {
    let outcome = process(&[record(
        "Bad",
        vec![
            FieldDecl::tagged("xs", TypeRef::slice(TypeRef::named("u8")), "xs,extension"),
            FieldDecl::new("ok", TypeRef::named("u8")),
        ],
    )]);

    // a slice of u8 reduces to the Bytes base kind, which *can* carry the
    // extension flag; a slice of anything else cannot
    let bytes_record = as_record(&outcome.elems[0]);
    assert_eq!(bytes_record.fields.len(), 2);

    let outcome = process(&[record(
        "Worse",
        vec![
            FieldDecl::tagged("xs", TypeRef::slice(TypeRef::named("String")), "xs,extension"),
            FieldDecl::new("ok", TypeRef::named("u8")),
        ],
    )]);
    let worse = as_record(&outcome.elems[0]);
    assert_eq!(worse.fields.len(), 1);
    assert_eq!(worse.fields[0].name, "ok");
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn shim_tags_become_converted_bases() {
    let outcome = process(&[record(
        "Shimmed",
        vec![FieldDecl::tagged(
            "when",
            TypeRef::named("MyClock"),
            "w,as:i64,using:clock_to_i64/clock_from_i64",
        )],
    )]);

    let record = as_record(&outcome.elems[0]);
    let field = &record.fields[0];
    assert_eq!(field.tag, "w");
    let base = field.elem.as_base().unwrap();
    assert_eq!(base.base, Base::Int64);
    assert!(base.convert);
    assert_eq!(base.shim_to_base.as_deref(), Some("clock_to_i64"));
    assert_eq!(base.shim_from_base.as_deref(), Some("clock_from_i64"));
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn malformed_shim_tags_warn_and_drop_the_field() {
    let outcome = process(&[record(
        "Broken",
        vec![
            FieldDecl::tagged("x", TypeRef::named("u8"), "x,as:i64,using:only_one_shim"),
            FieldDecl::new("ok", TypeRef::named("u8")),
        ],
    )]);

    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.fields.len(), 1);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].detail.contains("shim"));
}

#[test]
fn unknown_tag_fragments_warn_but_keep_the_field() {
    let outcome = process(&[record(
        "Odd",
        vec![FieldDecl::tagged("x", TypeRef::named("u8"), "x,omitempty")],
    )]);

    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields[0].tag, "x");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].detail.contains("omitempty"));
}

#[test]
fn empty_records_are_dropped_but_still_count_as_processed() {
    let outcome = process(&[
        record("Empty", vec![FieldDecl::tagged("hidden", TypeRef::named("u8"), "-")]),
        record("User", vec![FieldDecl::new("e", TypeRef::named("Empty"))]),
    ]);

    // Empty produced no tree...
    assert_eq!(outcome.elems.len(), 1);
    assert!(outcome.diagnostics.iter().any(|d| d.decl == "Empty"));
    // ...but its reference still delegates rather than going unresolved.
    assert!(outcome.unresolved.is_empty());
    let user = as_record(&outcome.elems[0]);
    assert_eq!(user.fields[0].elem.as_base().unwrap().base, Base::Ident);
}

#[test]
fn external_names_land_in_the_unresolved_report_once() {
    let outcome = process(&[
        TypeDecl::new("Names", Shape::Slice(TypeRef::named("String"))),
        record(
            "Uses",
            vec![
                FieldDecl::new("a", TypeRef::named("Mystery")),
                FieldDecl::new("b", TypeRef::slice(TypeRef::named("Mystery"))),
                FieldDecl::new("c", TypeRef::named("Names")),
                FieldDecl::new(
                    "d",
                    TypeRef::array(ArraySize::Literal(2), TypeRef::named("Mystery")),
                ),
            ],
        ),
    ]);

    // Mystery is unknown; Names is registered but no code was generated
    // for it, so both are assumed to satisfy the contract by name.
    assert_eq!(outcome.unresolved, ["Mystery".to_owned(), "Names".to_owned()]);
}

#[test]
fn inline_records_elaborate_anonymously() {
    let outcome = process(&[record(
        "Envelope",
        vec![FieldDecl::new(
            "inner",
            TypeRef::Record(vec![FieldDecl::new("n", TypeRef::named("u16"))]),
        )],
    )]);

    let envelope = as_record(&outcome.elems[0]);
    let Elem::Struct(inner) = &envelope.fields[0].elem else { panic!("expected inline Struct") };
    assert!(inner.name.is_empty());
    assert_eq!(inner.fields[0].elem.as_base().unwrap().base, Base::Uint16);
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn qualified_time_is_recognized_and_other_paths_stay_opaque() {
    let outcome = process(&[record(
        "Stamped",
        vec![
            FieldDecl::new(
                "at",
                TypeRef::Path { module: "std::time".to_owned(), name: "SystemTime".to_owned() },
            ),
            FieldDecl::new(
                "ref_",
                TypeRef::Path { module: "external".to_owned(), name: "Id".to_owned() },
            ),
        ],
    )]);

    let record = as_record(&outcome.elems[0]);
    assert_eq!(record.fields[0].elem.as_base().unwrap().base, Base::Time);
    let opaque = record.fields[1].elem.as_base().unwrap();
    assert_eq!(opaque.base, Base::Ident);
    assert_eq!(opaque.ident.as_deref(), Some("external::Id"));
    assert_eq!(outcome.unresolved, ["external::Id".to_owned()]);
}
